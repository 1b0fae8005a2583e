use crate::config::FoldingOrigin;
use crate::error::CondenseError;
use crate::flow::Flow;

/// Folds a flow into the value of its `flow` label.
///
/// The strategy is fixed at construction; `shape_key` is a pure function
/// of the flow, so the same flow always yields the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condenser {
    /// `(SRC#<src>|<src_port>)(DST#<dst>|<dst_port>)`
    RawEndpoint,
    /// `(<pid>,<pid>,...)(DST#<dst>|<dst_port>)`, pids ascending
    PidCondensed,
}

impl From<FoldingOrigin> for Condenser {
    fn from(origin: FoldingOrigin) -> Self {
        match origin {
            FoldingOrigin::RawEndpoint => Self::RawEndpoint,
            FoldingOrigin::PidCondensed => Self::PidCondensed,
        }
    }
}

impl Condenser {
    /// Label key for `flow`.  `PidCondensed` fails on flows without
    /// process context.
    pub fn shape_key(&self, flow: &Flow) -> Result<String, CondenseError> {
        match self {
            Self::RawEndpoint => Ok(format!(
                "(SRC#{}|{})(DST#{}|{})",
                flow.src, flow.src_port, flow.dst, flow.dst_port
            )),
            Self::PidCondensed => {
                if flow.usr_ctxt.is_none() {
                    return Err(CondenseError::MissingContext {
                        dst: flow.dst.clone(),
                        dst_port: flow.dst_port,
                    });
                }

                let mut pids: Vec<u32> = flow.processes().map(|(pid, _)| pid).collect();
                pids.sort_unstable();
                pids.dedup();

                let pids = pids.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
                Ok(format!("({})(DST#{}|{})", pids, flow.dst, flow.dst_port))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::flow::ProcessContext;

    fn flow() -> Flow {
        let ctxt = |cmd: &str| ProcessContext {
            full_cmd: Some(cmd.into()),
        };
        Flow {
            src: "192.168.1.2".into(),
            src_port: 51000,
            dst: "91.189.92.41".into(),
            dst_port: 443,
            usr_ctxt: Some(BTreeMap::from([
                ("root".to_string(), BTreeMap::from([(900, ctxt("sshd"))])),
                ("alice".to_string(), BTreeMap::from([(31, ctxt("curl")), (4242, ctxt("curl"))])),
            ])),
            ..Default::default()
        }
    }

    #[test]
    fn raw_endpoint_key() {
        let key = Condenser::RawEndpoint.shape_key(&flow()).unwrap();
        assert_eq!(key, "(SRC#192.168.1.2|51000)(DST#91.189.92.41|443)");
    }

    #[test]
    fn pid_condensed_key_sorts_pids_across_users() {
        let key = Condenser::PidCondensed.shape_key(&flow()).unwrap();
        assert_eq!(key, "(31,900,4242)(DST#91.189.92.41|443)");
    }

    #[test]
    fn pid_condensed_without_context_fails() {
        let mut flow = flow();
        flow.usr_ctxt = None;
        assert_eq!(
            Condenser::PidCondensed.shape_key(&flow),
            Err(CondenseError::MissingContext {
                dst: "91.189.92.41".into(),
                dst_port: 443,
            })
        );
        // Raw endpoints do not care
        assert!(Condenser::RawEndpoint.shape_key(&flow).is_ok());
    }

    #[test]
    fn shaping_is_idempotent() {
        let flow = flow();
        for condenser in [Condenser::RawEndpoint, Condenser::PidCondensed] {
            assert_eq!(condenser.shape_key(&flow), condenser.shape_key(&flow));
        }
    }

    #[test]
    fn built_from_folding_origin() {
        assert_eq!(Condenser::from(FoldingOrigin::PidCondensed), Condenser::PidCondensed);
        assert_eq!(Condenser::from(FoldingOrigin::RawEndpoint), Condenser::RawEndpoint);
    }
}
