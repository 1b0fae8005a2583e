pub mod discerner;
pub mod network;

use std::collections::HashSet;
use std::net::IpAddr;

use tracing::debug;

use crate::config::{PeeringConfig, PortRange, ProcessConfig, SelectionConfig};
use crate::error::ConfigError;
use crate::flow::Flow;
pub use network::Network;

// ─── Criteria ────────────────────────────────────────────────────

/// Validated `selection.peering` sub-group.
#[derive(Debug, Clone, Default)]
pub struct PeeringCriteria {
    pub portranges: Vec<PortRange>,
    pub hosts: HashSet<String>,
    pub addresses: Vec<IpAddr>,
    pub networks: Vec<Network>,
}

/// Validated `selection.process` sub-group.
#[derive(Debug, Clone, Default)]
pub struct ProcessCriteria {
    pub pids: HashSet<u32>,
    pub cmds: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCriteria {
    pub peering: Option<PeeringCriteria>,
    pub process: Option<ProcessCriteria>,
}

impl TryFrom<&PeeringConfig> for PeeringCriteria {
    type Error = ConfigError;

    fn try_from(cnfg: &PeeringConfig) -> Result<Self, Self::Error> {
        if let Some(r) = cnfg.portranges.iter().find(|r| r.lower > r.upper) {
            return Err(ConfigError::InvertedPortRange {
                lower: r.lower,
                upper: r.upper,
            });
        }

        let addresses: Vec<IpAddr> = cnfg
            .addresses
            .iter()
            .map(|a| a.trim().parse().map_err(|_| ConfigError::InvalidAddress(a.clone())))
            .collect::<Result<_, _>>()?;
        let networks: Vec<Network> = cnfg
            .networks
            .iter()
            .map(|n| n.parse())
            .collect::<Result<_, _>>()?;

        Ok(Self {
            portranges: cnfg.portranges.clone(),
            hosts: cnfg.hosts.iter().cloned().collect(),
            addresses,
            networks,
        })
    }
}

impl TryFrom<&ProcessConfig> for ProcessCriteria {
    type Error = ConfigError;

    fn try_from(cnfg: &ProcessConfig) -> Result<Self, Self::Error> {
        if cnfg.cmds.iter().any(|c| c.is_empty()) {
            return Err(ConfigError::EmptyCommand);
        }
        Ok(Self {
            pids: cnfg.pids.iter().copied().collect(),
            cmds: cnfg.cmds.clone(),
        })
    }
}

impl TryFrom<&SelectionConfig> for SelectionCriteria {
    type Error = ConfigError;

    fn try_from(cnfg: &SelectionConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            peering: cnfg.peering.as_ref().map(PeeringCriteria::try_from).transpose()?,
            process: cnfg.process.as_ref().map(ProcessCriteria::try_from).transpose()?,
        })
    }
}

impl PeeringCriteria {
    fn names_peers(&self) -> bool {
        !(self.hosts.is_empty() && self.addresses.is_empty() && self.networks.is_empty())
    }
}

impl ProcessCriteria {
    fn names_processes(&self) -> bool {
        !(self.pids.is_empty() && self.cmds.is_empty())
    }
}

// ─── Selector ────────────────────────────────────────────────────

/// Decides whether a flow is reported at all.
///
/// Sub-groups are ANDed; within one, any matching criterion accepts.  An
/// absent sub-group, or one that lists nothing, never vetoes.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Selection is switched off: every flow is reported
    PassThrough,
    Filtering(SelectionCriteria),
}

impl Selector {
    /// No `selection` section means pass-through; a present one is
    /// validated and filters.
    pub fn new(cnfg: Option<&SelectionConfig>) -> Result<Self, ConfigError> {
        match cnfg {
            None => Ok(Self::PassThrough),
            Some(cnfg) => Ok(Self::Filtering(SelectionCriteria::try_from(cnfg)?)),
        }
    }

    /// `true` when the flow should be reported.
    pub fn arbitrate(&self, flow: &Flow) -> bool {
        match self {
            Self::PassThrough => true,
            Self::Filtering(criteria) => {
                let verdict = Self::all_pass(criteria, flow);
                if !verdict {
                    debug!(dst = %flow.dst, dst_port = flow.dst_port, "flow declined by selection");
                }
                verdict
            }
        }
    }

    fn all_pass(criteria: &SelectionCriteria, flow: &Flow) -> bool {
        let peering = criteria.peering.as_ref();
        let process = criteria.process.as_ref();

        let conditions = [
            peering.map(|p| discerner::ports(flow, &p.portranges)),
            peering
                .filter(|p| p.names_peers())
                .map(|p| discerner::peers(flow, &p.hosts, &p.addresses, &p.networks)),
            process
                .filter(|p| p.names_processes())
                .map(|p| discerner::process(flow, &p.pids, &p.cmds)),
        ];

        // `None` is a sub-group with no opinion
        conditions.into_iter().all(|c| c.unwrap_or(true))
    }
}
