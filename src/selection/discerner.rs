//! Per-dimension acceptance tests.
//!
//! Each function answers "does this dimension accept the flow?" and never
//! fails: a flow missing the field a criterion looks at simply does not
//! match it.

use std::collections::HashSet;
use std::net::IpAddr;

use super::network::Network;
use crate::config::PortRange;
use crate::flow::Flow;

/// Destination port within any of the inclusive ranges.  No ranges means
/// no restriction.
pub fn ports(flow: &Flow, portranges: &[PortRange]) -> bool {
    portranges.is_empty() || portranges.iter().any(|r| r.contains(flow.dst_port))
}

/// Destination is one of the listed addresses, its resolved name is one
/// of the listed hosts, or it falls inside one of the listed networks.
///
/// Unlike [`ports`], empty criteria give no acceptance signal.
pub fn peers(flow: &Flow, hosts: &HashSet<String>, addresses: &[IpAddr], networks: &[Network]) -> bool {
    let by_host = flow
        .dst_host
        .as_deref()
        .is_some_and(|host| !host.is_empty() && hosts.contains(host));
    if by_host {
        return true;
    }

    // An unparsable destination can still have matched by host above
    let Ok(dst) = flow.dst.parse::<IpAddr>() else {
        return false;
    };

    addresses.contains(&dst) || networks.iter().any(|net| net.contains(&dst))
}

/// Any owning pid is listed, or any owning command line contains one of
/// the listed commands.
pub fn process(flow: &Flow, pids: &HashSet<u32>, cmds: &[String]) -> bool {
    flow.processes().any(|(pid, full_cmd)| {
        pids.contains(&pid)
            || full_cmd.is_some_and(|full_cmd| cmds.iter().any(|cmd| full_cmd.contains(cmd.as_str())))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::flow::ProcessContext;

    fn to_dst(dst: &str) -> Flow {
        Flow {
            dst: dst.into(),
            ..Default::default()
        }
    }

    fn to_host(host: &str) -> Flow {
        Flow {
            dst_host: Some(host.into()),
            ..Default::default()
        }
    }

    fn on_port(dst_port: u16) -> Flow {
        Flow {
            dst_port,
            ..Default::default()
        }
    }

    fn owned_by(user: &str, pid: u32, full_cmd: &str) -> Flow {
        let pids = BTreeMap::from([(
            pid,
            ProcessContext {
                full_cmd: Some(full_cmd.into()),
            },
        )]);
        Flow {
            usr_ctxt: Some(BTreeMap::from([(user.to_string(), pids)])),
            ..Default::default()
        }
    }

    fn hosts(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn addrs(raw: &[&str]) -> Vec<IpAddr> {
        raw.iter().map(|a| a.parse().unwrap()).collect()
    }

    // ── ports ───────────────────────────────────────────────────

    #[test]
    fn port_outside_range_declines() {
        let ranges = [PortRange { lower: 1000, upper: 2000 }];
        assert!(!ports(&on_port(100), &ranges));
        assert!(!ports(&on_port(2001), &ranges));
    }

    #[test]
    fn port_inside_range_accepts() {
        let ranges = [PortRange { lower: 1000, upper: 2000 }];
        assert!(ports(&on_port(1500), &ranges));
        assert!(ports(&on_port(1000), &ranges));
        assert!(ports(&on_port(2000), &ranges));
    }

    #[test]
    fn any_range_suffices() {
        let ranges = [
            PortRange { lower: 22, upper: 22 },
            PortRange { lower: 8000, upper: 8999 },
        ];
        assert!(ports(&on_port(22), &ranges));
        assert!(ports(&on_port(8080), &ranges));
        assert!(!ports(&on_port(443), &ranges));
    }

    #[test]
    fn no_ranges_accepts_everything() {
        assert!(ports(&on_port(1), &[]));
    }

    // ── peers ───────────────────────────────────────────────────

    #[test]
    fn peers_decline() {
        let flow = to_dst("91.189.92.41");
        assert!(!peers(&flow, &HashSet::new(), &addrs(&["10.0.1.10"]), &[]));

        let flow = to_host("test.root.org");
        assert!(!peers(&flow, &hosts(&["test.leave.org"]), &[], &[]));
    }

    #[test]
    fn peers_accept() {
        let flow = to_dst("2003:f1:e3cc:1966:feaa:14ff:fe1c:5dea");
        let listed = addrs(&["2003:f1:e3cc:1966:feaa:14ff:fe1c:5dea"]);
        assert!(peers(&flow, &HashSet::new(), &listed, &[]));

        let flow = to_host("test.leave.org");
        assert!(peers(&flow, &hosts(&["test.leave.org"]), &[], &[]));
    }

    #[test]
    fn addresses_compare_as_ips_not_text() {
        let flow = to_dst("2003:00f1::0001");
        assert!(peers(&flow, &HashSet::new(), &addrs(&["2003:f1::1"]), &[]));
    }

    #[test]
    fn network_membership_accepts() {
        let nets: Vec<Network> = vec!["10.0.0.0/16".parse().unwrap()];
        assert!(peers(&to_dst("10.0.7.1"), &HashSet::new(), &[], &nets));
        assert!(!peers(&to_dst("10.1.7.1"), &HashSet::new(), &[], &nets));
    }

    #[test]
    fn unresolved_or_garbled_peer_is_no_match() {
        let flow = Flow {
            dst: "not-an-ip".into(),
            dst_host: Some(String::new()),
            ..Default::default()
        };
        let nets: Vec<Network> = vec!["0.0.0.0/0".parse().unwrap()];
        assert!(!peers(&flow, &hosts(&[""]), &addrs(&["10.0.1.10"]), &nets));
    }

    #[test]
    fn empty_peer_criteria_give_no_signal() {
        assert!(!peers(&to_dst("10.0.1.10"), &HashSet::new(), &[], &[]));
    }

    // ── process ─────────────────────────────────────────────────

    #[test]
    fn process_decline() {
        let flow = owned_by("other_bin", 101, "other");
        assert!(!process(&flow, &HashSet::from([100]), &[]));
        assert!(!process(&flow, &HashSet::new(), &["server".to_string()]));
    }

    #[test]
    fn process_accept() {
        let flow = owned_by("server", 100, "server");
        assert!(process(&flow, &HashSet::from([100]), &[]));

        let flow = owned_by("server", 101, "server");
        assert!(process(&flow, &HashSet::new(), &["server".to_string()]));
    }

    #[test]
    fn command_criterion_matches_within_full_cmd() {
        let flow = owned_by("www", 7, "/usr/sbin/nginx -g daemon off;");
        assert!(process(&flow, &HashSet::new(), &["nginx".to_string()]));
    }

    #[test]
    fn flow_without_context_is_no_match() {
        assert!(!process(&Flow::default(), &HashSet::from([1]), &["init".to_string()]));
    }
}
