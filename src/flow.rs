use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─── Flow record ─────────────────────────────────────────────────

/// One observed TCP connection as handed over by the gatherer.
///
/// The core only ever reads these.  Everything past the endpoint tuple is
/// best-effort: the gatherer may fail to resolve the peer, lose the owning
/// process, or omit individual socket metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub src: String,
    pub src_port: u16,
    pub dst: String,
    pub dst_port: u16,

    /// Reverse-resolved peer name, if resolution succeeded
    #[serde(default)]
    pub dst_host: Option<String>,

    /// Named socket metrics (`rtt`, `snd_cwnd`, `delivery_rate`, ...).
    /// Non-numeric entries are dropped while decoding.
    #[serde(default, deserialize_with = "numeric_only")]
    pub tcp_info: BTreeMap<String, f64>,

    /// Owning user → pid → process details
    #[serde(default)]
    pub usr_ctxt: Option<BTreeMap<String, BTreeMap<u32, ProcessContext>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessContext {
    #[serde(default)]
    pub full_cmd: Option<String>,
}

/// Keep the numeric `tcp_info` entries; strings (`cong_control`), nulls
/// and nested objects read as absent.
fn numeric_only<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .flatten()
        .filter_map(|(name, value)| value.as_f64().map(|v| (name, v)))
        .collect())
}

impl Flow {
    /// Look up a socket metric by its `tcp_info` name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.tcp_info.get(name).copied()
    }

    /// Every `(pid, full_cmd)` owning this flow, across all users.
    /// A flow without process context yields nothing.
    pub fn processes(&self) -> impl Iterator<Item = (u32, Option<&str>)> + '_ {
        self.usr_ctxt
            .iter()
            .flat_map(|users| users.values())
            .flat_map(|pids| pids.iter())
            .map(|(pid, ctxt)| (*pid, ctxt.full_cmd.as_deref()))
    }
}

// ─── Gatherer report ─────────────────────────────────────────────

/// Top-level JSON document emitted by the socket-statistics gatherer:
/// `{"TCP": {"flows": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocketReport {
    #[serde(rename = "TCP", default)]
    pub tcp: TcpSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TcpSection {
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl SocketReport {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn into_flows(self) -> Vec<Flow> {
        self.tcp.flows
    }
}
