use serde::Deserialize;

use crate::error::ConfigError;

// ─── Document root ───────────────────────────────────────────────

/// The exporter's `logic` document.  Loading it from disk is the
/// embedding binary's job; this module only gives it a shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub logic: Logic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Logic {
    #[serde(default)]
    pub metrics: MetricsConfig,

    pub compression: CompressionConfig,

    /// `None` (or `null`) switches selection off entirely
    #[serde(default)]
    pub selection: Option<SelectionConfig>,
}

impl Config {
    /// Decode a JSON rendition of the document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ─── logic.metrics ───────────────────────────────────────────────

/// Three independent aspects.  An omitted aspect is inactive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub histograms: Option<HistogramsConfig>,
    #[serde(default)]
    pub gauges: Option<GaugesConfig>,
    #[serde(default)]
    pub counters: Option<CountersConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toggle {
    pub active: bool,
}

impl Toggle {
    /// An omitted toggle counts as switched off.
    pub fn on(toggle: &Option<Toggle>) -> bool {
        toggle.map(|t| t.active).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramsConfig {
    pub active: bool,
    #[serde(default)]
    pub latency: Option<LatencyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencyConfig {
    pub active: bool,
    pub bucket_bounds: Vec<f64>,
    #[serde(default)]
    pub lifetime: HistogramLifetime,
}

/// How long histogram bucket counts live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramLifetime {
    /// Fresh counts every scrape, like gauges and counters
    #[default]
    Scrape,
    /// Counts accumulate for the life of the collector
    Running,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaugesConfig {
    pub active: bool,
    #[serde(default)]
    pub rtt: Option<Toggle>,
    #[serde(default)]
    pub cwnd: Option<Toggle>,
    #[serde(default)]
    pub delivery_rate: Option<Toggle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountersConfig {
    pub active: bool,
    #[serde(default)]
    pub data_segs_in: Option<Toggle>,
    #[serde(default)]
    pub data_segs_out: Option<Toggle>,
}

// ─── logic.compression ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressionConfig {
    pub label_folding: LabelFolding,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelFolding {
    pub origin: FoldingOrigin,
}

/// Which part of a flow its label key is folded from.  Unknown names
/// are rejected while the document is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldingOrigin {
    RawEndpoint,
    PidCondensed,
}

// ─── logic.selection ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    #[serde(default)]
    pub peering: Option<PeeringConfig>,
    #[serde(default)]
    pub process: Option<ProcessConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeeringConfig {
    #[serde(default)]
    pub portranges: Vec<PortRange>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

/// Destination port range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortRange {
    pub lower: u16,
    pub upper: u16,
}

impl PortRange {
    /// `lower <= port <= upper`.
    pub fn contains(&self, port: u16) -> bool {
        (self.lower..=self.upper).contains(&port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessConfig {
    #[serde(default)]
    pub pids: Vec<u32>,
    #[serde(default)]
    pub cmds: Vec<String>,
}
