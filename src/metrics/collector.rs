use std::convert::Infallible;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use super::family::MetricFamily;
use super::keep::MetricsKeep;
use crate::condenser::Condenser;
use crate::config::Config;
use crate::error::{CollectError, ConfigError};
use crate::flow::Flow;
use crate::selection::Selector;

// ─── Flow source ─────────────────────────────────────────────────

/// Whatever gathers socket statistics.  Called once per scrape; the core
/// makes no assumptions about how the flows were obtained.
pub trait FlowSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn flows(&self) -> Result<Vec<Flow>, Self::Error>;
}

/// A fixed set of flows, handed out again on every scrape.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<Flow>);

impl FlowSource for StaticSource {
    type Error = Infallible;

    fn flows(&self) -> Result<Vec<Flow>, Self::Error> {
        Ok(self.0.clone())
    }
}

// ─── Public types ────────────────────────────────────────────────

/// Result of one scrape, ready for the metrics transport.
#[derive(Debug, Clone, Serialize)]
pub struct Scrape {
    pub families: Vec<MetricFamily>,

    // Bookkeeping
    pub flows_seen: usize,
    pub flows_selected: usize,
    pub skipped: u64,
}

/// Runs selection and condensation over the source's flows on demand.
///
/// Every `collect()` works on its own copy of the staged families, so
/// concurrent scrapes never see each other's samples.
pub struct Collector<S> {
    source: S,
    selector: Selector,
    staged: MetricsKeep,
}

// ─── Collector impl ──────────────────────────────────────────────

impl<S: FlowSource> Collector<S> {
    /// Validate the whole `logic` document up front; any problem here is
    /// fatal for the exporter.
    pub fn new(cnfg: &Config, source: S) -> Result<Self, ConfigError> {
        let logic = &cnfg.logic;
        let condenser = Condenser::from(logic.compression.label_folding.origin);
        let staged = MetricsKeep::stage(&logic.metrics, condenser)?;
        let selector = Selector::new(logic.selection.as_ref())?;

        debug!(families = ?staged.staged(), ?condenser, "collector staged");

        Ok(Self {
            source,
            selector,
            staged,
        })
    }

    /// Run one scrape: fetch flows, select, condense and finalize.  An
    /// empty flow list is a valid, empty scrape.
    pub fn collect(&self) -> Result<Scrape, CollectError> {
        let start = Instant::now();
        let flows = self
            .source
            .flows()
            .map_err(|e| CollectError::Source(Box::new(e)))?;

        let mut keep = self.staged.clone();
        let mut flows_selected = 0;
        for flow in flows.iter().filter(|f| self.selector.arbitrate(f)) {
            flows_selected += 1;
            keep.consume_sample(flow);
        }

        let skipped = keep.skipped();
        let families = keep.finalize();

        debug!(
            flows = flows.len(),
            selected = flows_selected,
            skipped,
            elapsed_us = start.elapsed().as_micros() as u64,
            "scrape complete"
        );

        Ok(Scrape {
            families,
            flows_seen: flows.len(),
            flows_selected,
            skipped,
        })
    }
}
