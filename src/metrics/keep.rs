use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::bucket_keep::BucketKeep;
use super::family::{self, Descriptor, HistogramFamily, LabeledFamily, LabeledSample, MetricFamily, FLOW_LABELS};
use crate::condenser::Condenser;
use crate::config::{HistogramLifetime, MetricsConfig, Toggle};
use crate::error::ConfigError;
use crate::flow::Flow;

// ─── Staged metric slots ─────────────────────────────────────────

/// How two flows condensing to the same label key are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    /// Gauges: the flow seen last in the scrape stands
    LastWins,
    /// Counters: segment counts add up
    Sum,
}

#[derive(Debug, Clone)]
struct LabeledSlot {
    descriptor: Descriptor,
    merge: Merge,
    /// One value per label key
    samples: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
struct HistogramSlot {
    descriptor: Descriptor,
    keep: BucketKeep,
    /// Present for `running` histograms; shared by every clone of the
    /// staged keep
    running: Option<Arc<Mutex<BucketKeep>>>,
}

impl LabeledSlot {
    fn new(descriptor: Descriptor, merge: Merge) -> Self {
        Self {
            descriptor,
            merge,
            samples: BTreeMap::new(),
        }
    }

    fn record(&mut self, key: &str, value: f64) {
        match self.samples.get_mut(key) {
            Some(current) => match self.merge {
                Merge::LastWins => *current = value,
                Merge::Sum => *current += value,
            },
            None => {
                self.samples.insert(key.to_owned(), value);
            }
        }
    }

    fn finalize(self) -> LabeledFamily {
        LabeledFamily {
            descriptor: self.descriptor,
            labels: FLOW_LABELS,
            samples: self
                .samples
                .into_iter()
                .map(|(flow, value)| LabeledSample { flow, value })
                .collect(),
        }
    }
}

impl HistogramSlot {
    fn finalize(self) -> HistogramFamily {
        let (buckets, sum) = match &self.running {
            Some(running) => {
                let mut running = running.lock();
                running.absorb(&self.keep);
                running.reveal()
            }
            None => self.keep.reveal(),
        };

        HistogramFamily {
            descriptor: self.descriptor,
            buckets,
            sum,
        }
    }
}

// ─── MetricsKeep ─────────────────────────────────────────────────

/// The metric families of one scrape.
///
/// Built once from configuration (which is where invalid bounds are
/// caught) and cloned empty at the start of every scrape.  Only active
/// aspects and sub-metrics are staged at all.
#[derive(Debug, Clone)]
pub struct MetricsKeep {
    condenser: Condenser,
    gauges: Vec<LabeledSlot>,
    counters: Vec<LabeledSlot>,
    histograms: Vec<HistogramSlot>,
    skipped: u64,
}

impl MetricsKeep {
    /// Stage the active families; bad histogram bounds fail here.
    pub fn stage(cnfg: &MetricsConfig, condenser: Condenser) -> Result<Self, ConfigError> {
        let mut keep = Self {
            condenser,
            gauges: Vec::new(),
            counters: Vec::new(),
            histograms: Vec::new(),
            skipped: 0,
        };

        if let Some(hists) = cnfg.histograms.as_ref().filter(|h| h.active) {
            if let Some(latency) = hists.latency.as_ref().filter(|l| l.active) {
                let bucket_keep = BucketKeep::new(latency.bucket_bounds.clone())?;
                let running = match latency.lifetime {
                    HistogramLifetime::Scrape => None,
                    HistogramLifetime::Running => Some(Arc::new(Mutex::new(bucket_keep.clone()))),
                };
                keep.histograms.push(HistogramSlot {
                    descriptor: family::TCP_RTT_HIST,
                    keep: bucket_keep,
                    running,
                });
            }
        }

        if let Some(gauges) = cnfg.gauges.as_ref().filter(|g| g.active) {
            let staged = [
                (&gauges.rtt, family::TCP_RTT),
                (&gauges.cwnd, family::TCP_CWND),
                (&gauges.delivery_rate, family::TCP_DELIVERY_RATE),
            ];
            keep.gauges = staged
                .into_iter()
                .filter(|(toggle, _)| Toggle::on(toggle))
                .map(|(_, descriptor)| LabeledSlot::new(descriptor, Merge::LastWins))
                .collect();
        }

        if let Some(counters) = cnfg.counters.as_ref().filter(|c| c.active) {
            let staged = [
                (&counters.data_segs_in, family::TCP_DATA_SEGS_IN),
                (&counters.data_segs_out, family::TCP_DATA_SEGS_OUT),
            ];
            keep.counters = staged
                .into_iter()
                .filter(|(toggle, _)| Toggle::on(toggle))
                .map(|(_, descriptor)| LabeledSlot::new(descriptor, Merge::Sum))
                .collect();
        }

        Ok(keep)
    }

    /// Names of the staged families, in emission order.
    pub fn staged(&self) -> Vec<&'static str> {
        self.gauges
            .iter()
            .chain(&self.counters)
            .map(|s| s.descriptor.name)
            .chain(self.histograms.iter().map(|h| h.descriptor.name))
            .collect()
    }

    /// `(flow, sub-metric)` pairs skipped so far for missing data.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Fold one selected flow into every staged family.
    ///
    /// Missing data skips the affected sub-metric only; nothing here can
    /// fail the scrape.  Flows sharing a label key yield one sample per
    /// family: gauges keep the last value, counters sum.
    pub fn consume_sample(&mut self, flow: &Flow) {
        // Histograms are unlabeled and do not need a key
        for hist in &mut self.histograms {
            match flow.metric(hist.descriptor.field) {
                Some(value) => hist.keep.enter(value),
                None => {
                    self.skipped += 1;
                    warn!(
                        dst = %flow.dst,
                        dst_port = flow.dst_port,
                        metric = hist.descriptor.name,
                        field = hist.descriptor.field,
                        "flow lacks tcp_info field, skipping"
                    );
                }
            }
        }

        if self.gauges.is_empty() && self.counters.is_empty() {
            return;
        }

        let key = match self.condenser.shape_key(flow) {
            Ok(key) => key,
            Err(e) => {
                self.skipped += (self.gauges.len() + self.counters.len()) as u64;
                warn!(error = %e, "cannot derive flow label, skipping labeled metrics");
                return;
            }
        };

        for slot in self.gauges.iter_mut().chain(self.counters.iter_mut()) {
            match flow.metric(slot.descriptor.field) {
                Some(value) => slot.record(&key, value),
                None => {
                    self.skipped += 1;
                    warn!(
                        flow = %key,
                        metric = slot.descriptor.name,
                        field = slot.descriptor.field,
                        "flow lacks tcp_info field, skipping"
                    );
                }
            }
        }
    }

    /// Materialize every family: gauges, then counters, then histograms.
    pub fn finalize(self) -> Vec<MetricFamily> {
        let gauges = self.gauges.into_iter().map(|s| MetricFamily::Gauge(s.finalize()));
        let counters = self.counters.into_iter().map(|s| MetricFamily::Counter(s.finalize()));
        let histograms = self
            .histograms
            .into_iter()
            .map(|h| MetricFamily::Histogram(h.finalize()));

        gauges.chain(counters).chain(histograms).collect()
    }
}
