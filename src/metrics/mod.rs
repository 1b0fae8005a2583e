pub mod bucket_keep;
pub mod collector;
pub mod family;
pub mod keep;

pub use bucket_keep::BucketKeep;
pub use collector::{Collector, FlowSource, Scrape, StaticSource};
pub use family::{HistogramFamily, LabeledFamily, LabeledSample, MetricFamily};
pub use keep::MetricsKeep;
