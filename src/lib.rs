//! Flow selection and metrics condensation for a socket-statistics
//! exporter.
//!
//! A [`Collector`] asks its [`FlowSource`] for the current TCP flows,
//! keeps the ones the [`Selector`] accepts, folds each into a label key
//! with the [`Condenser`] and accumulates its socket metrics into the
//! families staged by [`MetricsKeep`].

pub mod condenser;
pub mod config;
pub mod error;
pub mod flow;
pub mod metrics;
pub mod selection;

pub use condenser::Condenser;
pub use config::Config;
pub use error::{CollectError, CondenseError, ConfigError};
pub use flow::{Flow, ProcessContext, SocketReport};
pub use metrics::{BucketKeep, Collector, FlowSource, MetricFamily, MetricsKeep, Scrape, StaticSource};
pub use selection::Selector;
