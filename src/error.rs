use thiserror::Error;

// ─── Configuration ───────────────────────────────────────────────

/// Fatal problems found while turning the `logic` document into a
/// running keep.  Every constructor returns these; nothing is defaulted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("bucket bounds must not be empty")]
    EmptyBounds,

    #[error("bucket bound #{index} ({bound}) is not finite")]
    NonFiniteBound { index: usize, bound: f64 },

    #[error("bucket bounds must be strictly ascending: {prev} is followed by {next}")]
    UnorderedBounds { prev: f64, next: f64 },

    #[error("port range {lower}..={upper} is inverted")]
    InvertedPortRange { lower: u16, upper: u16 },

    #[error("invalid peer address \"{0}\"")]
    InvalidAddress(String),

    #[error("invalid peer network \"{0}\"")]
    InvalidNetwork(String),

    #[error("command criteria must not be empty strings")]
    EmptyCommand,
}

// ─── Per-flow ────────────────────────────────────────────────────

/// A flow that could not be folded into a label key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CondenseError {
    /// `pid_condensed` folding needs the owning process context.
    #[error("flow {dst}:{dst_port} carries no usr_ctxt")]
    MissingContext { dst: String, dst_port: u16 },
}

// ─── Scrape ──────────────────────────────────────────────────────

/// Raised when a scrape cannot start because the flow source failed.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("flow source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}
