use thiserror::Error;

/// Rejected cache geometry. Raised once, before the cache is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("associativity must be at least 1")]
    ZeroAssociativity,

    #[error("set bits ({set_bits}) plus block bits ({block_bits}) exceed a 64-bit address")]
    AddressTooWide { set_bits: u32, block_bits: u32 },

    #[error("{set_bits} set bits is more than the supported maximum of {max}")]
    TooManySets { set_bits: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable trace record on line {line}: {source}")]
    Unreadable {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace record on line {line}: {text:?}")]
    Malformed { line: usize, text: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write csv record: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
