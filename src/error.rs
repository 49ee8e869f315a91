use thiserror::Error;

/// Accumulator-state preconditions violated by an operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// An operand holds a completed block below its coarsest level that is
    /// still waiting for a partner. The samples behind it cannot be
    /// reconstructed from level statistics, so merging would have to guess.
    #[error("unpaired block at level {level}; merge requires block-complete operands")]
    DanglingBlock { level: usize },
}

/// Failures while reading or writing a persisted observable record.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("inconsistent record: {0}")]
    Corrupt(String),

    #[error("malformed record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
