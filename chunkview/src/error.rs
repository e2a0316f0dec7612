use alloc::string::String;

use crate::ItemRange;

/// Viewport configuration that cannot be auto-corrected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("viewport height must be at least one row")]
    ZeroHeight,
}

/// A failure reported by a [`crate::DataSource`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A chunk fetch failed.
///
/// The cache leaves the chunk absent, so a later `ensure` for the same range retries.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to load items {range}: {source}")]
pub struct LoadError {
    pub range: ItemRange,
    #[source]
    pub source: SourceError,
}

/// An animated formatter could not produce content for a row.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("formatter failed: {0}")]
    Failed(String),
    #[error("formatter panicked")]
    Panicked,
}
