use thiserror::Error;

/// Every way a ledger operation can fail. All of these are recovered
/// locally by the caller; a failed operation leaves state unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Bad or missing user input: empty name, non-positive or non-finite
    /// amount, unparseable date.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Operation referenced a record position that no longer exists.
    #[error("no record at index {0}")]
    Index(usize),

    /// Export requested for a month that is neither current nor archived.
    #[error("no data for month '{0}'")]
    NotFound(String),

    /// History export requested before any month has been archived.
    #[error("no history to export yet")]
    Empty,

    /// Persistence failure from the backing store.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
