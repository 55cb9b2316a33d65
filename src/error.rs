//! Error taxonomy for the QuickPick core.
//!
//! Three failure classes with very different handling policies: validation
//! failures abort the operation before any state is touched and are surfaced
//! to the caller; sync failures are logged and swallowed at the push/pull
//! boundary (the shop stays usable offline); database failures come from the
//! local SQLite layer and are propagated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    /// Rejected input: missing checkout fields, empty cart, bad product
    /// fields, illegal status transitions. Nothing was mutated.
    #[error("validation: {0}")]
    Validation(String),

    /// Network or parse failure against the remote backend. Optimistic local
    /// state is never rolled back on this.
    #[error("sync: {0}")]
    Sync(String),

    /// Local SQLite persistence failure.
    #[error("database: {0}")]
    Database(String),

    /// Internal state error (poisoned lock). Should not happen in practice;
    /// mapped instead of unwrapped so callers can degrade gracefully.
    #[error("state: {0}")]
    State(String),
}

impl ShopError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ShopError::Validation(msg.into())
    }

    pub fn sync(msg: impl Into<String>) -> Self {
        ShopError::Sync(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        ShopError::Database(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        ShopError::State(msg.into())
    }
}
