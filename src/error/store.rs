use thiserror::Error;

/// Errors from the external time-series/search store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying Redis command or connection failure.
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// A store reply did not have the shape the command's decoder expects.
    ///
    /// Raised instead of indexing out of bounds when a positional reply is
    /// shorter or differently typed than the command contract promises.
    #[error("Malformed {command} reply: {reason}")]
    Decode {
        command: &'static str,
        reason: String,
    },

    /// A cached JSON document failed to serialize or deserialize.
    #[error("Invalid JSON document in store: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn decode(command: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            command,
            reason: reason.into(),
        }
    }
}
