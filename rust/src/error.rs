use threadline_store_traits::StoreError;

/// Failures surfaced by the gateway, the sync engines and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("transmission failed: {0}")]
    TransmissionFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The platform notification surface rejected a show/cancel/channel call.
    #[error("alert surface error: {0}")]
    AlertSurface(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Error returned by a platform [`Transmitter`](crate::Transmitter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransmitError(pub String);

impl TransmitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
