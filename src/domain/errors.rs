use thiserror::Error;

/// Raised when the bus reports an `ActiveState` value outside the tracked set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown active state '{raw}'")]
pub struct UnknownStateError {
    pub raw: String,
}

/// Errors raised while delivering a payload to the gateway
#[derive(Debug, Error)]
pub enum PushFailure {
    #[error("Failed to reach gateway at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway at {url} rejected push with status {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid push target: {reason}")]
    InvalidTarget { reason: String },
}

/// Failure to establish the bus subscription (fatal at startup)
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Bus connection failed: {reason}")]
    Connect { reason: String },

    #[error("Bus subscription already taken")]
    AlreadySubscribed,
}

/// Errors reported on the bus error stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Recoverable: a single notification could not be delivered or decoded
    #[error("Bus transport error: {reason}")]
    Transport { reason: String },

    /// Fatal: the subscription itself is gone
    #[error("Bus subscription lost: {reason}")]
    SubscriptionLost { reason: String },
}

impl BusError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BusError::SubscriptionLost { .. })
    }
}

/// Terminal outcomes of the coordinator loop
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Subscribe(#[from] SubscriptionError),

    #[error("Bus subscription lost: {reason}")]
    SubscriptionLost { reason: String },
}
