use thiserror::Error;

/// Why a call to the slot server failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The server answered with a non-success status.
    #[error("server responded with {status}: {detail}")]
    Server { status: u16, detail: String },
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Terminal failure of a single spin attempt. None of these are retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpinError {
    #[error("Invalid wager: {0}")]
    Validation(String),
    #[error("Insufficient funds!")]
    InsufficientFunds {
        balance: u64,
        wager: u64,
        reset_offered: bool,
    },
    #[error("{0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("A spin is already in progress")]
    Busy,
}

impl SpinError {
    pub fn offers_reset(&self) -> bool {
        matches!(
            self,
            SpinError::InsufficientFunds {
                reset_offered: true,
                ..
            }
        )
    }
}

impl From<ServiceError> for SpinError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Server { detail, .. } => SpinError::Server(detail),
            ServiceError::Transport(msg) => SpinError::Network(msg),
            ServiceError::Decode(msg) => {
                SpinError::Network(format!("invalid response: {msg}"))
            }
        }
    }
}
