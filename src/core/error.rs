//! Error taxonomy shared by the normalizer, the store and the fetch hooks

use thiserror::Error;

/// Errors surfaced at the fetch-hook boundary.
///
/// The type is `Clone` so one in-flight result can be handed to every
/// caller that joined the same request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorerError {
    /// Malformed address or hash. Rejected before any network call.
    #[error("invalid {kind}: {input}")]
    InvalidFormat { kind: &'static str, input: String },

    /// The chain has no such account or transaction.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The SDK call was rejected, timed out or returned garbage.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The SDK client could not be constructed.
    #[error("client initialization failed: {0}")]
    InitializationFailure(String),
}

impl ExplorerError {
    pub fn invalid_address(input: &str) -> Self {
        Self::InvalidFormat {
            kind: "address",
            input: input.to_string(),
        }
    }

    pub fn invalid_hash(input: &str) -> Self {
        Self::InvalidFormat {
            kind: "transaction hash",
            input: input.to_string(),
        }
    }

    /// Whether this error belongs in the store's `error` field.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Self::NetworkFailure(_) | Self::InitializationFailure(_)
        )
    }

    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidFormat { kind, .. } => format!("That does not look like a valid {kind}"),
            Self::NotFound { kind, .. } => format!("No {kind} found with this identifier"),
            Self::NetworkFailure(msg) => format!("Could not reach the network: {msg}"),
            Self::InitializationFailure(msg) => format!("Could not connect to the chain: {msg}"),
        }
    }
}

/// Errors returned by [`ChainClient`](crate::infrastructure::sdk::ChainClient) implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("resource not found")]
    NotFound,

    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            ClientError::NotFound
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl ClientError {
    /// Lift into the hook-level taxonomy, naming what was looked up
    pub fn into_explorer(self, kind: &'static str, id: &str) -> ExplorerError {
        match self {
            ClientError::NotFound => ExplorerError::NotFound {
                kind,
                id: id.to_string(),
            },
            ClientError::Network(msg) | ClientError::Decode(msg) => {
                ExplorerError::NetworkFailure(msg)
            }
        }
    }
}
