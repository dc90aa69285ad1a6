//! Error types for the wallet dashboard SDK

use crate::types::SessionStatus;
use thiserror::Error;

/// Raw error returned by an injected wallet provider's RPC surface
///
/// Carries the provider-defined numeric code so that reserved codes
/// (user rejection) can be told apart from everything else.
#[derive(Debug, Clone, Error)]
#[error("provider RPC error {code}: {message}")]
pub struct RpcError {
    /// Provider-defined error code
    pub code: i64,
    /// Human-readable message from the provider
    pub message: String,
}

impl RpcError {
    /// Creates a new RPC error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors that can occur when talking to the wallet provider
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The user declined the authorization request (reserved code 4001)
    #[error("user rejected the request")]
    UserRejected,

    /// Any other provider-side RPC failure
    #[error("provider error: {0}")]
    Rpc(RpcError),

    /// The provider reported success but returned no accounts
    #[error("provider returned no accounts")]
    NoAccounts,

    /// The provider returned a payload that does not match the method's shape
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors surfaced by the wallet session state machine
#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested intent is not valid in the current status
    #[error("cannot {intent} while {status}")]
    InvalidTransition {
        status: SessionStatus,
        intent: &'static str,
    },

    /// No usable wallet provider was detected at startup
    #[error("no wallet provider available")]
    NoProvider,

    /// A provider call issued by the session failed
    #[error("wallet provider failure: {0}")]
    Provider(#[from] GatewayError),

    /// Permission revocation failed during disconnect; local state was
    /// cleared regardless
    #[error("permission revocation failed: {0}")]
    Revocation(GatewayError),
}

/// Errors that can occur when fetching market listings
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network request failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Market API returned a non-success status
    #[error("market API error: {0}")]
    Api(String),

    /// Response body could not be interpreted
    #[error("invalid market response: {0}")]
    InvalidResponse(String),

    /// The API credential is not configured
    #[error("missing market API credential ({0} not set)")]
    MissingApiKey(&'static str),
}

impl MarketError {
    /// Creates an Api error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors from the durable session store
///
/// These are always non-fatal to callers: a failed read degrades to
/// "no persisted session" and a failed write is logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
