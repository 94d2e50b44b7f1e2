//! Error taxonomy for the authorization-code acquisition engine.
//!
//! Attempt failures ([`AuthError::Cancelled`], [`AuthError::Timeout`]) travel
//! back to the caller of a login attempt. Malformed callbacks are absorbed by
//! the deep-link listener and never escape it. Invariant violations
//! ([`AuthError::DuplicateNonce`], [`AuthError::DuplicateSessions`],
//! [`AuthError::NoProviderRegistered`]) indicate misuse by the caller.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The user dismissed the login or the caller cancelled it.
    #[error("Cancelled")]
    Cancelled,

    /// No authorization code arrived within the ceiling.
    #[error("Timed out after {}s waiting for an authorization code", .0.as_secs())]
    Timeout(Duration),

    #[error("A login attempt is already pending for nonce '{0}'")]
    DuplicateNonce(String),

    #[error("Callback is missing required parameters: {0}")]
    MalformedCallback(String),

    #[error("Found more than one stored session; only a single session is supported")]
    DuplicateSessions,

    #[error("No OAuth2 provider is registered; set CODELINK_CLIENT_ID, CODELINK_AUTH_URL and CODELINK_TOKEN_URL")]
    NoProviderRegistered,

    /// Back navigation left the first step of an input flow.
    #[error("Navigated back out of the input flow")]
    Back,

    #[error("Input host failure: {0}")]
    Ui(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(#[from] reqwest::Error),

    #[error("Token response is missing '{0}'")]
    InvalidTokenResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AuthError {
    /// Cancellation is an expected way for a login to end, not a failure to report loudly.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AuthError::Timeout(_))
    }
}
