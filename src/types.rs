use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// PKCE verifier and the S256 challenge derived from it.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Options for a single login attempt.
#[derive(Debug, Clone)]
pub struct TriggerOptions {
    pub nonce: String,
    pub scopes: Vec<String>,
    pub code_challenge: String,
}

/// Inputs to the provider's authorization URL.
#[derive(Debug, Clone)]
pub struct AuthUrlOptions {
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub state: String,
    pub code_challenge: String,
}

/// The code obtained by one successful login attempt, together with the
/// redirect URI the token exchange has to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResult {
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub access_token: String,
    pub scopes: Vec<String>,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Tabled)]
pub struct SessionTableRow {
    pub id: String,
    pub scopes: String,
    pub expires: String,
}
