//! Configuration management for the codelink login.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! - Linux: `~/.local/share/codelink/.env`
//! - macOS: `~/Library/Application Support/codelink/.env`
//! - Windows: `%LOCALAPPDATA%/codelink/.env`
//!
//! Variables already set in the environment win over the file. Every
//! accessor falls back to a default or returns `None`; nothing here panics.

use std::{env, path::PathBuf, time::Duration};

use url::Url;

use crate::{auth::CODE_TIMEOUT, error::AuthError, utils};

/// Loads environment variables from the `.env` file in the local data directory.
///
/// Creates the directory if needed. A missing file is not an error.
///
/// # Errors
///
/// Returns the error text when the directory cannot be created or the file
/// cannot be parsed.
///
/// # Example
///
/// ```
/// config::load_env().await?;
/// let addr = config::server_addr();
/// ```
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("codelink/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Address the local callback server binds to (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    var("SERVER_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string())
}

/// OAuth2 client id (`CODELINK_CLIENT_ID`). Without it no provider is registered.
pub fn client_id() -> Option<String> {
    var("CODELINK_CLIENT_ID")
}

/// Authorization endpoint (`CODELINK_AUTH_URL`).
pub fn auth_url() -> Option<String> {
    var("CODELINK_AUTH_URL")
}

/// Token endpoint (`CODELINK_TOKEN_URL`).
pub fn token_url() -> Option<String> {
    var("CODELINK_TOKEN_URL")
}

/// Local callback URI the redirect ends up at (`CODELINK_CALLBACK_URL`),
/// by default `/callback` on the server address.
pub fn callback_url() -> Result<Url, AuthError> {
    let raw = var("CODELINK_CALLBACK_URL")
        .unwrap_or_else(|| format!("http://{}/callback", server_addr()));
    Ok(Url::parse(&raw)?)
}

/// Publicly reachable base forwarding to the callback (`CODELINK_PUBLIC_CALLBACK_URL`).
pub fn public_callback_url() -> Result<Option<Url>, AuthError> {
    var("CODELINK_PUBLIC_CALLBACK_URL")
        .map(|raw| Url::parse(&raw))
        .transpose()
        .map_err(AuthError::from)
}

/// Provider-facing `redirect_uri` (`CODELINK_REDIRECT_URI`).
///
/// Point it at a redirect endpoint that forwards to `state` when the local
/// callback is not reachable by the provider; by default the local callback
/// itself is used.
pub fn redirect_uri() -> Result<String, AuthError> {
    match var("CODELINK_REDIRECT_URI") {
        Some(uri) => Ok(uri),
        None => Ok(callback_url()?.to_string()),
    }
}

/// Requested scopes (`CODELINK_SCOPES`, space or comma separated).
pub fn scopes() -> Vec<String> {
    var("CODELINK_SCOPES")
        .map(|raw| utils::parse_scopes(&raw))
        .unwrap_or_default()
}

/// Ceiling for a login attempt (`CODELINK_TIMEOUT_SECS`), 60 seconds by default.
pub fn code_timeout() -> Duration {
    var("CODELINK_TIMEOUT_SECS")
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(CODE_TIMEOUT)
}
