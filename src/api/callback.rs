use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::mpsc;
use url::Url;

use crate::auth::{CallbackParams, NonceCodeRegistry};

pub const DEEP_LINK_BASE: &str = "codelink://auth/callback";

/// Receives the browser redirect and forwards it as a deep link.
///
/// Only redirects for a login that is still waiting are forwarded; the page
/// tells the user which case applied.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(registry): Extension<NonceCodeRegistry>,
    Extension(inbound): Extension<mpsc::UnboundedSender<Url>>,
) -> Html<&'static str> {
    let Some(uri) = deep_link_from_query(&params) else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    let pending = CallbackParams::from_uri(&uri)
        .map(|params| registry.is_pending(&params.nonce))
        .unwrap_or(false);
    if !pending || inbound.send(uri).is_err() {
        return Html("<h4>No login is waiting for this code. Start a new login and try again.</h4>");
    }

    Html("<h2>Authorization code received.</h2><p>Close browser window.</p>")
}

/// Builds the deep-link URI for a redirect query.
///
/// On a direct redirect the nonce only travels inside `state` (the callback
/// URI handed to the provider), so it is lifted from there when absent.
pub fn deep_link_from_query(params: &HashMap<String, String>) -> Option<Url> {
    let code = params.get("code").filter(|code| !code.is_empty())?;
    let nonce = match params.get("nonce").filter(|nonce| !nonce.is_empty()) {
        Some(nonce) => nonce.clone(),
        None => nonce_from_state(params.get("state")?)?,
    };

    let mut uri = Url::parse(DEEP_LINK_BASE).ok()?;
    uri.query_pairs_mut()
        .append_pair("nonce", &nonce)
        .append_pair("code", code);
    Some(uri)
}

fn nonce_from_state(state: &str) -> Option<String> {
    let state = Url::parse(state).ok()?;
    state
        .query_pairs()
        .find(|(key, value)| key == "nonce" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
