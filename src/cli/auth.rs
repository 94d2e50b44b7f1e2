use std::sync::Arc;

use chrono::DateTime;
use tabled::Table;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    auth::{AuthorizationFlow, DeepLinkListener, NonceCodeRegistry},
    config,
    environment::DesktopEnvironment,
    error,
    info,
    input::TerminalHost,
    management::SessionIssuer,
    provider::HttpOAuth2Client,
    server::start_api_server,
    success,
    types::{Session, SessionTableRow},
    warning,
};

/// Signs in through the browser, with manual code entry as a fallback.
pub async fn login(scopes: Vec<String>, manual: bool) {
    let client = match HttpOAuth2Client::from_env() {
        Ok(client) => client,
        Err(e) => error!("{}", e),
    };

    let (callback_url, redirect_uri, public_url) = match (
        config::callback_url(),
        config::redirect_uri(),
        config::public_callback_url(),
    ) {
        (Ok(callback), Ok(redirect), Ok(public)) => (callback, redirect, public),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            error!("Invalid callback configuration: {}", e)
        }
    };

    let registry = NonceCodeRegistry::with_timeout(config::code_timeout());
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let listener = DeepLinkListener::new(registry.clone()).spawn(inbound_rx);
    let server = match start_api_server(&config::server_addr(), registry.clone(), inbound_tx).await
    {
        Ok(server) => server,
        Err(e) => error!("Failed to start callback server: {}", e),
    };

    let mut flow = AuthorizationFlow::new(
        registry,
        Arc::new(client),
        Arc::new(DesktopEnvironment::new(public_url)),
        callback_url,
        redirect_uri,
    );
    if manual {
        match TerminalHost::new() {
            Ok(host) => flow = flow.with_manual_entry(Arc::new(host)),
            Err(e) => warning!("Manual code entry unavailable: {}", e),
        }
    }
    let issuer = SessionIssuer::new(flow);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let scopes = if scopes.is_empty() {
        config::scopes()
    } else {
        scopes
    };

    info!("Waiting for the browser sign-in to complete...");
    let result = issuer.create_session(&scopes, &cancel).await;
    server.abort();
    listener.abort();

    match result {
        Ok(session) => {
            success!("Authentication successful!");
            println!("{}", Table::new(vec![session_row(&session)]));
        }
        Err(e) if e.is_cancellation() => warning!("Login cancelled."),
        Err(e) if e.is_timeout() => error!("{}. Run codelink login to try again.", e),
        Err(e) => error!("Authentication failed: {}", e),
    }
}

fn session_row(session: &Session) -> SessionTableRow {
    let expires = expiry_label(session.obtained_at, session.expires_in);

    SessionTableRow {
        id: session.id.chars().take(8).collect(),
        scopes: session.scopes.join(" "),
        expires,
    }
}

/// `expires_in` comes straight from the provider; out-of-range sums read as unknown.
pub fn expiry_label(obtained_at: u64, expires_in: u64) -> String {
    obtained_at
        .checked_add(expires_in)
        .and_then(|at| i64::try_from(at).ok())
        .and_then(|at| DateTime::from_timestamp(at, 0))
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
