use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use url::Url;

use crate::{Res, api, auth::NonceCodeRegistry};

pub fn router(registry: NonceCodeRegistry, inbound: mpsc::UnboundedSender<Url>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(registry))
        .layer(Extension(inbound))
}

/// Binds the callback server and serves it in the background.
///
/// Binding happens before returning so a taken port fails the login up front.
pub async fn start_api_server(
    addr: &str,
    registry: NonceCodeRegistry,
    inbound: mpsc::UnboundedSender<Url>,
) -> Res<JoinHandle<()>> {
    let addr = SocketAddr::from_str(addr)?;
    let listener = TcpListener::bind(&addr).await?;
    let app = router(registry, inbound);

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            crate::warning!("Callback server stopped: {}", e);
        }
    }))
}
