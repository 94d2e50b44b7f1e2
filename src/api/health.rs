use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::auth::NonceCodeRegistry;

/// Liveness plus the number of login attempts still waiting for a code.
pub async fn health(Extension(registry): Extension<NonceCodeRegistry>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "pending_logins": registry.pending_count(),
    }))
}
