//! # API Module
//!
//! HTTP endpoints of the local callback server.
//!
//! - [`callback`] - receives the OAuth redirect and hands `{nonce, code}` to
//!   the deep-link stream consumed by [`crate::auth::DeepLinkListener`]
//! - [`health`] - status and version for checks
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use codelink::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::{DEEP_LINK_BASE, callback, deep_link_from_query};
pub use health::health;
