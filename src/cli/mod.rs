//! # CLI Module
//!
//! User-facing commands. Each command wires the library pieces together and
//! reports progress and failures with the crate's output macros.
//!
//! - [`login`] - browser sign-in with PKCE; the code comes back through the
//!   local callback server or is pasted into the terminal
//!
//! ```bash
//! codelink login                          # scopes from CODELINK_SCOPES
//! codelink login --scope openid --scope email
//! codelink login --no-manual              # deep link only
//! ```

mod auth;

pub use auth::{expiry_label, login};
