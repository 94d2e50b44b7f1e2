//! # Auth Module
//!
//! Authorization-code acquisition with PKCE. A login attempt is identified by
//! a one-time nonce; the code for it can arrive through two racing channels:
//!
//! - [`DeepLinkListener`] - the browser redirect, delivered as an inbound URI
//!   carrying `nonce` and `code`
//! - [`ManualEntryChannel`] - the user pasting the code into a prompt
//!
//! Both feed the [`NonceCodeRegistry`], which settles each pending request at
//! most once; timeout and cancellation compete in the same race.
//! [`AuthorizationFlow`] drives one attempt end to end.
//!
//! ```text
//! SessionIssuer -> AuthorizationFlow -> { DeepLinkListener, ManualEntryChannel }
//!                        ^                              |
//!                        +------- NonceCodeRegistry <---+
//! ```

mod deep_link;
mod flow;
mod manual;
mod registry;

pub use deep_link::{CallbackParams, DeepLinkListener};
pub use flow::AuthorizationFlow;
pub use manual::{EMPTY_CODE_MESSAGE, MANUAL_ENTRY_TITLE, ManualEntryChannel};
pub use registry::{CODE_TIMEOUT, NonceCodeRegistry, PendingCode};
