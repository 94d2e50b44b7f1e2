use tokio::{sync::mpsc, task::JoinHandle};
use url::Url;

use crate::{auth::NonceCodeRegistry, error::AuthError};

/// `nonce` and `code` carried by an inbound callback URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub nonce: String,
    pub code: String,
}

impl CallbackParams {
    /// Extracts `nonce` and `code` from the query; anything else is ignored.
    pub fn from_uri(uri: &Url) -> Result<Self, AuthError> {
        let mut nonce = None;
        let mut code = None;
        for (key, value) in uri.query_pairs() {
            match key.as_ref() {
                "nonce" if !value.is_empty() => nonce = Some(value.into_owned()),
                "code" if !value.is_empty() => code = Some(value.into_owned()),
                _ => {}
            }
        }

        match (nonce, code) {
            (Some(nonce), Some(code)) => Ok(Self { nonce, code }),
            (None, _) => Err(AuthError::MalformedCallback("nonce".to_string())),
            (_, None) => Err(AuthError::MalformedCallback("code".to_string())),
        }
    }
}

/// Routes inbound callback URIs into the registry.
///
/// The listener does not know which nonces are outstanding; URIs that lack a
/// nonce or code, or that match nothing pending, are dropped without error.
#[derive(Clone)]
pub struct DeepLinkListener {
    registry: NonceCodeRegistry,
}

impl DeepLinkListener {
    pub fn new(registry: NonceCodeRegistry) -> Self {
        Self { registry }
    }

    /// Returns `true` when the URI settled a pending request.
    pub fn handle_uri(&self, uri: &Url) -> bool {
        match CallbackParams::from_uri(uri) {
            Ok(params) => self.registry.resolve_code(&params.nonce, &params.code),
            Err(_) => false,
        }
    }

    pub fn handle_raw(&self, uri: &str) -> bool {
        match Url::parse(uri) {
            Ok(uri) => self.handle_uri(&uri),
            Err(_) => false,
        }
    }

    /// Consumes the inbound URI stream until every sender is gone.
    pub fn spawn(self, mut inbound: mpsc::UnboundedReceiver<Url>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(uri) = inbound.recv().await {
                self.handle_uri(&uri);
            }
        })
    }
}
