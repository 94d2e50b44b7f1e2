//! The host environment the login runs in: how a local callback URI is made
//! reachable from the outside, and how a URL is opened for the user.

use async_trait::async_trait;
use url::Url;

use crate::error::AuthError;

#[async_trait]
pub trait Environment: Send + Sync {
    /// Maps a local callback URI to one the browser can reach.
    async fn as_external_uri(&self, uri: Url) -> Result<Url, AuthError>;

    /// Opens `url` in the user's browser. Returns `false` when that failed.
    fn open_external(&self, url: &Url) -> bool;
}

/// Local desktop: the default browser and, optionally, a public base URL
/// (e.g. a tunnel) that forwards to the local callback server.
#[derive(Debug, Clone, Default)]
pub struct DesktopEnvironment {
    public_base: Option<Url>,
}

impl DesktopEnvironment {
    pub fn new(public_base: Option<Url>) -> Self {
        Self { public_base }
    }
}

#[async_trait]
impl Environment for DesktopEnvironment {
    async fn as_external_uri(&self, uri: Url) -> Result<Url, AuthError> {
        let Some(base) = &self.public_base else {
            return Ok(uri);
        };

        let mut external = base.clone();
        external.set_query(uri.query());
        Ok(external)
    }

    fn open_external(&self, url: &Url) -> bool {
        webbrowser::open(url.as_str()).is_ok()
    }
}
