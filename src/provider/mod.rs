//! # Provider Module
//!
//! The OAuth2 capability the login flow consumes: PKCE pair generation,
//! authorization URL construction and the authorization-code token exchange.
//! [`OAuth2Client`] is the seam; [`HttpOAuth2Client`] talks to a real
//! authorization server with `reqwest`.

mod client;

use async_trait::async_trait;
use url::Url;

use crate::{
    error::AuthError,
    types::{AuthUrlOptions, PkcePair, Token},
};

pub use client::HttpOAuth2Client;

#[async_trait]
pub trait OAuth2Client: Send + Sync {
    fn generate_code_verifier(&self) -> PkcePair;

    fn generate_auth_url(&self, options: &AuthUrlOptions) -> Result<Url, AuthError>;

    async fn get_token(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<Token, AuthError>;
}
