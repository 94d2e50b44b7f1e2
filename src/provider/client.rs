use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::{
    config,
    error::AuthError,
    provider::OAuth2Client,
    types::{AuthUrlOptions, PkcePair, Token},
    utils,
};

/// Public (secretless) OAuth2 client using PKCE.
pub struct HttpOAuth2Client {
    client_id: String,
    auth_url: String,
    token_url: String,
    http: Client,
}

impl HttpOAuth2Client {
    pub fn new(
        client_id: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            http: Client::new(),
        }
    }

    /// Builds the client from configuration; without client id and endpoints there is no provider.
    pub fn from_env() -> Result<Self, AuthError> {
        match (config::client_id(), config::auth_url(), config::token_url()) {
            (Some(client_id), Some(auth_url), Some(token_url)) => {
                Ok(Self::new(client_id, auth_url, token_url))
            }
            _ => Err(AuthError::NoProviderRegistered),
        }
    }
}

#[async_trait]
impl OAuth2Client for HttpOAuth2Client {
    fn generate_code_verifier(&self) -> PkcePair {
        utils::generate_pkce_pair()
    }

    fn generate_auth_url(&self, options: &AuthUrlOptions) -> Result<Url, AuthError> {
        let mut url = Url::parse(&self.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &options.redirect_uri)
            .append_pair("scope", &utils::join_scopes(&options.scopes))
            .append_pair("state", &options.state)
            .append_pair("code_challenge", &options.code_challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url)
    }

    /// Exchanges an authorization code for a token, proving possession of the verifier.
    async fn get_token(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<Token, AuthError> {
        let res = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?
            .error_for_status()?;

        let json: Value = res.json().await?;

        let access_token = json["access_token"]
            .as_str()
            .ok_or_else(|| AuthError::InvalidTokenResponse("access_token".to_string()))?;

        Ok(Token {
            access_token: access_token.to_string(),
            refresh_token: json["refresh_token"].as_str().map(str::to_string),
            scope: json["scope"].as_str().unwrap_or_default().to_string(),
            expires_in: json["expires_in"].as_u64().unwrap_or(3600),
            obtained_at: Utc::now().timestamp() as u64,
        })
    }
}
