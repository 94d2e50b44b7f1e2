use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    auth::{ManualEntryChannel, NonceCodeRegistry},
    environment::Environment,
    error::AuthError,
    input::InputHost,
    provider::OAuth2Client,
    types::{AuthUrlOptions, FlowResult, TriggerOptions},
    warning,
};

/// One browser login attempt per [`AuthorizationFlow::trigger`] call.
///
/// The authorization URL carries the externally reachable callback URI (with
/// the nonce) in `state`, so a redirect endpoint can forward the code back.
/// The code arrives either as a deep link routed through the registry or by
/// manual entry; the first to settle the registry entry wins.
pub struct AuthorizationFlow {
    registry: NonceCodeRegistry,
    client: Arc<dyn OAuth2Client>,
    environment: Arc<dyn Environment>,
    manual: Option<ManualEntryChannel>,
    callback_uri: Url,
    redirect_uri: String,
}

impl AuthorizationFlow {
    pub fn new(
        registry: NonceCodeRegistry,
        client: Arc<dyn OAuth2Client>,
        environment: Arc<dyn Environment>,
        callback_uri: Url,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            client,
            environment,
            manual: None,
            callback_uri,
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Races a manual code prompt on `host` against the deep link.
    pub fn with_manual_entry(mut self, host: Arc<dyn InputHost>) -> Self {
        self.manual = Some(ManualEntryChannel::new(host, self.registry.clone()));
        self
    }

    pub fn registry(&self) -> &NonceCodeRegistry {
        &self.registry
    }

    pub fn client(&self) -> &Arc<dyn OAuth2Client> {
        &self.client
    }

    /// The provider-facing redirect URI presented at token exchange.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub async fn authorization_url(&self, options: &TriggerOptions) -> Result<Url, AuthError> {
        let mut callback = self.callback_uri.clone();
        callback
            .query_pairs_mut()
            .append_pair("nonce", &options.nonce);
        let callback = self.environment.as_external_uri(callback).await?;

        self.client.generate_auth_url(&AuthUrlOptions {
            redirect_uri: self.redirect_uri.clone(),
            scopes: options.scopes.clone(),
            state: callback.to_string(),
            code_challenge: options.code_challenge.clone(),
        })
    }

    /// Opens the browser login and waits for its authorization code.
    ///
    /// Registers `options.nonce`, opens the authorization URL and waits for
    /// whichever channel settles first: the deep link or, when configured,
    /// the manual entry prompt. A browser that fails to open only produces a
    /// warning with the URL to visit by hand.
    ///
    /// The prompt, the registry entry and its timer are released on every
    /// exit, including when the returned future is dropped.
    ///
    /// # Arguments
    ///
    /// * `options` - Nonce, requested scopes and PKCE challenge of this attempt
    /// * `cancel` - Caller-side cancellation; the attempt uses a child of it
    ///
    /// # Errors
    ///
    /// - [`AuthError::Cancelled`] when `cancel` fires or the prompt is dismissed
    /// - [`AuthError::Timeout`] when no code arrives within the registry timeout
    /// - [`AuthError::DuplicateNonce`] when the nonce is already pending
    /// - [`AuthError::Back`] or [`AuthError::Ui`] when the manual prompt fails
    ///
    /// # Example
    ///
    /// ```
    /// let pkce = flow.client().generate_code_verifier();
    /// let result = flow
    ///     .trigger(
    ///         TriggerOptions {
    ///             nonce: utils::generate_nonce(),
    ///             scopes: vec!["openid".to_string()],
    ///             code_challenge: pkce.challenge,
    ///         },
    ///         &CancellationToken::new(),
    ///     )
    ///     .await?;
    /// println!("code {} for {}", result.code, result.redirect_uri);
    /// ```
    pub async fn trigger(
        &self,
        options: TriggerOptions,
        cancel: &CancellationToken,
    ) -> Result<FlowResult, AuthError> {
        let auth_url = self.authorization_url(&options).await?;

        // shared by the registry wait and the manual prompt; cancelled on exit
        let attempt = cancel.child_token();
        let _release = attempt.clone().drop_guard();

        let pending = self.registry.register(&options.nonce)?;

        if !self.environment.open_external(&auth_url) {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            );
        }

        let code = match &self.manual {
            Some(manual) => {
                let wait = pending.wait(&attempt);
                tokio::pin!(wait);

                tokio::select! {
                    code = &mut wait => code?,
                    entered = manual.run(&options.nonce, &attempt) => {
                        entered?;
                        // the prompt either delivered the code or cancelled the attempt
                        wait.await?
                    }
                }
            }
            None => pending.wait(&attempt).await?,
        };

        Ok(FlowResult {
            code,
            redirect_uri: self.redirect_uri.clone(),
        })
    }
}
