use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    auth::AuthorizationFlow,
    error::AuthError,
    types::{Session, TriggerOptions},
    utils,
};

/// Turns a successful login attempt into the single session of this process.
pub struct SessionIssuer {
    flow: AuthorizationFlow,
    sessions: Mutex<Vec<Session>>,
}

impl SessionIssuer {
    pub fn new(flow: AuthorizationFlow) -> Self {
        SessionIssuer {
            flow,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn flow(&self) -> &AuthorizationFlow {
        &self.flow
    }

    /// Runs a fresh login attempt for `scopes` and exchanges its code.
    ///
    /// Each call uses a new nonce and PKCE pair; a failed attempt is not
    /// retried. The new session replaces any previous one.
    pub async fn create_session(
        &self,
        scopes: &[String],
        cancel: &CancellationToken,
    ) -> Result<Session, AuthError> {
        let client = self.flow.client();
        let pkce = client.generate_code_verifier();

        let result = self
            .flow
            .trigger(
                TriggerOptions {
                    nonce: utils::generate_nonce(),
                    scopes: scopes.to_vec(),
                    code_challenge: pkce.challenge.clone(),
                },
                cancel,
            )
            .await?;

        let token = client
            .get_token(&result.code, &pkce.verifier, &result.redirect_uri)
            .await?;

        let granted = utils::parse_scopes(&token.scope);
        let session = Session {
            id: utils::generate_nonce(),
            access_token: token.access_token,
            scopes: if granted.is_empty() {
                utils::parse_scopes(&utils::join_scopes(scopes))
            } else {
                granted
            },
            expires_in: token.expires_in,
            obtained_at: token.obtained_at,
        };

        let mut sessions = self.sessions.lock().await;
        *sessions = vec![session.clone()];
        Ok(session)
    }

    /// Seeds the issuer with sessions read from external storage.
    pub async fn restore(&self, stored: Vec<Session>) -> Result<(), AuthError> {
        if stored.len() > 1 {
            return Err(AuthError::DuplicateSessions);
        }
        *self.sessions.lock().await = stored;
        Ok(())
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().await.clone()
    }

    pub async fn remove_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session| session.id != id);
        sessions.len() != before
    }
}
