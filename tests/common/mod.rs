#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use codelink::{
    auth::{AuthorizationFlow, NonceCodeRegistry},
    environment::Environment,
    error::AuthError,
    input::{InputHost, InputWidget, WidgetEvent, WidgetKind, WidgetView},
    provider::{HttpOAuth2Client, OAuth2Client},
    types::{AuthUrlOptions, PkcePair, Token},
    utils,
};
use tokio::sync::{Notify, mpsc};
use url::Url;

pub const REDIRECT_URI: &str = "https://redirect.test/vscode/redirect";
pub const CALLBACK_URI: &str = "http://127.0.0.1:8080/callback";
pub const TEST_VERIFIER: &str = "test-verifier";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Created(usize, WidgetKind),
    Updated(usize, WidgetView),
    Validation(usize, Option<String>),
    Enabled(usize, bool),
    Busy(usize, bool),
    Shown(usize),
    Disposed(usize),
}

/// Input host whose widgets replay one scripted event list each, in creation order.
/// A widget without a script stays silent until disposed.
pub struct ScriptedHost {
    scripts: Mutex<VecDeque<Vec<WidgetEvent>>>,
    log: Arc<Mutex<Vec<HostEvent>>>,
    next_id: AtomicUsize,
}

impl ScriptedHost {
    pub fn new(scripts: Vec<Vec<WidgetEvent>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            log: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(0),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn log(&self) -> Vec<HostEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.next_id.load(Ordering::SeqCst)
    }

    pub fn disposed(&self, id: usize) -> bool {
        self.log().contains(&HostEvent::Disposed(id))
    }

    pub fn validations(&self, id: usize) -> Vec<Option<String>> {
        self.log()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Validation(widget, message) if widget == id => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn view(&self, id: usize) -> Option<WidgetView> {
        self.log().into_iter().find_map(|event| match event {
            HostEvent::Updated(widget, view) if widget == id => Some(view),
            _ => None,
        })
    }
}

impl InputHost for ScriptedHost {
    fn create_widget(&self, kind: WidgetKind) -> Result<Box<dyn InputWidget>, AuthError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        self.log.lock().unwrap().push(HostEvent::Created(id, kind));
        Ok(Box::new(ScriptedWidget {
            id,
            script,
            sender: None,
            log: Arc::clone(&self.log),
            disposed: false,
        }))
    }
}

struct ScriptedWidget {
    id: usize,
    script: Vec<WidgetEvent>,
    sender: Option<mpsc::UnboundedSender<WidgetEvent>>,
    log: Arc<Mutex<Vec<HostEvent>>>,
    disposed: bool,
}

impl ScriptedWidget {
    fn record(&self, event: HostEvent) {
        self.log.lock().unwrap().push(event);
    }
}

impl InputWidget for ScriptedWidget {
    fn update(&mut self, view: &WidgetView) {
        self.record(HostEvent::Updated(self.id, view.clone()));
    }

    fn set_validation_message(&mut self, message: Option<&str>) {
        self.record(HostEvent::Validation(self.id, message.map(str::to_string)));
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.record(HostEvent::Enabled(self.id, enabled));
    }

    fn set_busy(&mut self, busy: bool) {
        self.record(HostEvent::Busy(self.id, busy));
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<WidgetEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sender = Some(sender);
        receiver
    }

    fn show(&mut self) {
        self.record(HostEvent::Shown(self.id));
        if let Some(sender) = &self.sender {
            for event in self.script.drain(..) {
                let _ = sender.send(event);
            }
        }
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.sender = None;
            self.record(HostEvent::Disposed(self.id));
        }
    }
}

/// Environment that records opened URLs instead of launching a browser.
pub struct FakeEnvironment {
    opened: Mutex<Vec<Url>>,
    notify: Notify,
    open_ok: bool,
}

impl FakeEnvironment {
    pub fn new(open_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            opened: Mutex::new(Vec::new()),
            notify: Notify::new(),
            open_ok,
        })
    }

    pub async fn wait_opened(&self) {
        self.notify.notified().await;
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Environment for FakeEnvironment {
    async fn as_external_uri(&self, uri: Url) -> Result<Url, AuthError> {
        Ok(uri)
    }

    fn open_external(&self, url: &Url) -> bool {
        self.opened.lock().unwrap().push(url.clone());
        self.notify.notify_one();
        self.open_ok
    }
}

/// Real URL building, canned token exchange.
pub struct FakeClient {
    inner: HttpOAuth2Client,
    exchanges: Mutex<Vec<(String, String, String)>>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HttpOAuth2Client::new(
                "test-client",
                "https://provider.test/authorize",
                "https://provider.test/token",
            ),
            exchanges: Mutex::new(Vec::new()),
        })
    }

    pub fn exchanges(&self) -> Vec<(String, String, String)> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl OAuth2Client for FakeClient {
    fn generate_code_verifier(&self) -> PkcePair {
        PkcePair {
            verifier: TEST_VERIFIER.to_string(),
            challenge: utils::generate_code_challenge(TEST_VERIFIER),
        }
    }

    fn generate_auth_url(&self, options: &AuthUrlOptions) -> Result<Url, AuthError> {
        self.inner.generate_auth_url(options)
    }

    async fn get_token(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<Token, AuthError> {
        self.exchanges.lock().unwrap().push((
            code.to_string(),
            verifier.to_string(),
            redirect_uri.to_string(),
        ));
        Ok(Token {
            access_token: format!("token-{}", code),
            refresh_token: None,
            scope: String::new(),
            expires_in: 3600,
            obtained_at: 0,
        })
    }
}

pub fn build_flow(
    registry: &NonceCodeRegistry,
    client: Arc<FakeClient>,
    environment: Arc<FakeEnvironment>,
    host: Option<Arc<ScriptedHost>>,
) -> AuthorizationFlow {
    let flow = AuthorizationFlow::new(
        registry.clone(),
        client,
        environment,
        Url::parse(CALLBACK_URI).unwrap(),
        REDIRECT_URI,
    );
    match host {
        Some(host) => flow.with_manual_entry(host),
        None => flow,
    }
}

pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
