use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::oneshot, task::AbortHandle};
use tokio_util::sync::CancellationToken;

use crate::error::AuthError;

/// Ceiling from registration to rejection when no code arrives.
pub const CODE_TIMEOUT: Duration = Duration::from_secs(60);

type Settlement = Result<String, AuthError>;

struct PendingRequest {
    id: u64,
    sender: oneshot::Sender<Settlement>,
    timer: Option<AbortHandle>,
}

impl PendingRequest {
    fn settle(mut self, result: Settlement) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        // The waiter may already be gone; nothing left to notify then.
        let _ = self.sender.send(result);
    }
}

/// Table of in-flight login attempts keyed by nonce.
///
/// Whichever of {resolve, reject, timeout, cancellation} reaches an entry first
/// removes it and settles the waiter; every later attempt finds nothing and is
/// a no-op. Cloning yields another handle to the same table.
#[derive(Clone)]
pub struct NonceCodeRegistry {
    pending: Arc<Mutex<HashMap<String, PendingRequest>>>,
    next_id: Arc<AtomicU64>,
    timeout: Duration,
}

impl Default for NonceCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceCodeRegistry {
    pub fn new() -> Self {
        Self::with_timeout(CODE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registers a pending request for `nonce` and arms its timeout.
    ///
    /// The returned [`PendingCode`] is the only way to observe the outcome.
    /// Dropping it withdraws the registration, so a later delivery for the
    /// same nonce becomes a no-op.
    ///
    /// Must be called inside a tokio runtime; the timeout runs as a spawned
    /// task that is aborted as soon as the request settles.
    ///
    /// # Arguments
    ///
    /// * `nonce` - One-time token identifying the login attempt
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateNonce`] when the nonce is already pending.
    ///
    /// # Example
    ///
    /// ```
    /// let registry = NonceCodeRegistry::new();
    /// let pending = registry.register("n1")?;
    ///
    /// registry.resolve_code("n1", "42");
    /// assert_eq!(pending.wait(&CancellationToken::new()).await?, "42");
    /// ```
    pub fn register(&self, nonce: &str) -> Result<PendingCode, AuthError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();

        {
            let mut table = self.table();
            if table.contains_key(nonce) {
                return Err(AuthError::DuplicateNonce(nonce.to_string()));
            }
            table.insert(
                nonce.to_string(),
                PendingRequest {
                    id,
                    sender,
                    timer: None,
                },
            );
        }

        let registry = self.clone();
        let timer_nonce = nonce.to_string();
        let timeout = self.timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            registry.settle_registration(&timer_nonce, id, Err(AuthError::Timeout(timeout)));
        })
        .abort_handle();

        match self.table().get_mut(nonce) {
            Some(entry) if entry.id == id => entry.timer = Some(timer),
            // Already settled in between; the timer has nothing left to guard.
            _ => timer.abort(),
        }

        Ok(PendingCode {
            registry: self.clone(),
            nonce: nonce.to_string(),
            id,
            receiver: Some(receiver),
        })
    }

    /// Registers `nonce` and waits for its code.
    pub async fn wait_for_code(
        &self,
        nonce: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        self.register(nonce)?.wait(cancel).await
    }

    /// Delivers `code` to the request pending for `nonce`.
    ///
    /// Returns `false` when nothing is pending: late or duplicate deliveries
    /// from racing channels are tolerated silently.
    pub fn resolve_code(&self, nonce: &str, code: &str) -> bool {
        self.settle(nonce, Ok(code.to_string()))
    }

    /// Rejects the request pending for `nonce`. Same no-op rule as [`Self::resolve_code`].
    pub fn reject_code(&self, nonce: &str, error: AuthError) -> bool {
        self.settle(nonce, Err(error))
    }

    pub fn is_pending(&self, nonce: &str) -> bool {
        self.table().contains_key(nonce)
    }

    pub fn pending_count(&self) -> usize {
        self.table().len()
    }

    fn settle(&self, nonce: &str, result: Settlement) -> bool {
        // lookup and removal under one lock
        let entry = self.table().remove(nonce);
        match entry {
            Some(entry) => {
                entry.settle(result);
                true
            }
            None => false,
        }
    }

    fn settle_registration(&self, nonce: &str, id: u64, result: Settlement) -> bool {
        let entry = {
            let mut table = self.table();
            match table.get(nonce) {
                Some(entry) if entry.id == id => table.remove(nonce),
                _ => None,
            }
        };
        match entry {
            Some(entry) => {
                entry.settle(result);
                true
            }
            None => false,
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Waiter side of a registration. Dropping it withdraws the registration.
pub struct PendingCode {
    registry: NonceCodeRegistry,
    nonce: String,
    id: u64,
    receiver: Option<oneshot::Receiver<Settlement>>,
}

impl PendingCode {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Waits until the request settles.
    ///
    /// Cancelling `cancel` rejects the request with [`AuthError::Cancelled`]
    /// unless another settlement got there first, in which case that one is
    /// returned.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Result<String, AuthError> {
        let Some(mut receiver) = self.receiver.take() else {
            return Err(AuthError::Cancelled);
        };

        tokio::select! {
            biased;
            settled = &mut receiver => return settled.unwrap_or(Err(AuthError::Cancelled)),
            _ = cancel.cancelled() => {}
        }

        self.registry
            .settle_registration(&self.nonce, self.id, Err(AuthError::Cancelled));
        // A dropped sender means the entry vanished without settlement.
        receiver.await.unwrap_or(Err(AuthError::Cancelled))
    }
}

impl Drop for PendingCode {
    fn drop(&mut self) {
        // no-op when the request already settled
        self.registry
            .settle_registration(&self.nonce, self.id, Err(AuthError::Cancelled));
    }
}
