//! Session service - single source of truth for "am I logged in, as whom,
//! for which account"
//!
//! Durable storage is authoritative: every read goes back to storage, so a
//! session survives process restarts and is shared by concurrent processes.
//! Auth-state transitions are pushed to subscribers synchronously.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::result::{AuthError, Error, Result};
use crate::domain::{
    parse_account_id, Session, SessionEstablished, AUTH_TOKEN_KEY, CURRENT_ACCOUNT_KEY,
    SESSION_KEYS, USERNAME_KEY,
};
use crate::ports::{ApiRequest, SessionStorage, Transport};
use crate::services::interceptor::{basic_authorization, encode_credential, AUTHORIZATION};

/// Handle returned by `subscribe`, used to unsubscribe
pub type SubscriptionId = u64;

type Observer = Arc<dyn Fn(bool) + Send + Sync>;

/// Session store
pub struct SessionService {
    storage: Arc<dyn SessionStorage>,
    transport: Arc<dyn Transport>,
    probe_account_id: i64,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
    /// Last state pushed to observers
    published: Mutex<bool>,
}

impl SessionService {
    /// `probe_account_id` is the protected resource used to test credentials
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        transport: Arc<dyn Transport>,
        probe_account_id: i64,
    ) -> Self {
        let service = Self {
            storage,
            transport,
            probe_account_id,
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            published: Mutex::new(false),
        };
        let current = service.is_authenticated();
        if let Ok(mut published) = service.published.lock() {
            *published = current;
        }
        service
    }

    /// Verify credentials against the backend and persist them on success
    ///
    /// The probe carries the candidate credential explicitly and bypasses
    /// the interceptor, so a previously stored credential is never sent in
    /// its place. Nothing is written unless the probe returns 2xx.
    pub fn login(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<SessionEstablished, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let credential = encode_credential(username, password);
        let probe = ApiRequest::get(format!("/accounts/{}", self.probe_account_id))
            .with_header(AUTHORIZATION, basic_authorization(&credential));

        let response = self
            .transport
            .execute(probe)
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        match response.status {
            200..=299 => {}
            401 => return Err(AuthError::InvalidCredentials),
            status => return Err(AuthError::Unreachable(format!("HTTP {}", status))),
        }

        self.storage
            .set_all(&[(AUTH_TOKEN_KEY, credential.as_str()), (USERNAME_KEY, username)])
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        self.publish(true);

        Ok(SessionEstablished {
            username: username.to_string(),
        })
    }

    /// Clear credential, username and selected account in one write
    ///
    /// Idempotent: logging out of a logged-out session succeeds.
    pub fn logout(&self) -> Result<()> {
        self.storage.remove_all(&SESSION_KEYS)?;
        self.publish(false);
        Ok(())
    }

    /// Re-derived from storage on every call; unreadable storage means logged out
    pub fn is_authenticated(&self) -> bool {
        matches!(self.credential(), Ok(Some(_)))
    }

    /// The stored credential; an empty value counts as absent
    pub fn credential(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(AUTH_TOKEN_KEY)?
            .filter(|credential| !credential.is_empty()))
    }

    pub fn username(&self) -> Result<Option<String>> {
        self.storage.get(USERNAME_KEY)
    }

    pub fn current_account_id(&self) -> Result<Option<i64>> {
        Ok(self
            .storage
            .get(CURRENT_ACCOUNT_KEY)?
            .as_deref()
            .and_then(parse_account_id))
    }

    /// Select the active account; independent of the credential lifecycle
    pub fn set_current_account_id(&self, account_id: i64) -> Result<()> {
        self.storage
            .set(CURRENT_ACCOUNT_KEY, &account_id.to_string())
    }

    /// Snapshot of all stored session entries
    pub fn session(&self) -> Result<Session> {
        Ok(Session {
            credential: self.credential()?,
            username: self.username()?,
            current_account_id: self.current_account_id()?,
        })
    }

    /// Guard for protected operations
    pub fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::not_authenticated("no stored credential"))
        }
    }

    /// Guard for operations that act on the selected account
    pub fn require_account(&self) -> Result<i64> {
        self.require_authenticated()?;
        self.current_account_id()?
            .ok_or_else(|| Error::not_found("No account selected"))
    }

    /// Register an observer of auth-state transitions
    ///
    /// The observer is called right away with the current state, then on
    /// every transition. It runs on the thread that caused the transition.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let observer: Observer = Arc::new(observer);
        if let Ok(mut observers) = self.observers.lock() {
            observers.push((id, Arc::clone(&observer)));
        }
        observer(self.is_authenticated());
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.observers.lock() {
            Ok(mut observers) => {
                let before = observers.len();
                observers.retain(|(sub, _)| *sub != id);
                observers.len() != before
            }
            Err(_) => false,
        }
    }

    /// Notify observers when the state differs from the last one pushed
    fn publish(&self, authenticated: bool) {
        let changed = match self.published.lock() {
            Ok(mut published) => {
                let changed = *published != authenticated;
                *published = authenticated;
                changed
            }
            Err(_) => true,
        };
        if !changed {
            return;
        }

        // Call outside the lock so observers may subscribe or query freely
        let observers: Vec<Observer> = match self.observers.lock() {
            Ok(observers) => observers.iter().map(|(_, o)| Arc::clone(o)).collect(),
            Err(_) => return,
        };
        for observer in observers {
            observer(authenticated);
        }
    }
}
