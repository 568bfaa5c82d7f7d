//! Authentication state shared by the API client and anything that needs to
//! react to sign-in or sign-out.
//!
//! A [`Session`] is a cheap handle; clones observe and mutate the same state.
//! Changes are published on a `tokio::sync::broadcast` channel so listeners
//! (a cart view reloading after login, for example) do not poll.

use std::sync::{Arc, PoisonError, RwLock};

use shopfront_core::Credentials;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { role: String },
    SignedOut,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    credentials: RwLock<Option<Credentials>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// An anonymous session.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                credentials: RwLock::new(None),
                events,
            }),
        }
    }

    /// A session that starts signed in with `token` and no known role.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        *session
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Credentials {
            token: token.into(),
            role: String::new(),
        });
        session
    }

    pub fn set(&self, credentials: Credentials) {
        let role = credentials.role.clone();
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        tracing::info!(role = %role, "session signed in");
        // No receivers is fine.
        let _ = self.inner.events.send(SessionEvent::SignedIn { role });
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.token.clone())
    }

    #[must_use]
    pub fn role(&self) -> Option<String> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.role.clone())
            .filter(|r| !r.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drops the credentials. Publishes `SignedOut` only if there were any.
    pub fn clear(&self) {
        let previous = self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            tracing::info!("session cleared");
            let _ = self.inner.events.send(SessionEvent::SignedOut);
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("role", &self.role())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(token: &str, role: &str) -> Credentials {
        Credentials {
            token: token.to_owned(),
            role: role.to_owned(),
        }
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        assert!(!other.is_authenticated());

        session.set(credentials("abc", "customer"));
        assert_eq!(other.token().as_deref(), Some("abc"));
        assert_eq!(other.role().as_deref(), Some("customer"));

        other.clear();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn empty_role_reads_as_none() {
        let session = Session::with_token("abc");
        assert!(session.is_authenticated());
        assert!(session.role().is_none());
    }

    #[test]
    fn debug_does_not_print_token() {
        let session = Session::with_token("super-secret");
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("authenticated: true"));
    }

    #[tokio::test]
    async fn publishes_sign_in_and_out() {
        let session = Session::new();
        let mut events = session.subscribe();

        session.set(credentials("abc", "admin"));
        session.clear();
        // Second clear has nothing to drop and stays silent.
        session.clear();

        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedIn {
                role: "admin".to_owned()
            }
        );
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
        assert!(events.try_recv().is_err());
    }
}
