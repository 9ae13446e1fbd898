//! Session provider.
//!
//! The current identity is published on a `watch` channel: the auth layer
//! holds a [`SessionHandle`] and updates it, the synchronizer follows a
//! receiver (see [`TodoSynchronizer::follow_session`]).
//!
//! [`TodoSynchronizer::follow_session`]: crate::TodoSynchronizer::follow_session

use crate::types::{OwnerId, Session};
use std::sync::Arc;
use tokio::sync::watch;

/// Publishes the current session
///
/// Clones publish to the same channel. Starts out loading.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionHandle {
    /// Creates a handle whose session is still loading
    #[must_use]
    pub fn new() -> Self {
        Self::with_session(Session::loading())
    }

    /// Creates a handle with an initial session
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx: Arc::new(tx) }
    }

    /// Current session
    #[must_use]
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Mark the identity as being resolved
    pub fn begin_loading(&self) {
        self.publish(Session {
            user_id: self.current().user_id,
            is_loading: true,
        });
    }

    /// Publish a signed-in user
    pub fn sign_in(&self, user_id: OwnerId) {
        self.publish(Session::signed_in(user_id));
    }

    /// Publish an anonymous session
    pub fn sign_out(&self) {
        self.publish(Session::signed_out());
    }

    fn publish(&self, session: Session) {
        tracing::debug!(
            user_id = ?session.user_id,
            is_loading = session.is_loading,
            "Session changed"
        );
        // Keeps the value even when nobody is subscribed yet
        self.tx.send_replace(session);
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading() {
        let handle = SessionHandle::new();
        assert_eq!(handle.current(), Session::loading());
    }

    #[test]
    fn sign_in_and_out_without_subscribers() {
        let handle = SessionHandle::new();
        let user = OwnerId::new();

        handle.sign_in(user);
        assert_eq!(handle.current(), Session::signed_in(user));

        handle.begin_loading();
        assert_eq!(
            handle.current(),
            Session {
                user_id: Some(user),
                is_loading: true
            }
        );

        handle.sign_out();
        assert_eq!(handle.current(), Session::signed_out());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let handle = SessionHandle::new();
        let mut rx = handle.subscribe();
        let user = OwnerId::new();

        handle.clone().sign_in(user);

        assert!(rx.changed().await.is_ok());
        assert_eq!(rx.borrow_and_update().user_id, Some(user));
    }
}
