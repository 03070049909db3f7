//! Process-wide map from session channel to session state.

use crate::{ChannelId, Session};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Shared session store.
///
/// Cloning yields another handle to the same map. Entries are only mutated
/// through [`update`](Self::update), which runs a synchronous closure under
/// the write lock, so no lock is ever held across a platform call.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<ChannelId, Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session under its channel.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the channel already has a session.
    #[instrument(skip(self, session), fields(channel = %session.channel()))]
    pub async fn insert(&self, session: Session) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let channel = *session.channel();
        if sessions.contains_key(&channel) {
            return Err(SessionError::new(SessionErrorKind::InvalidState(format!(
                "channel {} already hosts a session",
                channel
            ))));
        }
        sessions.insert(channel, session);
        info!(active = sessions.len(), "Session registered");
        Ok(())
    }

    /// Snapshot of a session.
    pub async fn get(&self, channel: ChannelId) -> Option<Session> {
        self.sessions.read().await.get(&channel).cloned()
    }

    /// Whether the channel hosts a session.
    pub async fn contains(&self, channel: ChannelId) -> bool {
        self.sessions.read().await.contains_key(&channel)
    }

    /// Apply a state transition to one session.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSession` if the channel has no session, or whatever
    /// error the transition itself returns.
    pub async fn update<T, F>(&self, channel: ChannelId, transition: F) -> SessionResult<T>
    where
        F: FnOnce(&mut Session) -> SessionResult<T>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&channel).ok_or_else(|| {
            SessionError::new(SessionErrorKind::UnknownSession(channel.get()))
        })?;
        transition(session)
    }

    /// Remove a session, returning it if it was still registered.
    ///
    /// Exactly one caller observes `Some` for a given session.
    #[instrument(skip(self))]
    pub async fn remove(&self, channel: ChannelId) -> Option<Session> {
        let removed = self.sessions.write().await.remove(&channel);
        match &removed {
            Some(_) => info!("Session removed"),
            None => debug!("Session already removed"),
        }
        removed
    }

    /// Whether no session is active.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    fn session(channel: u64) -> Session {
        Session::new(
            ChannelId::new(channel),
            "writing-session-alice",
            UserId::new(1),
            vec![UserId::new(2)],
        )
    }

    #[tokio::test]
    async fn one_session_per_channel() {
        let registry = SessionRegistry::new();
        registry.insert(session(10)).await.expect("first insert");
        let err = registry.insert(session(10)).await.unwrap_err();
        assert!(matches!(err.kind, SessionErrorKind::InvalidState(_)));
        assert!(registry.get(ChannelId::new(10)).await.is_some());
    }

    #[tokio::test]
    async fn update_reports_unknown_sessions() {
        let registry = SessionRegistry::new();
        let err = registry
            .update(ChannelId::new(5), |s| s.set_prompt("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::UnknownSession(5));
    }

    #[tokio::test]
    async fn remove_succeeds_exactly_once() {
        let registry = SessionRegistry::new();
        registry.insert(session(10)).await.expect("insert");
        assert!(registry.remove(ChannelId::new(10)).await.is_some());
        assert!(registry.remove(ChannelId::new(10)).await.is_none());
        assert!(registry.is_empty().await);
    }
}
