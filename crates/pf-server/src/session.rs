//! Login sessions for the browser UI.
//!
//! Sessions are opaque UUID tokens held in memory with a fixed lifetime.
//! Restarting the server signs everyone out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Upper bound on session lifetime (ten years).
const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

/// An authenticated browser session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe token → session map.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    /// Create a store whose sessions live for `ttl_hours`.
    pub fn new(ttl_hours: u64) -> Self {
        let hours = i64::try_from(ttl_hours)
            .unwrap_or(i64::MAX)
            .clamp(1, MAX_TTL_HOURS);
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl: chrono::Duration::hours(hours),
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Open a new session for `username`.
    pub fn create(&self, username: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        tracing::info!(username, "Session created");
        session
    }

    /// Look up a live session. Expired entries are dropped on access.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|e| e.value().clone())?;
        if session.is_expired(Utc::now()) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    /// End a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                tracing::info!(username = %session.username, "Session revoked");
                true
            }
            None => false,
        }
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            if session.is_expired(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    fn insert_raw(&self, session: Session) {
        self.sessions.insert(session.token.clone(), session);
    }
}

/// Periodically purge expired sessions until `cancel` fires.
pub fn start_purge_task(
    store: SessionStore,
    every: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    store.purge_expired();
                }
                _ = cancel.cancelled() => break,
            }
        }
        tracing::debug!("Session purge task stopped");
    })
}
