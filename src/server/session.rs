//! Per-browser upload sessions
//!
//! Each browser holds an opaque id in the `dash_session` cookie; the server
//! keeps that browser's uploads in memory until the session idles past its TTL.

use axum::http::{header, HeaderMap};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::loader::Uploads;

pub const SESSION_COOKIE: &str = "dash_session";

const SESSION_ID_BYTES: usize = 16;

struct Session {
    uploads: Uploads,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Snapshot of a session's uploads; unknown or expired ids have none
    pub fn uploads(&self, id: &str) -> Uploads {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(id) {
            Some(session) if session.last_seen.elapsed() <= self.ttl => {
                session.last_seen = Instant::now();
                session.uploads.clone()
            }
            Some(_) => {
                sessions.remove(id);
                Uploads::default()
            }
            None => Uploads::default(),
        }
    }

    /// Apply `f` to a session's uploads, creating the session if needed
    pub fn update<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut Uploads),
    {
        let mut sessions = self.sessions.write();
        let session = sessions.entry(id.to_string()).or_insert_with(|| Session {
            uploads: Uploads::default(),
            last_seen: Instant::now(),
        });
        if session.last_seen.elapsed() > self.ttl {
            session.uploads = Uploads::default();
        }
        session.last_seen = Instant::now();
        f(&mut session.uploads);
    }

    /// Drop idle sessions, returning how many were removed
    pub fn prune(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen.elapsed() <= self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "Pruned idle sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

pub fn new_session_id() -> String {
    let bytes: [u8; SESSION_ID_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_session_id(value: &str) -> bool {
    value.len() == SESSION_ID_BYTES * 2 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Session id from the request's `Cookie` headers, if present and well-formed
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && is_session_id(value))
        .map(|(_, value)| value.to_string())
}

pub fn set_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
