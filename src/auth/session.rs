//! Login sessions
//!
//! A successful login opens a session keyed by an opaque bearer token. Sessions
//! carry the username and role every gated handler checks. There is no expiry;
//! a session lives until logout or restart.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::entities::Role;
use crate::error::AppError;
use crate::AppState;

/// Identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl Session {
    /// Role gate. The message is what the caller sees on a mismatch.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            return Ok(());
        }
        warn!(username = %self.username, role = %self.role, required = %role, "role check failed");
        let audience = match role {
            Role::Farmer => "farmers",
            Role::Contributor => "contributors",
            Role::Admin => "admins",
        };
        Err(AppError::Forbidden(format!(
            "This section is only accessible to {}.",
            audience
        )))
    }
}

/// In-memory session store
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for a user
    pub fn open(&self, username: &str, role: Role) -> Session {
        let session = Session {
            token: format!("sess_{}", uuid::Uuid::new_v4().simple()),
            username: username.to_string(),
            role,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        info!(username, %role, active = self.len(), "opened session");
        session
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.clone())
    }

    /// Close a session. Returns false when the token was unknown.
    pub fn close(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                debug!(username = %session.username, active = self.len(), "closed session");
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for Session
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions: Arc<SessionStore> = AppState::from_ref(state).sessions;

        let Some(token) = bearer_token(parts) else {
            warn!("request without a session");
            return Err(AppError::Unauthenticated("Please log in to access this section.".to_string()));
        };

        sessions.get(token).ok_or_else(|| {
            warn!("request with an unknown session token");
            AppError::Unauthenticated("Session not found. Please log in again.".to_string())
        })
    }
}
