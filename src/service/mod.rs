//! Request operations
//!
//! [`Hackboard`] holds everything a request needs: the data store, the
//! global admin policy and the signing secrets. Handlers pass it a resolved
//! [`Caller`]; nothing here reads globals or keeps per-request state.

mod events;
mod invites;
mod projects;
mod reviews;
mod roles;

pub use invites::{GenerateInviteRequest, InviteAcceptance, InviteLink};
pub use roles::{RolePasswordRequest, RoleVerification};

use crate::auth::{AdminPolicy, Caller, Identity, Secret, SessionToken, DEFAULT_ROUNDS};
use crate::error::ApiError;
use crate::storage::DataStore;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Secrets and tunables for the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Signs session tokens
    pub session_secret: Secret,
    /// Signs event invites and project invite hashes
    pub invite_secret: Secret,
    /// Public origin used to build links, without trailing slash
    pub base_url: String,
    pub invite_ttl: Duration,
    pub password_rounds: u32,
}

impl ServiceConfig {
    pub fn new(session_secret: Secret, invite_secret: Secret, base_url: impl Into<String>) -> Self {
        Self {
            session_secret,
            invite_secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            invite_ttl: Duration::days(1),
            password_rounds: DEFAULT_ROUNDS,
        }
    }

    pub fn invite_ttl(mut self, ttl: Duration) -> Self {
        self.invite_ttl = ttl;
        self
    }

    pub fn password_rounds(mut self, rounds: u32) -> Self {
        self.password_rounds = rounds;
        self
    }
}

/// The service behind every HTTP route
pub struct Hackboard {
    store: Arc<dyn DataStore>,
    admins: Arc<dyn AdminPolicy>,
    config: ServiceConfig,
}

impl Hackboard {
    pub fn new(store: Arc<dyn DataStore>, admins: Arc<dyn AdminPolicy>, config: ServiceConfig) -> Self {
        Self {
            store,
            admins,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Turn an optional bearer token into a caller.
    ///
    /// No token means anonymous; a token that fails verification is an
    /// authentication error rather than a silent downgrade.
    pub fn resolve_caller(&self, bearer: Option<&str>) -> Result<Caller, ApiError> {
        let Some(token) = bearer else {
            return Ok(Caller::Anonymous);
        };

        let session = SessionToken::parse(token, &self.config.session_secret, Utc::now())
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ApiError::authentication("Invalid or expired session")
            })?;

        let is_global_admin = self.admins.is_global_admin(session.user_id());

        Ok(Caller::user(
            session.user_id(),
            session.email().map(str::to_string),
            is_global_admin,
        ))
    }

    /// Issue a session token for a user
    pub fn issue_session(&self, user_id: &str, email: Option<String>, ttl: Duration) -> SessionToken {
        SessionToken::issue(user_id, email, ttl, Utc::now(), &self.config.session_secret)
    }
}

fn require_identity<'a>(caller: &'a Caller, message: &str) -> Result<&'a Identity, ApiError> {
    caller
        .identity()
        .ok_or_else(|| ApiError::authentication(message))
}

/// Trimmed, non-empty value of an optional request field
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
