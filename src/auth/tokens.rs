//! Token types and validation
//!
//! Token prefixes:
//! - `sess-` : Session token (user id + email, signed, expiring)
//! - `inv-`  : Event invite token (event + role + optional email, signed, expiring)
//!
//! Project invite hashes are a separate, unprefixed form: the first 16 hex
//! characters of `SHA-256(project_id ++ secret)`.

use crate::auth::roles::EventRole;
use crate::{EventId, UserId};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Token prefixes
pub const SESSION_TOKEN_PREFIX: &str = "sess-";
pub const INVITE_TOKEN_PREFIX: &str = "inv-";

/// Length of a project invite hash in hex characters
pub const PROJECT_INVITE_HASH_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid token prefix: expected '{expected}', got '{got}'")]
    InvalidPrefix { expected: String, got: String },

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token decode error: {0}")]
    DecodeError(String),

    #[error("token expired")]
    Expired,
}

/// Server-side signing secret
#[derive(Clone)]
pub struct Secret {
    key: Vec<u8>,
}

impl Secret {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn signature(payload_b64: &str, secret: &Secret) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload_b64.as_bytes());
    let sig = mac.finalize().into_bytes();
    URL_SAFE_NO_PAD.encode(&sig[..16]) // Use first 16 bytes
}

/// `<prefix><base64 json>.<base64 hmac>`
fn sign<T: Serialize>(prefix: &str, claims: &T, secret: &Secret) -> String {
    let payload_json = serde_json::to_vec(claims).expect("serialize claims");
    let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);
    let signature_b64 = signature(&payload_b64, secret);

    format!("{}{}.{}", prefix, payload_b64, signature_b64)
}

fn verify<T: DeserializeOwned>(prefix: &str, token: &str, secret: &Secret) -> Result<T, TokenError> {
    let content = token.strip_prefix(prefix).ok_or_else(|| TokenError::InvalidPrefix {
        expected: prefix.to_string(),
        got: token.chars().take(prefix.len()).collect(),
    })?;

    let (payload_b64, signature_b64) =
        content.split_once('.').ok_or(TokenError::InvalidFormat)?;

    if signature_b64.contains('.') {
        return Err(TokenError::InvalidFormat);
    }

    if !constant_time_eq(signature_b64, &signature(payload_b64, secret)) {
        return Err(TokenError::InvalidSignature);
    }

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| TokenError::DecodeError(e.to_string()))?;

    serde_json::from_slice(&payload_json).map_err(|e| TokenError::DecodeError(e.to_string()))
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: Option<String>,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// A signed session token presented as `Authorization: Bearer sess-...`
#[derive(Debug, Clone)]
pub struct SessionToken {
    token: String,
    claims: SessionClaims,
}

impl SessionToken {
    pub fn create(claims: SessionClaims, secret: &Secret) -> Self {
        let token = sign(SESSION_TOKEN_PREFIX, &claims, secret);
        Self { token, claims }
    }

    /// Issue a token valid for `ttl` from `now`
    pub fn issue(
        user_id: impl Into<UserId>,
        email: Option<String>,
        ttl: Duration,
        now: DateTime<Utc>,
        secret: &Secret,
    ) -> Self {
        let claims = SessionClaims {
            user_id: user_id.into(),
            email,
            exp: (now + ttl).timestamp(),
        };
        Self::create(claims, secret)
    }

    /// Parse, verify the signature and check expiry
    pub fn parse(token: &str, secret: &Secret, now: DateTime<Utc>) -> Result<Self, TokenError> {
        let claims: SessionClaims = verify(SESSION_TOKEN_PREFIX, token, secret)?;

        if claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.claims.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref()
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Claims carried by an event invite token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteClaims {
    pub event_id: EventId,
    pub role: EventRole,
    /// When set, only the user with this email may accept
    pub email: Option<String>,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// A signed, expiring invite to take a role in an event
#[derive(Debug, Clone)]
pub struct InviteToken {
    token: String,
    claims: InviteClaims,
}

impl InviteToken {
    pub fn create(claims: InviteClaims, secret: &Secret) -> Self {
        let token = sign(INVITE_TOKEN_PREFIX, &claims, secret);
        Self { token, claims }
    }

    pub fn parse(token: &str, secret: &Secret, now: DateTime<Utc>) -> Result<Self, TokenError> {
        let claims: InviteClaims = verify(INVITE_TOKEN_PREFIX, token, secret)?;

        if claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &InviteClaims {
        &self.claims
    }
}

impl fmt::Display for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Bearer hash for joining a project team
pub fn project_invite_hash(project_id: &str, secret: &Secret) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_id.as_bytes());
    hasher.update(secret.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(PROJECT_INVITE_HASH_LEN);
    digest
}

/// Recompute the hash for `project_id` and compare in constant time
pub fn validate_project_invite_hash(project_id: &str, hash: &str, secret: &Secret) -> bool {
    constant_time_eq(hash, &project_invite_hash(project_id, secret))
}
