//! Authentication and authorization
//!
//! Token types:
//! - `sess-` prefix: Signed session tokens naming the calling user
//! - `inv-` prefix: Signed event invites carrying a role and optional email
//! - Project invite hashes: truncated SHA-256 bearer values for team joins
//!
//! Roles are scoped to a single event. Global admin status is separate and
//! comes from an injected [`AdminPolicy`].

mod caller;
mod password;
mod roles;
mod tokens;

pub use caller::{AdminPolicy, AllowListPolicy, Caller, Identity, UserProfile};
pub use password::{hash_password, verify_password, PasswordError, DEFAULT_ROUNDS};
pub use roles::{EventRole, RoleSet, UnknownRole, UserEventRole};
pub use tokens::{
    project_invite_hash, validate_project_invite_hash, InviteClaims, InviteToken, Secret,
    SessionClaims, SessionToken, TokenError, INVITE_TOKEN_PREFIX, PROJECT_INVITE_HASH_LEN,
    SESSION_TOKEN_PREFIX,
};
