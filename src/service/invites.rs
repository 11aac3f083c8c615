use crate::auth::{Caller, EventRole, InviteClaims, InviteToken};
use crate::error::ApiError;
use crate::service::{field, require_identity, Hackboard};
use crate::EventId;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Body of `POST /api/invite/generate`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInviteRequest {
    pub event_id: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteLink {
    pub invite_link: String,
    pub event_name: String,
    pub role: EventRole,
    /// The bound email, or `"anyone"`
    pub email: String,
    pub expires_in: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteAcceptance {
    pub event_id: EventId,
    /// The caller's role in the event after accepting
    pub role: EventRole,
    /// False when an equal or higher role was already held
    pub changed: bool,
}

impl GenerateInviteRequest {
    /// The event id and role, checked before the caller is looked at
    pub fn validate(&self) -> Result<(&str, EventRole), ApiError> {
        let (Some(event_id), Some(role)) = (field(&self.event_id), field(&self.role)) else {
            return Err(ApiError::validation(
                "Missing required parameters: eventId and role",
            ));
        };

        let role = EventRole::parse(role)
            .ok_or_else(|| ApiError::validation("Invalid role. Must be a valid EventRole."))?;

        Ok((event_id, role))
    }
}

/// `1d`, `12h`, `90m` or `45s`
fn ttl_label(ttl: Duration) -> String {
    let secs = ttl.num_seconds();
    if secs > 0 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs > 0 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

impl Hackboard {
    /// Create an invite link for an event role.
    ///
    /// The caller's event-scoped role must be `organizer` or `admin`. The role
    /// check runs before the event lookup, so callers without rights on an
    /// id cannot learn whether it exists.
    pub async fn generate_invite(
        &self,
        caller: &Caller,
        request: GenerateInviteRequest,
    ) -> Result<InviteLink, ApiError> {
        let (event_id, role) = request.validate()?;

        let identity = require_identity(caller, "You must be authenticated to generate invites")?;
        let caller_email = identity
            .email
            .as_deref()
            .ok_or_else(|| ApiError::authentication("You must be authenticated to generate invites"))?;

        let profile = self
            .store
            .profile_by_email(caller_email)
            .await
            .map_err(|e| {
                error!(user_id = %identity.user_id, error = %e, "Failed to fetch user profile");
                ApiError::upstream("Error checking user permissions", e)
            })?
            .ok_or_else(|| {
                warn!(user_id = %identity.user_id, "User profile not found");
                ApiError::not_found("User profile not found")
            })?;

        let caller_role = self
            .store
            .role_for(&profile.uid, event_id)
            .await
            .map_err(|e| {
                error!(user_id = %profile.uid, event_id = %event_id, error = %e, "Failed to fetch user role");
                ApiError::upstream("Error checking user permissions", e)
            })?;

        if !caller_role.is_some_and(|r| r.can_manage_event()) {
            debug!(user_id = %profile.uid, event_id = %event_id, role = ?caller_role, "Invite refused");
            return Err(ApiError::authorization(
                "Insufficient permissions to generate invites",
            ));
        }

        let event = self
            .store
            .get_event(event_id)
            .await
            .map_err(|e| {
                error!(event_id = %event_id, error = %e, "Failed to fetch event");
                ApiError::upstream("Failed to generate invite link", e)
            })?
            .ok_or_else(|| {
                warn!(user_id = %profile.uid, event_id = %event_id, "Event not found");
                ApiError::not_found("Event not found")
            })?;

        let bound_email = field(&request.email).map(str::to_string);
        let claims = InviteClaims {
            event_id: event.id.clone(),
            role,
            email: bound_email.clone(),
            exp: (Utc::now() + self.config.invite_ttl).timestamp(),
        };
        let token = InviteToken::create(claims, &self.config.invite_secret);

        info!(user_id = %profile.uid, event_id = %event.id, role = %role, "Generated invite link");

        Ok(InviteLink {
            invite_link: format!("{}/invite?token={}", self.config.base_url, token),
            event_name: event.name,
            role,
            email: bound_email.unwrap_or_else(|| "anyone".to_string()),
            expires_in: ttl_label(self.config.invite_ttl),
        })
    }

    /// Redeem an invite for the calling user.
    ///
    /// An existing role is only replaced by a higher-priority one.
    pub async fn accept_invite(
        &self,
        caller: &Caller,
        token: Option<&str>,
    ) -> Result<InviteAcceptance, ApiError> {
        let identity = require_identity(caller, "You must be signed in to accept an invite")?;

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::validation("Missing invite token"))?;

        let invite = InviteToken::parse(token, &self.config.invite_secret, Utc::now()).map_err(|e| {
            debug!(user_id = %identity.user_id, error = %e, "Rejected invite token");
            ApiError::validation("Invalid or expired invite link")
        })?;
        let claims = invite.claims();

        if let Some(invited_email) = &claims.email {
            let profile = self
                .store
                .profile_by_id(&identity.user_id)
                .await
                .map_err(|e| {
                    error!(user_id = %identity.user_id, error = %e, "Failed to fetch user profile");
                    ApiError::upstream("Error retrieving user data", e)
                })?
                .ok_or_else(|| ApiError::not_found("User profile not found"))?;

            if !profile.email.eq_ignore_ascii_case(invited_email) {
                return Err(ApiError::authorization(
                    "This invite link is for a different email address",
                ));
            }
        }

        self.store
            .get_event(&claims.event_id)
            .await
            .map_err(|e| {
                error!(event_id = %claims.event_id, error = %e, "Failed to fetch event");
                ApiError::upstream("Error processing invite", e)
            })?
            .ok_or_else(|| {
                warn!(user_id = %identity.user_id, event_id = %claims.event_id, "Event not found");
                ApiError::not_found("Event not found")
            })?;

        let (role, changed) = self
            .store
            .raise_role(&identity.user_id, &claims.event_id, claims.role)
            .await
            .map_err(|e| {
                error!(user_id = %identity.user_id, event_id = %claims.event_id, error = %e, "Failed to assign role");
                ApiError::upstream("Error assigning role", e)
            })?;

        if changed {
            info!(
                user_id = %identity.user_id,
                event_id = %claims.event_id,
                role = %role,
                "Accepted invite"
            );
        } else {
            debug!(
                user_id = %identity.user_id,
                event_id = %claims.event_id,
                current = %role,
                invited = %claims.role,
                "Invite does not raise role"
            );
        }

        Ok(InviteAcceptance {
            event_id: claims.event_id.clone(),
            role,
            changed,
        })
    }
}
