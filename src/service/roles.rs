use crate::auth::{hash_password, verify_password, Caller, EventRole};
use crate::error::ApiError;
use crate::service::{field, require_identity, Hackboard};
use crate::storage::StorageError;
use crate::EventId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Body of `POST /api/roles/set-password` and `POST /api/roles/verify`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePasswordRequest {
    pub event_id: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleVerification {
    pub event_id: EventId,
    pub role: EventRole,
}

impl RolePasswordRequest {
    /// Event, protected role and password for setting a role password
    pub fn validate_for_set(&self) -> Result<(&str, EventRole, &str), ApiError> {
        let (Some(event_id), Some(role), Some(password)) = (
            field(&self.event_id),
            field(&self.role),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(ApiError::validation("Missing required fields"));
        };

        let role = EventRole::parse(role)
            .filter(EventRole::is_protected)
            .ok_or_else(|| ApiError::validation("Invalid role"))?;

        Ok((event_id, role, password))
    }

    /// Event and raw role name for claiming a role. The name is parsed
    /// after the caller is known.
    pub fn validate_for_verify(&self) -> Result<(&str, &str), ApiError> {
        match (field(&self.event_id), field(&self.role)) {
            (Some(event_id), Some(role)) => Ok((event_id, role)),
            _ => Err(ApiError::validation("Missing required fields")),
        }
    }
}

impl Hackboard {
    /// Set the shared password that unlocks `judge` or `organizer` in an event
    pub async fn set_role_password(
        &self,
        caller: &Caller,
        request: RolePasswordRequest,
    ) -> Result<(), ApiError> {
        let (event_id, role, password) = request.validate_for_set()?;

        let identity = require_identity(caller, "Unauthorized")?;

        let caller_role = self
            .store
            .role_for(&identity.user_id, event_id)
            .await
            .map_err(|e| {
                error!(user_id = %identity.user_id, event_id = %event_id, error = %e, "Failed to fetch user role");
                ApiError::upstream("Failed to set password", e)
            })?;

        if !caller_role.is_some_and(|r| r.can_manage_event()) {
            warn!(user_id = %identity.user_id, event_id = %event_id, "Role password change refused");
            return Err(ApiError::authorization("Unauthorized"));
        }

        let hash = hash_password(password, self.config.password_rounds);

        self.store
            .upsert_role_password(event_id, role, &hash)
            .await
            .map_err(|e| {
                error!(event_id = %event_id, role = %role, error = %e, "Failed to store role password");
                ApiError::upstream("Failed to set password", e)
            })?;

        info!(user_id = %identity.user_id, event_id = %event_id, role = %role, "Role password set");
        Ok(())
    }

    /// Claim a role in an event for the calling user.
    ///
    /// `judge` and `organizer` need the event's role password; `participant`
    /// and `mentor` are open. `admin` is never self-assigned.
    pub async fn verify_role(
        &self,
        caller: &Caller,
        request: RolePasswordRequest,
    ) -> Result<RoleVerification, ApiError> {
        let (event_id, role) = request.validate_for_verify()?;

        let identity = require_identity(caller, "Unauthorized")?;

        let role = match EventRole::parse(role) {
            Some(EventRole::Admin) | None => return Err(ApiError::validation("Invalid role")),
            Some(role) => role,
        };

        self.store
            .get_event(event_id)
            .await
            .map_err(|e| {
                error!(event_id = %event_id, error = %e, "Failed to fetch event");
                ApiError::upstream("Failed to verify role", e)
            })?
            .ok_or_else(|| ApiError::not_found("Event not found"))?;

        if role.is_protected() {
            let password = request
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ApiError::validation("Password required for this role"))?;

            let stored = self
                .store
                .role_password_hash(event_id, role)
                .await
                .map_err(|e| {
                    error!(event_id = %event_id, role = %role, error = %e, "Failed to fetch role password");
                    ApiError::upstream("Failed to verify password", e)
                })?
                .ok_or_else(|| ApiError::not_found("No password set for this role"))?;

            let matches = verify_password(password, &stored).map_err(|e| {
                error!(event_id = %event_id, role = %role, error = %e, "Stored role password is unreadable");
                ApiError::upstream(
                    "Failed to verify password",
                    StorageError::Serialization(e.to_string()),
                )
            })?;

            if !matches {
                debug!(user_id = %identity.user_id, event_id = %event_id, role = %role, "Wrong role password");
                return Err(ApiError::authentication("Invalid password"));
            }
        }

        self.store
            .upsert_role(&identity.user_id, event_id, role)
            .await
            .map_err(|e| {
                error!(user_id = %identity.user_id, event_id = %event_id, error = %e, "Failed to assign role");
                ApiError::upstream("Failed to assign role", e)
            })?;

        info!(user_id = %identity.user_id, event_id = %event_id, role = %role, "Role assigned");

        Ok(RoleVerification {
            event_id: event_id.to_string(),
            role,
        })
    }
}
