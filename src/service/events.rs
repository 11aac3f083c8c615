use crate::auth::{Caller, RoleSet};
use crate::error::ApiError;
use crate::events::{visible_events, EventView};
use crate::service::Hackboard;
use tracing::{debug, error};

impl Hackboard {
    /// Events visible to `caller`, ordered by date, each with the caller's role
    pub async fn list_events(&self, caller: &Caller) -> Result<Vec<EventView>, ApiError> {
        let roles: RoleSet = match caller.identity() {
            None => RoleSet::new(),
            Some(identity) => self
                .store
                .roles_for_user(&identity.user_id)
                .await
                .map_err(|e| {
                    error!(user_id = %identity.user_id, error = %e, "Failed to fetch user roles");
                    ApiError::upstream("Failed to fetch events", e)
                })?
                .into_iter()
                .collect(),
        };

        let candidates = self.store.list_events().await.map_err(|e| {
            error!(user_id = ?caller.user_id(), error = %e, "Failed to fetch events");
            ApiError::upstream("Failed to fetch events", e)
        })?;

        let total = candidates.len();
        let views = visible_events(caller, &roles, candidates);

        debug!(
            user_id = ?caller.user_id(),
            total,
            visible = views.len(),
            "Listed events"
        );

        Ok(views)
    }
}
