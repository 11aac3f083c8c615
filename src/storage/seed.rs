//! Fixture data for `serve --seed`

use crate::auth::{UserEventRole, UserProfile};
use crate::events::Event;
use crate::storage::{DataStore, StorageError};
use serde::Deserialize;
use tracing::info;

/// Events, profiles and role rows to load into an empty store. Role rows
/// must name an event from the same file.
///
/// ```json
/// {
///   "events": [{"event_id": "e1", "event_name": "Spring Hack",
///               "event_date": "2025-06-01T09:00:00Z", "visibility": "public"}],
///   "profiles": [{"uid": "org", "email": "org@example.com"}],
///   "roles": [{"user_id": "org", "event_id": "e1", "role": "organizer"}]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    #[serde(default)]
    pub roles: Vec<UserEventRole>,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let seed: Seed =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(row) = seed
            .roles
            .iter()
            .find(|row| !seed.events.iter().any(|e| e.id == row.event_id))
        {
            return Err(StorageError::NotFound(format!(
                "role for {} names unknown event {}",
                row.user_id, row.event_id
            )));
        }

        Ok(seed)
    }

    /// Write everything through the store. Events go first so role rows
    /// always reference an existing event.
    pub async fn apply(&self, store: &dyn DataStore) -> Result<(), StorageError> {
        for event in &self.events {
            store.put_event(event).await?;
        }
        for profile in &self.profiles {
            store.upsert_profile(profile).await?;
        }
        for row in &self.roles {
            store.upsert_role(&row.user_id, &row.event_id, row.role).await?;
        }

        info!(
            events = self.events.len(),
            profiles = self.profiles.len(),
            roles = self.roles.len(),
            "Seeded store"
        );
        Ok(())
    }
}
