//! In-memory storage backend

use crate::auth::{EventRole, UserEventRole, UserProfile};
use crate::events::Event;
use crate::projects::{Feedback, Project, ProjectScore};
use crate::storage::{
    EventStore, ProfileStore, ProjectStore, ReviewStore, RoleStore, StorageError,
};
use crate::{EventId, ProjectId, UserId};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
    roles: DashMap<(UserId, EventId), EventRole>,
    role_passwords: DashMap<(EventId, EventRole), String>,
    profiles: DashMap<UserId, UserProfile>,
    projects: DashMap<ProjectId, Project>,
    feedback: RwLock<Vec<Feedback>>,
    scores: DashMap<(ProjectId, UserId, String), ProjectScore>,
    /// When set every call fails with a database error
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, simulating a lost database
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Database("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>, StorageError> {
        self.check()?;
        let mut events = self.events.read().clone();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StorageError> {
        self.check()?;
        Ok(self.events.read().iter().find(|e| e.id == event_id).cloned())
    }

    async fn put_event(&self, event: &Event) -> Result<(), StorageError> {
        self.check()?;
        let mut events = self.events.write();
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => events.push(event.clone()),
        }
        debug!(event_id = %event.id, "Stored event");
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserEventRole>, StorageError> {
        self.check()?;
        Ok(self
            .roles
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| {
                let (user_id, event_id) = entry.key();
                UserEventRole::new(user_id.clone(), event_id.clone(), *entry.value())
            })
            .collect())
    }

    async fn role_for(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<EventRole>, StorageError> {
        self.check()?;
        Ok(self
            .roles
            .get(&(user_id.to_string(), event_id.to_string()))
            .map(|role| *role))
    }

    async fn upsert_role(
        &self,
        user_id: &str,
        event_id: &str,
        role: EventRole,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.roles
            .insert((user_id.to_string(), event_id.to_string()), role);
        debug!(user_id = %user_id, event_id = %event_id, role = %role, "Assigned role");
        Ok(())
    }

    async fn raise_role(
        &self,
        user_id: &str,
        event_id: &str,
        role: EventRole,
    ) -> Result<(EventRole, bool), StorageError> {
        self.check()?;
        // The entry guard holds the shard lock across compare and write
        match self.roles.entry((user_id.to_string(), event_id.to_string())) {
            Entry::Vacant(entry) => {
                entry.insert(role);
            }
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                if !role.outranks(current) {
                    return Ok((current, false));
                }
                entry.insert(role);
            }
        }
        debug!(user_id = %user_id, event_id = %event_id, role = %role, "Raised role");
        Ok((role, true))
    }

    async fn role_password_hash(
        &self,
        event_id: &str,
        role: EventRole,
    ) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self
            .role_passwords
            .get(&(event_id.to_string(), role))
            .map(|hash| hash.clone()))
    }

    async fn upsert_role_password(
        &self,
        event_id: &str,
        role: EventRole,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.role_passwords
            .insert((event_id.to_string(), role), password_hash.to_string());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, StorageError> {
        self.check()?;
        Ok(self
            .profiles
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn profile_by_id(&self, uid: &str) -> Result<Option<UserProfile>, StorageError> {
        self.check()?;
        Ok(self.profiles.get(uid).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.check()?;
        self.profiles.insert(profile.uid.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StorageError> {
        self.check()?;
        Ok(self.projects.get(project_id).map(|p| p.clone()))
    }

    async fn insert_project(&self, project: &Project) -> Result<(), StorageError> {
        self.check()?;
        self.projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn set_teammates(
        &self,
        project_id: &str,
        teammates: &[String],
    ) -> Result<(), StorageError> {
        self.check()?;
        let mut project = self
            .projects
            .get_mut(project_id)
            .ok_or_else(|| StorageError::NotFound(format!("Project not found: {}", project_id)))?;
        project.teammates = teammates.to_vec();
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError> {
        self.check()?;
        self.feedback.write().push(feedback.clone());
        Ok(())
    }

    async fn feedback_for_project(&self, project_id: &str) -> Result<Vec<Feedback>, StorageError> {
        self.check()?;
        let mut feedback: Vec<Feedback> = self
            .feedback
            .read()
            .iter()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect();
        feedback.sort_by_key(|f| f.created_at);
        Ok(feedback)
    }

    async fn upsert_score(&self, score: &ProjectScore) -> Result<(), StorageError> {
        self.check()?;
        self.scores.insert(
            (
                score.project_id.clone(),
                score.judge_id.clone(),
                score.track_id.clone(),
            ),
            score.clone(),
        );
        Ok(())
    }

    async fn scores_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectScore>, StorageError> {
        self.check()?;
        let mut scores: Vec<ProjectScore> = self
            .scores
            .iter()
            .filter(|entry| entry.key().0 == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        scores.sort_by(|a, b| {
            a.track_id
                .cmp(&b.track_id)
                .then_with(|| a.judge_id.cmp(&b.judge_id))
        });
        Ok(scores)
    }
}
