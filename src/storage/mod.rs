//! Storage backends for Hackboard
//!
//! - Postgres: Durable storage for events, roles, profiles, projects and reviews
//! - Memory: In-process store for tests and local runs

mod memory;
mod postgres;
mod seed;

pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use seed::Seed;

use crate::auth::{EventRole, UserEventRole, UserProfile};
use crate::events::Event;
use crate::projects::{Feedback, Project, ProjectScore};
pub use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Event rows
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, ordered by event date then id
    async fn list_events(&self) -> Result<Vec<Event>, StorageError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StorageError>;

    /// Insert or replace an event
    async fn put_event(&self, event: &Event) -> Result<(), StorageError>;
}

/// Event-scoped role assignments and role passwords
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Every role row for a user, across all events
    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserEventRole>, StorageError>;

    /// The user's role in one event
    async fn role_for(&self, user_id: &str, event_id: &str)
        -> Result<Option<EventRole>, StorageError>;

    /// Set the user's role in an event, replacing any existing one
    async fn upsert_role(
        &self,
        user_id: &str,
        event_id: &str,
        role: EventRole,
    ) -> Result<(), StorageError>;

    /// Set the user's role in an event only if it outranks the current one.
    ///
    /// The compare and the write are a single step. Returns the role held
    /// afterwards and whether this call changed it.
    async fn raise_role(
        &self,
        user_id: &str,
        event_id: &str,
        role: EventRole,
    ) -> Result<(EventRole, bool), StorageError>;

    async fn role_password_hash(
        &self,
        event_id: &str,
        role: EventRole,
    ) -> Result<Option<String>, StorageError>;

    /// Set the password hash for (event, role); last writer wins
    async fn upsert_role_password(
        &self,
        event_id: &str,
        role: EventRole,
        password_hash: &str,
    ) -> Result<(), StorageError>;
}

/// User profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, StorageError>;

    async fn profile_by_id(&self, uid: &str) -> Result<Option<UserProfile>, StorageError>;

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;
}

/// Project rows
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StorageError>;

    async fn insert_project(&self, project: &Project) -> Result<(), StorageError>;

    /// Overwrite the teammate list; last writer wins
    async fn set_teammates(&self, project_id: &str, teammates: &[String])
        -> Result<(), StorageError>;
}

/// Mentor feedback and judge scores
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError>;

    /// Feedback on a project, oldest first
    async fn feedback_for_project(&self, project_id: &str) -> Result<Vec<Feedback>, StorageError>;

    /// Insert or replace the score keyed by (project, judge, track)
    async fn upsert_score(&self, score: &ProjectScore) -> Result<(), StorageError>;

    /// Scores on a project, ordered by track then judge
    async fn scores_for_project(&self, project_id: &str)
        -> Result<Vec<ProjectScore>, StorageError>;
}

/// Everything the service reads and writes
pub trait DataStore: EventStore + RoleStore + ProfileStore + ProjectStore + ReviewStore {}

impl<T> DataStore for T where T: EventStore + RoleStore + ProfileStore + ProjectStore + ReviewStore {}
