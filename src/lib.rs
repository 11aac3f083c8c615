//! Hackboard - hackathon event backend
//!
//! Event listings filtered by the caller's event-scoped roles, invite links
//! for event roles, role passwords, project submission and team joining,
//! mentor feedback and judge scoring,
//! served over HTTP on top of Postgres.

pub mod auth;
pub mod error;
pub mod events;
pub mod projects;
pub mod server;
pub mod service;
pub mod storage;

pub type EventId = String;
pub type UserId = String;
pub type ProjectId = String;

pub use auth::{AllowListPolicy, Caller, EventRole, RoleSet, Secret, SessionToken};
pub use error::ApiError;
pub use events::{visible_events, Event, EventView, EventVisibility};
pub use service::{Hackboard, ServiceConfig};
