//! Hackathon projects, team membership, mentor feedback and judge scores

mod review;

pub use review::{Feedback, FeedbackSubmission, ProjectScore, ScoreSubmission};

use crate::{EventId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `projects` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub project_name: String,
    pub project_description: String,
    pub lead_name: String,
    pub lead_email: String,
    pub teammates: Vec<String>,
    pub event_id: EventId,
    pub project_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub additional_materials_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn has_member(&self, email: &str) -> bool {
        self.lead_email.eq_ignore_ascii_case(email)
            || self.teammates.iter().any(|t| t.eq_ignore_ascii_case(email))
    }
}

/// Body of a project submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSubmission {
    pub project_name: Option<String>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub project_description: Option<String>,
    #[serde(default)]
    pub teammates: Vec<String>,
    pub project_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub additional_materials_url: Option<String>,
    pub event_id: Option<String>,
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, &'static str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(field),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProjectSubmission {
    /// The event id, if present and non-blank
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Build the row to insert, or name the first missing required field
    pub fn into_project(
        self,
        id: ProjectId,
        now: DateTime<Utc>,
    ) -> Result<Project, &'static str> {
        let project_name = required(&self.project_name, "projectName")?;
        let lead_name = required(&self.lead_name, "leadName")?;
        let lead_email = required(&self.lead_email, "leadEmail")?;
        let event_id = required(&self.event_id, "eventId")?;

        let teammates = self
            .teammates
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Project {
            id,
            project_name,
            project_description: self.project_description.unwrap_or_default(),
            lead_name,
            lead_email,
            teammates,
            event_id,
            project_url: optional(self.project_url),
            cover_image_url: optional(self.cover_image_url),
            additional_materials_url: optional(self.additional_materials_url),
            created_at: now,
        })
    }
}

/// Outcome of joining a project team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamJoin {
    Joined,
    AlreadyMember,
}
