//! Mentor feedback and judge scores on projects

use crate::{EventId, ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `feedback` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub project_id: ProjectId,
    pub event_id: EventId,
    pub mentor_id: UserId,
    pub mentor_name: String,
    pub mentor_email: String,
    pub feedback_text: String,
    /// What the mentor typed before any rewording
    pub original_feedback_text: String,
    /// Rewording passes applied to the text, e.g. `more_specific`
    pub modifier_field: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/projects/{id}/feedback`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub feedback_text: Option<String>,
    pub original_feedback_text: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub mentor_name: Option<String>,
}

impl FeedbackSubmission {
    /// The feedback text, if present and non-blank
    pub fn text(&self) -> Option<&str> {
        self.feedback_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// A `project_scores` row. One per (project, judge, track).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectScore {
    pub project_id: ProjectId,
    pub judge_id: UserId,
    pub track_id: String,
    pub event_id: EventId,
    /// Criterion id to score
    pub scores: BTreeMap<String, f64>,
    pub comments: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/projects/{id}/scores`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub track_id: Option<String>,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_submission_text() {
        let s: FeedbackSubmission = serde_json::from_value(serde_json::json!({
            "feedbackText": "  Ship the demo first  ",
            "modifiers": ["more_specific"]
        }))
        .unwrap();
        assert_eq!(s.text(), Some("Ship the demo first"));
        assert_eq!(s.modifiers, vec!["more_specific"]);

        let blank = FeedbackSubmission {
            feedback_text: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.text(), None);
    }

    #[test]
    fn test_score_submission_camel_case() {
        let s: ScoreSubmission = serde_json::from_value(serde_json::json!({
            "trackId": "ai",
            "scores": {"innovation": 4, "impact": 7.5}
        }))
        .unwrap();
        assert_eq!(s.track_id.as_deref(), Some("ai"));
        assert_eq!(s.scores.get("impact"), Some(&7.5));
        assert_eq!(s.comments, None);
    }
}
