//! Events, their visibility levels and submission windows

mod scoring;
mod visibility;

pub use scoring::{ScoringConfig, ScoringCriterion, ScoringError, TrackScoring};
pub use visibility::{visible_events, EventView, ListingScope};

use crate::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Event-level flag controlling listing exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventVisibility {
    Public,
    Private,
    Draft,
    Demo,
    Test,
}

impl EventVisibility {
    pub const ALL: [EventVisibility; 5] = [
        EventVisibility::Public,
        EventVisibility::Private,
        EventVisibility::Draft,
        EventVisibility::Demo,
        EventVisibility::Test,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventVisibility::Public => "public",
            EventVisibility::Private => "private",
            EventVisibility::Draft => "draft",
            EventVisibility::Demo => "demo",
            EventVisibility::Test => "test",
        }
    }

    /// `public` and `private` are listed for every caller
    pub fn is_listed_for_everyone(&self) -> bool {
        matches!(self, EventVisibility::Public | EventVisibility::Private)
    }
}

impl fmt::Display for EventVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Project submission has not started yet")]
    NotStarted,

    #[error("Project submission deadline has passed")]
    Closed,
}

/// Inclusive interval during which projects may be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionWindow {
    pub start: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
}

impl SubmissionWindow {
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), SubmissionError> {
        if now < self.start {
            return Err(SubmissionError::NotStarted);
        }
        if now > self.cutoff {
            return Err(SubmissionError::Closed);
        }
        Ok(())
    }
}

/// An `events` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event_id")]
    pub id: EventId,
    #[serde(rename = "event_name")]
    pub name: String,
    #[serde(rename = "event_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    pub visibility: EventVisibility,
    #[serde(rename = "submission_time_start")]
    pub submission_start: Option<DateTime<Utc>>,
    #[serde(rename = "submission_time_cutoff")]
    pub submission_cutoff: Option<DateTime<Utc>>,
    #[serde(rename = "scoring_config")]
    pub scoring: Option<ScoringConfig>,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        name: impl Into<String>,
        date: DateTime<Utc>,
        visibility: EventVisibility,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date,
            location: String::new(),
            visibility,
            submission_start: None,
            submission_cutoff: None,
            scoring: None,
        }
    }

    pub fn with_submission_window(mut self, start: DateTime<Utc>, cutoff: DateTime<Utc>) -> Self {
        self.submission_start = Some(start);
        self.submission_cutoff = Some(cutoff);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// The window, if both bounds are configured
    pub fn submission_window(&self) -> Option<SubmissionWindow> {
        Some(SubmissionWindow {
            start: self.submission_start?,
            cutoff: self.submission_cutoff?,
        })
    }

    /// Check that `now` falls in the submission window.
    ///
    /// An event without a complete window does not accept submissions.
    pub fn check_submission(&self, now: DateTime<Utc>) -> Result<(), SubmissionError> {
        match self.submission_window() {
            Some(window) => window.check(now),
            None => Err(SubmissionError::Closed),
        }
    }
}
