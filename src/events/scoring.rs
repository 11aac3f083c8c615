//! Per-event judging configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("track '{track}' criterion '{criterion}': min is greater than max")]
    InvertedRange { track: String, criterion: String },

    #[error("track '{track}' criterion '{criterion}': weight must be non-negative")]
    NegativeWeight { track: String, criterion: String },

    #[error("track '{0}' has no criteria")]
    EmptyTrack(String),

    #[error("Unknown scoring track '{0}'")]
    UnknownTrack(String),

    #[error("Unknown criterion '{criterion}' for track '{track}'")]
    UnknownCriterion { track: String, criterion: String },

    #[error("Missing score for criterion '{0}'")]
    MissingScore(String),

    #[error("Score for '{criterion}' must be between {min} and {max}")]
    OutOfRange { criterion: String, min: f64, max: f64 },
}

/// Bounds used when neither the criterion nor the event sets one
pub const DEFAULT_MIN: f64 = 1.0;
pub const DEFAULT_MAX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringCriterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weight: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackScoring {
    pub name: String,
    pub criteria: Vec<ScoringCriterion>,
}

/// Named judging tracks with default bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub tracks: BTreeMap<String, TrackScoring>,
    pub default_min: Option<f64>,
    pub default_max: Option<f64>,
    pub default_weight: Option<f64>,
}

impl ScoringConfig {
    /// Check every criterion once defaults are applied
    pub fn validate(&self) -> Result<(), ScoringError> {
        for (track_id, track) in &self.tracks {
            if track.criteria.is_empty() {
                return Err(ScoringError::EmptyTrack(track_id.clone()));
            }

            for criterion in &track.criteria {
                let min = criterion.min.or(self.default_min);
                let max = criterion.max.or(self.default_max);
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(ScoringError::InvertedRange {
                            track: track_id.clone(),
                            criterion: criterion.id.clone(),
                        });
                    }
                }

                let weight = criterion.weight.or(self.default_weight).unwrap_or(1.0);
                if weight < 0.0 {
                    return Err(ScoringError::NegativeWeight {
                        track: track_id.clone(),
                        criterion: criterion.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn track(&self, track_id: &str) -> Option<&TrackScoring> {
        self.tracks.get(track_id)
    }

    /// Inclusive score range for a criterion once defaults are applied
    pub fn bounds(&self, criterion: &ScoringCriterion) -> (f64, f64) {
        (
            criterion.min.or(self.default_min).unwrap_or(DEFAULT_MIN),
            criterion.max.or(self.default_max).unwrap_or(DEFAULT_MAX),
        )
    }

    /// Check a judge's scores for one track.
    ///
    /// Every criterion of the track needs a finite score inside its bounds,
    /// and no score may name a criterion the track does not have.
    pub fn check_scores(
        &self,
        track_id: &str,
        scores: &BTreeMap<String, f64>,
    ) -> Result<(), ScoringError> {
        let track = self
            .track(track_id)
            .ok_or_else(|| ScoringError::UnknownTrack(track_id.to_string()))?;

        if let Some(unknown) = scores
            .keys()
            .find(|id| !track.criteria.iter().any(|c| &c.id == *id))
        {
            return Err(ScoringError::UnknownCriterion {
                track: track_id.to_string(),
                criterion: unknown.clone(),
            });
        }

        for criterion in &track.criteria {
            let score = *scores
                .get(&criterion.id)
                .ok_or_else(|| ScoringError::MissingScore(criterion.id.clone()))?;

            let (min, max) = self.bounds(criterion);
            if !score.is_finite() || score < min || score > max {
                return Err(ScoringError::OutOfRange {
                    criterion: criterion.id.clone(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}
