use crate::auth::{Caller, EventRole, Identity};
use crate::error::ApiError;
use crate::projects::{Feedback, FeedbackSubmission, Project, ProjectScore, ScoreSubmission};
use crate::service::{field, require_identity, Hackboard};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl Hackboard {
    async fn project_or_404(&self, project_id: &str, context: &str) -> Result<Project, ApiError> {
        self.store
            .get_project(project_id)
            .await
            .map_err(|e| {
                error!(project_id = %project_id, error = %e, "Failed to fetch project");
                ApiError::upstream(context.to_string(), e)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    async fn event_role(
        &self,
        identity: &Identity,
        event_id: &str,
        context: &str,
    ) -> Result<Option<EventRole>, ApiError> {
        self.store
            .role_for(&identity.user_id, event_id)
            .await
            .map_err(|e| {
                error!(user_id = %identity.user_id, event_id = %event_id, error = %e, "Failed to fetch user role");
                ApiError::upstream(context.to_string(), e)
            })
    }

    /// Record a mentor's feedback on a project.
    ///
    /// The caller must hold `mentor` in the project's event.
    pub async fn submit_feedback(
        &self,
        caller: &Caller,
        project_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<Feedback, ApiError> {
        let identity = require_identity(caller, "You must be signed in to give feedback")?;
        let mentor_email = identity
            .email
            .clone()
            .ok_or_else(|| ApiError::authentication("Your session has no email address"))?;

        let text = submission
            .text()
            .ok_or_else(|| ApiError::validation("Missing required field: feedbackText"))?
            .to_string();

        let project = self.project_or_404(project_id, "Failed to submit feedback").await?;

        let role = self
            .event_role(identity, &project.event_id, "Failed to submit feedback")
            .await?;
        if role != Some(EventRole::Mentor) {
            debug!(user_id = %identity.user_id, event_id = %project.event_id, role = ?role, "Feedback refused");
            return Err(ApiError::authorization(
                "Only mentors of this event can give feedback",
            ));
        }

        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            event_id: project.event_id.clone(),
            mentor_id: identity.user_id.clone(),
            mentor_name: field(&submission.mentor_name)
                .map(str::to_string)
                .unwrap_or_else(|| mentor_email.clone()),
            mentor_email,
            original_feedback_text: field(&submission.original_feedback_text)
                .map(str::to_string)
                .unwrap_or_else(|| text.clone()),
            feedback_text: text,
            modifier_field: submission.modifiers,
            created_at: Utc::now(),
        };

        self.store.insert_feedback(&feedback).await.map_err(|e| {
            error!(project_id = %project.id, error = %e, "Failed to store feedback");
            ApiError::upstream("Failed to submit feedback", e)
        })?;

        info!(
            user_id = %identity.user_id,
            project_id = %project.id,
            feedback_id = %feedback.id,
            "Feedback submitted"
        );
        Ok(feedback)
    }

    /// Feedback on a project, for its team and the event's organizers
    pub async fn project_feedback(
        &self,
        caller: &Caller,
        project_id: &str,
    ) -> Result<Vec<Feedback>, ApiError> {
        let identity = require_identity(caller, "Unauthorized")?;
        let project = self.project_or_404(project_id, "Failed to fetch feedback").await?;

        let is_member = identity
            .email
            .as_deref()
            .is_some_and(|email| project.has_member(email));
        if !is_member && !identity.is_global_admin {
            let role = self
                .event_role(identity, &project.event_id, "Failed to fetch feedback")
                .await?;
            if !role.is_some_and(|r| r.can_manage_event()) {
                return Err(ApiError::authorization("Unauthorized"));
            }
        }

        self.store.feedback_for_project(project_id).await.map_err(|e| {
            error!(project_id = %project_id, error = %e, "Failed to fetch feedback");
            ApiError::upstream("Failed to fetch feedback", e)
        })
    }

    /// Record a judge's scores for one track of a project.
    ///
    /// Scores are checked against the event's scoring config; resubmitting
    /// for the same track replaces the judge's earlier scores.
    pub async fn submit_score(
        &self,
        caller: &Caller,
        project_id: &str,
        submission: ScoreSubmission,
    ) -> Result<ProjectScore, ApiError> {
        let identity = require_identity(caller, "You must be signed in to submit scores")?;

        let track_id = field(&submission.track_id)
            .ok_or_else(|| ApiError::validation("Missing required field: trackId"))?
            .to_string();

        let project = self.project_or_404(project_id, "Failed to submit scores").await?;

        let role = self
            .event_role(identity, &project.event_id, "Failed to submit scores")
            .await?;
        if role != Some(EventRole::Judge) {
            debug!(user_id = %identity.user_id, event_id = %project.event_id, role = ?role, "Scoring refused");
            return Err(ApiError::authorization(
                "Only judges of this event can submit scores",
            ));
        }

        let event = self
            .store
            .get_event(&project.event_id)
            .await
            .map_err(|e| {
                error!(event_id = %project.event_id, error = %e, "Failed to fetch event");
                ApiError::upstream("Failed to submit scores", e)
            })?
            .ok_or_else(|| ApiError::not_found("Event not found"))?;

        let config = event
            .scoring
            .as_ref()
            .ok_or_else(|| ApiError::validation("Scoring is not configured for this event"))?;

        config
            .check_scores(&track_id, &submission.scores)
            .map_err(|e| {
                debug!(project_id = %project.id, track_id = %track_id, error = %e, "Scores rejected");
                ApiError::validation(e.to_string())
            })?;

        let score = ProjectScore {
            project_id: project.id.clone(),
            judge_id: identity.user_id.clone(),
            track_id,
            event_id: event.id.clone(),
            scores: submission.scores,
            comments: field(&submission.comments).map(str::to_string),
            updated_at: Utc::now(),
        };

        self.store.upsert_score(&score).await.map_err(|e| {
            error!(project_id = %project.id, error = %e, "Failed to store scores");
            ApiError::upstream("Failed to submit scores", e)
        })?;

        info!(
            user_id = %identity.user_id,
            project_id = %project.id,
            track_id = %score.track_id,
            "Scores submitted"
        );
        Ok(score)
    }

    /// Every judge's scores on a project, for the event's organizers
    pub async fn project_scores(
        &self,
        caller: &Caller,
        project_id: &str,
    ) -> Result<Vec<ProjectScore>, ApiError> {
        let identity = require_identity(caller, "Unauthorized")?;
        let project = self.project_or_404(project_id, "Failed to fetch scores").await?;

        if !identity.is_global_admin {
            let role = self
                .event_role(identity, &project.event_id, "Failed to fetch scores")
                .await?;
            if !role.is_some_and(|r| r.can_manage_event()) {
                warn!(user_id = %identity.user_id, project_id = %project_id, "Score listing refused");
                return Err(ApiError::authorization("Unauthorized"));
            }
        }

        self.store.scores_for_project(project_id).await.map_err(|e| {
            error!(project_id = %project_id, error = %e, "Failed to fetch scores");
            ApiError::upstream("Failed to fetch scores", e)
        })
    }
}
