use crate::auth::{project_invite_hash, validate_project_invite_hash, Caller};
use crate::error::ApiError;
use crate::projects::{Project, ProjectSubmission, TeamJoin};
use crate::service::{require_identity, Hackboard};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl Hackboard {
    /// Submit a project to an event whose submission window is open
    pub async fn submit_project(
        &self,
        caller: &Caller,
        submission: ProjectSubmission,
    ) -> Result<Project, ApiError> {
        let identity = require_identity(caller, "Unauthorized")?;

        let now = Utc::now();
        let project = submission
            .into_project(Uuid::new_v4().to_string(), now)
            .map_err(|field| ApiError::validation(format!("Missing required field: {}", field)))?;

        let event = self
            .store
            .get_event(&project.event_id)
            .await
            .map_err(|e| {
                error!(event_id = %project.event_id, error = %e, "Failed to fetch event");
                ApiError::upstream("Failed to fetch event data", e)
            })?
            .ok_or_else(|| ApiError::not_found("Event not found"))?;

        event.check_submission(now).map_err(|e| {
            debug!(event_id = %event.id, error = %e, "Submission outside window");
            ApiError::validation(e.to_string())
        })?;

        self.store.insert_project(&project).await.map_err(|e| {
            error!(event_id = %event.id, error = %e, "Failed to create project");
            ApiError::upstream("Failed to create project", e)
        })?;

        info!(
            user_id = %identity.user_id,
            event_id = %event.id,
            project_id = %project.id,
            "Project submitted"
        );

        Ok(project)
    }

    /// Shareable link that lets others join a project's team
    pub async fn project_invite_link(
        &self,
        caller: &Caller,
        project_id: &str,
    ) -> Result<String, ApiError> {
        require_identity(caller, "Unauthorized")?;

        let project = self
            .store
            .get_project(project_id)
            .await
            .map_err(|e| {
                error!(project_id = %project_id, error = %e, "Failed to fetch project");
                ApiError::upstream("Failed to fetch project", e)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        Ok(format!(
            "{}/join-project/{}/{}",
            self.config.base_url,
            project.id,
            project_invite_hash(&project.id, &self.config.invite_secret)
        ))
    }

    /// Join a project's team through its invite link.
    ///
    /// The hash is checked before anything else so a forged link learns
    /// nothing about the project or the session.
    pub async fn join_project(
        &self,
        caller: &Caller,
        project_id: &str,
        hash: &str,
    ) -> Result<TeamJoin, ApiError> {
        if !validate_project_invite_hash(project_id, hash, &self.config.invite_secret) {
            warn!(project_id = %project_id, "Invalid project invite hash");
            return Err(ApiError::authorization("Invalid invite link"));
        }

        let identity = require_identity(caller, "You must be signed in to join a project")?;
        let email = identity
            .email
            .as_deref()
            .ok_or_else(|| ApiError::authentication("Your session has no email address"))?;

        let project = self
            .store
            .get_project(project_id)
            .await
            .map_err(|e| {
                error!(project_id = %project_id, error = %e, "Failed to fetch project");
                ApiError::upstream("Failed to join project", e)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        if project.has_member(email) {
            debug!(user_id = %identity.user_id, project_id = %project_id, "Already a team member");
            return Ok(TeamJoin::AlreadyMember);
        }

        let mut teammates = project.teammates;
        teammates.push(email.to_string());

        self.store
            .set_teammates(project_id, &teammates)
            .await
            .map_err(|e| {
                error!(project_id = %project_id, error = %e, "Failed to update teammates");
                ApiError::upstream("Failed to join project", e)
            })?;

        info!(user_id = %identity.user_id, project_id = %project_id, "Joined project team");
        Ok(TeamJoin::Joined)
    }
}
