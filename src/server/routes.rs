//! HTTP handlers
//!
//! Each handler resolves the caller, delegates to [`Hackboard`](crate::service::Hackboard) and shapes
//! the JSON response. Errors render as `{"error": "..."}`.
//!
//! Handlers whose body is checked before authentication take the raw
//! headers and resolve the caller only once the body is known good.

use crate::auth::{validate_project_invite_hash, Caller, EventRole};
use crate::error::ApiError;
use crate::events::EventView;
use crate::projects::{
    Feedback, FeedbackSubmission, Project, ProjectScore, ProjectSubmission, ScoreSubmission,
    TeamJoin,
};
use crate::server::{bearer_token, AppState};
use crate::service::{GenerateInviteRequest, InviteLink, RolePasswordRequest};
use crate::{EventId, ProjectId};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Serialize)]
pub struct EventList {
    pub events: Vec<EventView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInviteResponse {
    pub success: bool,
    pub event_id: EventId,
    pub role: EventRole,
    pub changed: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRoleResponse {
    pub success: bool,
    pub message: String,
    pub event_id: EventId,
    pub role: EventRole,
}

#[derive(Serialize)]
pub struct SubmitProjectResponse {
    pub data: Project,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInviteResponse {
    pub invite_link: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinProjectResponse {
    pub status: TeamJoin,
    pub project_id: ProjectId,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub data: Feedback,
}

#[derive(Serialize)]
pub struct FeedbackList {
    pub feedback: Vec<Feedback>,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub data: ProjectScore,
}

#[derive(Serialize)]
pub struct ScoreList {
    pub scores: Vec<ProjectScore>,
}

fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    state.resolve_caller(bearer_token(headers)?)
}

/// Unwrap a JSON body, turning axum's rejection into a validation error
fn json_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(format!("Invalid request body: {}", rejection.body_text())))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_events(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<EventList>, ApiError> {
    let events = state.list_events(&caller).await?;
    Ok(Json(EventList { events }))
}

pub async fn generate_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateInviteRequest>, JsonRejection>,
) -> Result<Json<InviteLink>, ApiError> {
    let request = json_body(payload)?;
    request.validate()?;
    let caller = resolve_caller(&state, &headers)?;
    let link = state.generate_invite(&caller, request).await?;
    Ok(Json(link))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<AcceptInviteRequest>, JsonRejection>,
) -> Result<Json<AcceptInviteResponse>, ApiError> {
    let request = json_body(payload)?;
    let accepted = state
        .accept_invite(&caller, request.token.as_deref())
        .await?;

    Ok(Json(AcceptInviteResponse {
        success: true,
        event_id: accepted.event_id,
        role: accepted.role,
        changed: accepted.changed,
    }))
}

pub async fn set_role_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RolePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = json_body(payload)?;
    request.validate_for_set()?;
    let caller = resolve_caller(&state, &headers)?;
    state.set_role_password(&caller, request).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password set successfully".to_string(),
    }))
}

pub async fn verify_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RolePasswordRequest>, JsonRejection>,
) -> Result<Json<VerifyRoleResponse>, ApiError> {
    let request = json_body(payload)?;
    request.validate_for_verify()?;
    let caller = resolve_caller(&state, &headers)?;
    let verified = state.verify_role(&caller, request).await?;

    Ok(Json(VerifyRoleResponse {
        success: true,
        message: format!("Role {} assigned", verified.role),
        event_id: verified.event_id,
        role: verified.role,
    }))
}

pub async fn submit_project(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ProjectSubmission>, JsonRejection>,
) -> Result<Json<SubmitProjectResponse>, ApiError> {
    let submission = json_body(payload)?;
    let project = state.submit_project(&caller, submission).await?;
    Ok(Json(SubmitProjectResponse { data: project }))
}

pub async fn project_invite_link(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectInviteResponse>, ApiError> {
    let invite_link = state.project_invite_link(&caller, &project_id).await?;
    Ok(Json(ProjectInviteResponse { invite_link }))
}

/// The hash is validated before the caller is resolved, so this handler
/// reads the header itself instead of taking a [`Caller`] extractor.
pub async fn join_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, hash)): Path<(ProjectId, String)>,
) -> Result<Json<JoinProjectResponse>, ApiError> {
    let caller = if validate_project_invite_hash(&project_id, &hash, &state.config().invite_secret) {
        resolve_caller(&state, &headers)?
    } else {
        Caller::Anonymous
    };

    let status = state.join_project(&caller, &project_id, &hash).await?;
    Ok(Json(JoinProjectResponse { status, project_id }))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    payload: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let submission = json_body(payload)?;
    let feedback = state.submit_feedback(&caller, &project_id, submission).await?;
    Ok(Json(FeedbackResponse { data: feedback }))
}

pub async fn project_feedback(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<FeedbackList>, ApiError> {
    let feedback = state.project_feedback(&caller, &project_id).await?;
    Ok(Json(FeedbackList { feedback }))
}

pub async fn submit_score(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    payload: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let submission = json_body(payload)?;
    let score = state.submit_score(&caller, &project_id, submission).await?;
    Ok(Json(ScoreResponse { data: score }))
}

pub async fn project_scores(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ScoreList>, ApiError> {
    let scores = state.project_scores(&caller, &project_id).await?;
    Ok(Json(ScoreList { scores }))
}
