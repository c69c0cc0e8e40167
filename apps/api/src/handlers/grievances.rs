use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::StatusCode;
use redressa_application::SubmitGrievanceInput;
use redressa_core::{AppError, UserIdentity};
use redressa_domain::{AttachmentUpload, GrievanceId, GrievanceStatus};
use uuid::Uuid;

use crate::dto::{
    DashboardResponse, FormatRequest, FormatResponse, GrievanceResponse, TransitionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn format_proposal_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<UserIdentity>,
    Json(payload): Json<FormatRequest>,
) -> ApiResult<Json<FormatResponse>> {
    let formatted = state
        .formatting_service
        .propose_formal_text(&payload.title, &payload.description)
        .await?;

    Ok(Json(FormatResponse { formatted }))
}

pub async fn submit_grievance_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<GrievanceResponse>)> {
    let mut title = String::new();
    let mut description = String::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        AppError::Validation(format!("invalid multipart payload: {error}"))
    })? {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "title" => {
                title = field.text().await.map_err(|error| {
                    AppError::Validation(format!("invalid title field: {error}"))
                })?;
            }
            "description" => {
                description = field.text().await.map_err(|error| {
                    AppError::Validation(format!("invalid description field: {error}"))
                })?;
            }
            "files" => {
                let file_name = field.file_name().unwrap_or("attachment").to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|error| {
                    AppError::Validation(format!("invalid file field: {error}"))
                })?;

                attachments.push(AttachmentUpload::new(file_name, content_type, bytes.to_vec())?);
            }
            _ => {}
        }
    }

    let grievance = state
        .grievance_service
        .submit(
            &user,
            SubmitGrievanceInput {
                title,
                description,
                attachments,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GrievanceResponse::from(grievance))))
}

pub async fn list_grievances_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<GrievanceResponse>>> {
    let grievances = state
        .grievance_service
        .list_visible(&user)
        .await?
        .into_iter()
        .map(GrievanceResponse::from)
        .collect();

    Ok(Json(grievances))
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<DashboardResponse>> {
    let board = state.grievance_service.dashboard(&user).await?;

    Ok(Json(DashboardResponse::from(board)))
}

pub async fn get_grievance_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GrievanceResponse>> {
    let grievance = state
        .grievance_service
        .get(&user, GrievanceId::from_uuid(id))
        .await?;

    Ok(Json(GrievanceResponse::from(grievance)))
}

pub async fn transition_grievance_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> ApiResult<Json<GrievanceResponse>> {
    let requested = GrievanceStatus::from_str(&payload.status)?;

    let grievance = state
        .grievance_service
        .transition(
            &user,
            GrievanceId::from_uuid(id),
            requested,
            payload.expected_version,
        )
        .await?;

    Ok(Json(GrievanceResponse::from(grievance)))
}
