use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{course, course_instance};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::jobs::{ServerJobOptions, prepare_server_job};
use crate::models::job_sequence::JobStartedResponse;
use crate::state::AppState;
use crate::sync::sync_course;
use crate::utils::authz;

pub(crate) async fn find_course<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

pub(crate) async fn find_course_instance<C: ConnectionTrait>(
    db: &C,
    course_instance_id: i32,
) -> Result<course_instance::Model, AppError> {
    course_instance::Entity::find_by_id(course_instance_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course instance not found".into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/sync",
    tag = "Courses",
    operation_id = "syncCourse",
    summary = "Sync course content from disk",
    description = "Starts a background job that reloads the course and its questions from the course directory. Requires course Editor.",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 202, description = "Sync started", body = JobStartedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn sync(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state.db, course_id).await?;
    authz::require_course_edit(&state.db, &auth_user, &course).await?;

    let job = prepare_server_job(
        &state.db,
        ServerJobOptions {
            course_id: Some(course.id),
            user_id: auth_user.user_id,
            authn_user_id: auth_user.user_id,
            job_type: "sync".into(),
            description: format!("Sync course {}", course.short_name),
        },
    )
    .await?;

    let db = state.db.clone();
    job.execute_in_background(move |job| async move {
        job.info(format!("Syncing {}", course.path)).await;
        let report = sync_course(&db, &course).await?;
        job.info(format!(
            "Synced {} questions, removed {}",
            report.questions_synced, report.questions_deleted
        ))
        .await;
        Ok::<_, anyhow::Error>(())
    });

    info!(job_sequence_id = job.job_sequence_id, "Started course sync");
    Ok((
        StatusCode::ACCEPTED,
        Json(JobStartedResponse {
            job_sequence_id: job.job_sequence_id,
        }),
    ))
}
