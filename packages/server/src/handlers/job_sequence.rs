use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use super::course::find_course;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::jobs::job_sequence_with_output;
use crate::models::job_sequence::JobSequenceResponse;
use crate::state::AppState;
use crate::utils::authz;

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/job-sequences/{job_sequence_id}",
    tag = "Jobs",
    operation_id = "getJobSequence",
    summary = "Job sequence status and output",
    description = "Visible to the user who started the job and to course Viewers.",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("job_sequence_id" = i32, Path, description = "Job sequence ID"),
    ),
    responses(
        (status = 200, description = "Job sequence", body = JobSequenceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_job_sequence(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, job_sequence_id)): Path<(i32, i32)>,
) -> Result<Json<JobSequenceResponse>, AppError> {
    let course = find_course(&state.db, course_id).await?;
    let found = job_sequence_with_output(&state.db, job_sequence_id, course.id).await?;

    if found.sequence.user_id != auth_user.user_id {
        authz::require_course_view(&state.db, &auth_user, course.id).await?;
    }

    Ok(Json(JobSequenceResponse::from(found)))
}
