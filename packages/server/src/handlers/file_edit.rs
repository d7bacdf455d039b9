use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{OriginalUri, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use chrono::Duration;
use common::storage::ContentHash;
use tracing::{info, instrument, warn};

use super::course::find_course;
use crate::editor::{
    self, DraftKey, EditSource, LinkedJob, SaveAndSyncRequest, linked_job, reconcile,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppForm;
use crate::jobs::{ServerJobOptions, find_job_sequence, prepare_server_job};
use crate::models::file_edit::{
    FileEditForm, FileEditJobSummary, FileEditResponse, validate_file_edit_form,
};
use crate::state::AppState;
use crate::utils::authz;
use crate::utils::filename::{CourseFilePath, resolve_course_path};

fn draft_key(auth_user: &AuthUser, course_id: i32, path: &CourseFilePath) -> DraftKey {
    let dir_name = path
        .relative
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();
    DraftKey {
        user_id: auth_user.user_id,
        course_id,
        dir_name,
        file_name: path.file_name.clone(),
    }
}

fn job_sequence_url(course_id: i32, job_sequence_id: i32) -> String {
    format!("/api/v1/courses/{course_id}/job-sequences/{job_sequence_id}")
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/file-edit/{path}",
    tag = "File Editor",
    operation_id = "getFileEdit",
    summary = "Open a course file in the editor",
    description = "Reconciles the caller's draft (if any) with the file on disk. Reading a draft consumes it. Redirects to the job sequence while a save is still running. Requires course Editor; example courses are read-only.",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("path" = String, Path, description = "File path relative to the course root"),
    ),
    responses(
        (status = 200, description = "Editor state", body = FileEditResponse),
        (status = 303, description = "Save job still running; see the job sequence"),
        (status = 400, description = "Invalid path (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Binary or unreadable file (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_file_edit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, path)): Path<(i32, String)>,
) -> Result<Response, AppError> {
    let course = find_course(&state.db, course_id).await?;
    authz::require_course_edit(&state.db, &auth_user, &course).await?;

    let file_path = resolve_course_path(FsPath::new(&course.path), &path)?;
    let disk_contents = match tokio::fs::read(file_path.full_path()).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("File not found: {}", file_path.relative)));
        }
        Err(e) => {
            return Err(AppError::Internal(format!(
                "Failed to read {}: {e}",
                file_path.relative
            )));
        }
    };
    if editor::is_binary(&disk_contents) {
        return Err(AppError::Internal(format!(
            "Cannot edit binary file {}",
            file_path.relative
        )));
    }
    let disk_hash = ContentHash::compute(&disk_contents).to_hex();

    let key = draft_key(&auth_user, course.id, &file_path);
    let max_age = Duration::hours(state.config.editor.draft_max_age_hours);
    let draft = editor::read_draft_edit(&state.db, &*state.blob_store, &key, max_age).await?;

    let job = match draft.as_ref().and_then(|d| d.job_sequence_id) {
        Some(job_sequence_id) => {
            let sequence = find_job_sequence(&state.db, job_sequence_id, course.id).await?;
            match linked_job(&sequence) {
                LinkedJob::Running { job_sequence_id } => {
                    return Ok(Redirect::to(&job_sequence_url(course.id, job_sequence_id))
                        .into_response());
                }
                finished => Some((job_sequence_id, finished)),
            }
        }
        None => None,
    };

    let outcome = reconcile(
        &disk_hash,
        draft.as_ref().map(|d| d.orig_hash.as_str()),
        job.map(|(_, j)| j),
    );

    let (edit_contents, orig_hash) = match (&draft, outcome.source) {
        (Some(d), EditSource::Draft) => (Base64.encode(&d.contents), d.orig_hash.clone()),
        _ => (Base64.encode(&disk_contents), disk_hash.clone()),
    };

    Ok(Json(FileEditResponse {
        user_id: auth_user.user_id,
        course_id: course.id,
        dir_name: key.dir_name,
        file_name: key.file_name,
        ace_mode: editor::ace_mode(&file_path.file_name).to_string(),
        file_name_for_display: file_path.relative,
        disk_contents: Base64.encode(&disk_contents),
        disk_hash,
        edit_contents,
        orig_hash,
        draft_id: draft.as_ref().map(|d| d.edit_id),
        draft_contents: draft.as_ref().map(|d| Base64.encode(&d.contents)),
        draft_orig_hash: draft.map(|d| d.orig_hash),
        job: job.map(|(job_sequence_id, _)| FileEditJobSummary {
            job_sequence_id,
            did_save: outcome.did_save,
            did_sync: outcome.did_sync,
        }),
        alert_results: outcome.alert_results,
        alert_choice: outcome.alert_choice,
        has_same_hash: outcome.has_same_hash,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/file-edit/{path}",
    tag = "File Editor",
    operation_id = "postFileEdit",
    summary = "Save a draft and sync the course",
    description = "Stores the posted contents as a draft, then runs a save-and-sync job. Job failures are not reported here; the next GET shows the outcome. Always redirects back to the editor.",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("path" = String, Path, description = "File path relative to the course root"),
    ),
    request_body(content = FileEditForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect back to the editor"),
        (status = 400, description = "Unknown action or malformed form (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, uri, form), fields(user_id = auth_user.user_id))]
pub async fn post_file_edit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, path)): Path<(i32, String)>,
    OriginalUri(uri): OriginalUri,
    AppForm(form): AppForm<FileEditForm>,
) -> Result<Response, AppError> {
    let course = find_course(&state.db, course_id).await?;
    authz::require_course_edit(&state.db, &auth_user, &course).await?;

    let form = validate_file_edit_form(form)?;
    let file_path = resolve_course_path(FsPath::new(&course.path), &path)?;
    let key = draft_key(&auth_user, course.id, &file_path);

    let edit = editor::write_draft_edit(
        &state.db,
        &*state.blob_store,
        &key,
        &form.contents,
        &form.orig_hash,
        auth_user.user_id,
    )
    .await?;

    let job = prepare_server_job(
        &state.db,
        ServerJobOptions {
            course_id: Some(course.id),
            user_id: auth_user.user_id,
            authn_user_id: auth_user.user_id,
            job_type: "file_edit".into(),
            description: format!("Save and sync an edited file ({})", file_path.relative),
        },
    )
    .await?;
    editor::update_file_edit_job_sequence_id(&state.db, edit.id, job.job_sequence_id).await?;

    let db = state.db.clone();
    let request = SaveAndSyncRequest {
        course,
        path: file_path,
        contents: form.contents,
        orig_hash: form.orig_hash,
    };
    match job
        .execute(move |job| editor::save_and_sync(db, request, job))
        .await
    {
        Ok(()) => info!(job_sequence_id = job.job_sequence_id, "Saved and synced file"),
        Err(e) => warn!(
            job_sequence_id = job.job_sequence_id,
            error = %format!("{e:#}"),
            "Save and sync failed"
        ),
    }

    Ok(Redirect::to(uri.path()).into_response())
}
