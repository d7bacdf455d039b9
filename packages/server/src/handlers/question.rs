//! Question pages reached from three contexts: course preview, an
//! assessment inside a course instance, and the public question listing.
//! Each context has its own entry check; everything that hangs off a variant
//! then goes through the same variant authorization.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use sea_orm::*;
use tracing::{debug, instrument};

use super::course::{find_course, find_course_instance};
use crate::entity::{assessment, assessment_question, course, question, submission, variant};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::question::{
    QuestionPath, SubmissionPanelResponse, SubmissionResponse, SubmitAnswerRequest, VariantQuery,
    VariantResponse,
};
use crate::question::{
    create_variant, find_variant, load_question_info, load_submission_files, question_dir,
    render_template,
};
use crate::state::AppState;
use crate::utils::authz;
use crate::utils::filename::validate_flat_filename;

/// Which route family a question request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionScope {
    CoursePreview,
    Assessment,
    Public,
}

/// A question the caller is allowed to open in the current scope.
struct ScopedQuestion {
    course: course::Model,
    question: question::Model,
    course_instance_id: Option<i32>,
}

fn missing_param(name: &str) -> AppError {
    AppError::Validation(format!("Missing path parameter {name}"))
}

async fn find_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    question_id: i32,
) -> Result<question::Model, AppError> {
    question::Entity::find_by_id(question_id)
        .filter(question::Column::CourseId.eq(course_id))
        .filter(question::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".into()))
}

async fn resolve_scope(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    scope: QuestionScope,
    params: &QuestionPath,
) -> Result<ScopedQuestion, AppError> {
    match scope {
        QuestionScope::CoursePreview => {
            let course_id = params.course_id.ok_or_else(|| missing_param("course_id"))?;
            let course = find_course(db, course_id).await?;
            authz::require_course_preview(db, auth_user, course.id).await?;
            let question = find_question(db, course.id, params.question_id).await?;
            Ok(ScopedQuestion {
                course,
                question,
                course_instance_id: None,
            })
        }
        QuestionScope::Assessment => {
            let course_instance_id = params
                .course_instance_id
                .ok_or_else(|| missing_param("course_instance_id"))?;
            let assessment_id = params
                .assessment_id
                .ok_or_else(|| missing_param("assessment_id"))?;

            let course_instance = find_course_instance(db, course_instance_id).await?;
            authz::require_course_instance_access(db, auth_user, &course_instance).await?;

            let assessment = assessment::Entity::find_by_id(assessment_id)
                .filter(assessment::Column::CourseInstanceId.eq(course_instance.id))
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("Assessment not found".into()))?;
            assessment_question::Entity::find_by_id((assessment.id, params.question_id))
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

            let course = find_course(db, course_instance.course_id).await?;
            let question = find_question(db, course.id, params.question_id).await?;
            Ok(ScopedQuestion {
                course,
                question,
                course_instance_id: Some(course_instance.id),
            })
        }
        QuestionScope::Public => {
            let course_id = params.course_id.ok_or_else(|| missing_param("course_id"))?;
            let course = find_course(db, course_id).await?;
            let question = find_question(db, course.id, params.question_id).await?;
            if !question.shared_publicly {
                return Err(AppError::NotFound("Question not found".into()));
            }
            Ok(ScopedQuestion {
                course,
                question,
                course_instance_id: None,
            })
        }
    }
}

/// Load a variant of the scoped question and check the caller may see it.
async fn authorized_variant(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    scoped: &ScopedQuestion,
    variant_id: i32,
) -> Result<variant::Model, AppError> {
    let variant = find_variant(db, variant_id).await?;
    if variant.question_id != scoped.question.id {
        return Err(AppError::access_denied());
    }
    if scoped.course_instance_id.is_some() && variant.course_instance_id != scoped.course_instance_id
    {
        return Err(AppError::access_denied());
    }
    authz::authorize_variant(db, auth_user, &variant).await?;
    Ok(variant)
}

async fn find_submission<C: ConnectionTrait>(
    db: &C,
    submission_id: i32,
) -> Result<submission::Model, AppError> {
    submission::Entity::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/questions/{question_id}",
    tag = "Questions",
    operation_id = "showQuestion",
    summary = "Show a question variant",
    description = "Renders the given variant, or generates a new one for the caller. The same handler serves `/course-instances/{course_instance_id}/assessments/{assessment_id}/questions/{question_id}` and `/public/courses/{course_id}/questions/{question_id}`.",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
        VariantQuery,
    ),
    responses(
        (status = 200, description = "Rendered variant", body = VariantResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn show_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Extension(scope): Extension<QuestionScope>,
    Path(params): Path<QuestionPath>,
    Query(query): Query<VariantQuery>,
) -> Result<Json<VariantResponse>, AppError> {
    let scoped = resolve_scope(&state.db, &auth_user, scope, &params).await?;

    let variant = match query.variant_id {
        Some(variant_id) => authorized_variant(&state.db, &auth_user, &scoped, variant_id).await?,
        None => {
            create_variant(
                &state.db,
                &scoped.course,
                &scoped.question,
                auth_user.user_id,
                auth_user.user_id,
                scoped.course_instance_id,
            )
            .await?
        }
    };

    let dir = question_dir(&scoped.course, &scoped.question);
    let info = load_question_info(&dir).await?;
    let template = tokio::fs::read_to_string(dir.join("question.html"))
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to read question.html of {}: {e}", scoped.question.qid))
        })?;
    let question_html = render_template(&template, &variant.params);

    let submission_ids = submission::Entity::find()
        .select_only()
        .column(submission::Column::Id)
        .filter(submission::Column::VariantId.eq(variant.id))
        .order_by_asc(submission::Column::Id)
        .into_tuple::<i32>()
        .all(&state.db)
        .await?;

    Ok(Json(VariantResponse::new(
        variant,
        scoped.question.qid,
        scoped.question.title,
        question_html,
        info.generated_files.into_keys().collect(),
        submission_ids,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/questions/{question_id}/variants/{variant_id}/submissions",
    tag = "Questions",
    operation_id = "submitAnswer",
    summary = "Submit an answer to a variant",
    description = "Only the user who generated the variant may submit to it.",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
        ("variant_id" = i32, Path, description = "Variant ID"),
    ),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 201, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn submit_answer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Extension(scope): Extension<QuestionScope>,
    Path(params): Path<QuestionPath>,
    AppJson(payload): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let variant_id = params.variant_id.ok_or_else(|| missing_param("variant_id"))?;
    let scoped = resolve_scope(&state.db, &auth_user, scope, &params).await?;
    let variant = authorized_variant(&state.db, &auth_user, &scoped, variant_id).await?;

    if variant.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied(
            "Access denied: only the owner of a variant can submit answers to it".into(),
        ));
    }
    if !payload.submitted_answer.is_object() {
        return Err(AppError::Validation("submitted_answer must be an object".into()));
    }
    load_submission_files(&payload.submitted_answer)?;

    let model = submission::ActiveModel {
        variant_id: Set(variant.id),
        auth_user_id: Set(auth_user.user_id),
        submitted_answer: Set(payload.submitted_answer),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/questions/{question_id}/variants/{variant_id}/submissions/{submission_id}",
    tag = "Questions",
    operation_id = "renderSubmission",
    summary = "Render a submission panel",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
        ("variant_id" = i32, Path, description = "Variant ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 200, description = "Submission panel", body = SubmissionPanelResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn render_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Extension(scope): Extension<QuestionScope>,
    Path(params): Path<QuestionPath>,
) -> Result<Json<SubmissionPanelResponse>, AppError> {
    let variant_id = params.variant_id.ok_or_else(|| missing_param("variant_id"))?;
    let submission_id = params
        .submission_id
        .ok_or_else(|| missing_param("submission_id"))?;

    let scoped = resolve_scope(&state.db, &auth_user, scope, &params).await?;
    let variant = authorized_variant(&state.db, &auth_user, &scoped, variant_id).await?;

    let submission = find_submission(&state.db, submission_id).await?;
    if submission.variant_id != variant.id {
        return Err(AppError::NotFound("Submission not found".into()));
    }

    let files = load_submission_files(&submission.submitted_answer)?
        .into_iter()
        .map(|f| f.name)
        .collect();
    let mut answer = submission.submitted_answer;
    if let Some(obj) = answer.as_object_mut() {
        obj.remove("_files");
    }

    Ok(Json(SubmissionPanelResponse {
        submission_id: submission.id,
        variant_id: variant.id,
        auth_user_id: submission.auth_user_id,
        answer,
        files,
        created_at: submission.created_at,
    }))
}

fn file_response(filename: &str, contents: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.to_string())], contents).into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/questions/{question_id}/variants/{variant_id}/generated-files/{filename}",
    tag = "Questions",
    operation_id = "getGeneratedFile",
    summary = "Download a file generated for a variant",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
        ("variant_id" = i32, Path, description = "Variant ID"),
        ("filename" = String, Path, description = "Generated file name"),
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Invalid filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn generated_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Extension(scope): Extension<QuestionScope>,
    Path(params): Path<QuestionPath>,
) -> Result<Response, AppError> {
    let variant_id = params.variant_id.ok_or_else(|| missing_param("variant_id"))?;
    let filename = params
        .filename
        .as_deref()
        .ok_or_else(|| missing_param("filename"))?;
    let filename = validate_flat_filename(filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let scoped = resolve_scope(&state.db, &auth_user, scope, &params).await?;
    let variant = authorized_variant(&state.db, &auth_user, &scoped, variant_id).await?;

    let info = load_question_info(&question_dir(&scoped.course, &scoped.question)).await?;
    let template = info
        .generated_files
        .get(filename)
        .ok_or_else(|| AppError::NotFound(format!("No generated file named {filename}")))?;

    let contents = render_template(template, &variant.params);
    Ok(file_response(filename, contents.into_bytes()))
}

async fn load_submitted_file(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    scope: QuestionScope,
    params: &QuestionPath,
) -> Result<Response, AppError> {
    let submission_id = params
        .submission_id
        .ok_or_else(|| missing_param("submission_id"))?;
    let filename = params
        .filename
        .as_deref()
        .ok_or_else(|| missing_param("filename"))?;

    let scoped = resolve_scope(db, auth_user, scope, params).await?;
    let submission = find_submission(db, submission_id).await?;
    authorized_variant(db, auth_user, &scoped, submission.variant_id).await?;

    let file = load_submission_files(&submission.submitted_answer)?
        .into_iter()
        .find(|f| f.name == filename)
        .ok_or_else(|| AppError::NotFound(format!("No submitted file named {filename}")))?;

    Ok(file_response(&file.name, file.contents))
}

/// Download a file uploaded with a submission.
///
/// Every failure, including denied access, is an empty 404 so the route
/// does not reveal which submissions exist.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/questions/{question_id}/submissions/{submission_id}/files/{filename}",
    tag = "Questions",
    operation_id = "getSubmissionFile",
    summary = "Download a submitted file",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
        ("filename" = String, Path, description = "Submitted file name"),
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not allowed (empty body)"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn submission_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Extension(scope): Extension<QuestionScope>,
    Path(params): Path<QuestionPath>,
) -> Response {
    match load_submitted_file(&state.db, &auth_user, scope, &params).await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = ?e, "Submission file unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
