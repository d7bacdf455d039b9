use axum::{
    Extension, Router,
    routing::{get, post},
};

use crate::handlers;
use crate::handlers::question::QuestionScope;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/courses/{course_id}", course_routes())
        .nest(
            "/courses/{course_id}/questions",
            question_routes(QuestionScope::CoursePreview),
        )
        .nest(
            "/course-instances/{course_instance_id}/assessments/{assessment_id}/questions",
            question_routes(QuestionScope::Assessment),
        )
        .nest(
            "/public/courses/{course_id}/questions",
            question_routes(QuestionScope::Public),
        )
        .route(
            "/workspaces/{workspace_id}",
            get(handlers::workspace::get_workspace),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(handlers::course::sync))
        .route(
            "/file-edit/{*path}",
            get(handlers::file_edit::get_file_edit).post(handlers::file_edit::post_file_edit),
        )
        .route(
            "/job-sequences/{job_sequence_id}",
            get(handlers::job_sequence::get_job_sequence),
        )
}

fn question_routes(scope: QuestionScope) -> Router<AppState> {
    Router::new()
        .route("/{question_id}", get(handlers::question::show_question))
        .route(
            "/{question_id}/variants/{variant_id}/submissions",
            post(handlers::question::submit_answer),
        )
        .route(
            "/{question_id}/variants/{variant_id}/submissions/{submission_id}",
            get(handlers::question::render_submission),
        )
        .route(
            "/{question_id}/variants/{variant_id}/generated-files/{filename}",
            get(handlers::question::generated_file),
        )
        .route(
            "/{question_id}/submissions/{submission_id}/files/{filename}",
            get(handlers::question::submission_file),
        )
        .layer(Extension(scope))
}
