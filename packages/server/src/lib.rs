pub mod config;
pub mod database;
pub mod editor;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod file_store;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod question;
pub mod routes;
pub mod seed;
pub mod state;
pub mod sync;
pub mod utils;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Courseware API",
        version = "1.0.0",
        description = "Course file editing, content sync, and question variants"
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::course::sync,
        handlers::file_edit::get_file_edit,
        handlers::file_edit::post_file_edit,
        handlers::job_sequence::get_job_sequence,
        handlers::question::show_question,
        handlers::question::submit_answer,
        handlers::question::render_submission,
        handlers::question::generated_file,
        handlers::question::submission_file,
        handlers::workspace::get_workspace,
    ),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "Courses", description = "Course content sync"),
        (name = "File Editor", description = "Draft-aware editing of course files"),
        (name = "Jobs", description = "Server job sequences"),
        (name = "Questions", description = "Question variants, submissions and their files"),
        (name = "Workspaces", description = "Per-variant workspaces"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
