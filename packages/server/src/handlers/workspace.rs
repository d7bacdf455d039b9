use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{question, variant, workspace};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::workspace::WorkspaceResponse;
use crate::state::AppState;
use crate::utils::authz;

#[utoipa::path(
    get,
    path = "/api/v1/workspaces/{workspace_id}",
    tag = "Workspaces",
    operation_id = "getWorkspace",
    summary = "Open the workspace of a variant",
    description = "Allowed for whoever may view the variant that owns the workspace.",
    params(("workspace_id" = i32, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Workspace", body = WorkspaceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_workspace(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(workspace_id): Path<i32>,
) -> Result<Json<WorkspaceResponse>, AppError> {
    let ws = workspace::Entity::find_by_id(workspace_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Workspace not found".into()))?;

    let variant = variant::Entity::find()
        .filter(variant::Column::WorkspaceId.eq(ws.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Workspace not found".into()))?;

    authz::authorize_variant(&state.db, &auth_user, &variant).await?;

    let question = question::Entity::find_by_id(variant.question_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

    Ok(Json(WorkspaceResponse {
        id: ws.id,
        state: ws.state,
        variant_id: variant.id,
        question_id: question.id,
        question_title: question.title,
        created_at: ws.created_at,
    }))
}
