use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{file_edit, variant};

/// Ensure required composite indexes exist.
///
/// Entity-derived schemas only carry single-column indexes, so these are
/// created on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    // Draft lookup:
    // SELECT ... FROM file_edit WHERE user_id = ? AND course_id = ? AND dir_name = ? AND file_name = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_file_edit_user_course_file")
        .table(file_edit::Entity)
        .col(file_edit::Column::UserId)
        .col(file_edit::Column::CourseId)
        .col(file_edit::Column::DirName)
        .col(file_edit::Column::FileName)
        .to_owned();

    match db.execute_raw(backend.build(&stmt)).await {
        Ok(_) => info!("Ensured index idx_file_edit_user_course_file exists"),
        Err(e) => warn!("Failed to create index idx_file_edit_user_course_file: {}", e),
    }

    // Workspace lookup by variant.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_variant_workspace")
        .table(variant::Entity)
        .col(variant::Column::WorkspaceId)
        .to_owned();

    match db.execute_raw(backend.build(&stmt)).await {
        Ok(_) => info!("Ensured index idx_variant_workspace exists"),
        Err(e) => warn!("Failed to create index idx_variant_workspace: {}", e),
    }

    Ok(())
}
