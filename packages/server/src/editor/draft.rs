use chrono::{Duration, Utc};
use common::storage::BlobStore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, instrument};

use crate::entity::file_edit;
use crate::error::AppError;
use crate::file_store;

/// Identifies the drafts of one user for one course file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftKey {
    pub user_id: i32,
    pub course_id: i32,
    /// Directory relative to the course root; empty for top-level files.
    pub dir_name: String,
    pub file_name: String,
}

/// A draft that was read (and thereby consumed) by the editor.
#[derive(Debug, Clone)]
pub struct DraftEdit {
    pub edit_id: i32,
    pub orig_hash: String,
    pub job_sequence_id: Option<i32>,
    pub file_id: i32,
    pub contents: Vec<u8>,
}

fn active_drafts(key: &DraftKey) -> sea_orm::Select<file_edit::Entity> {
    file_edit::Entity::find()
        .filter(file_edit::Column::UserId.eq(key.user_id))
        .filter(file_edit::Column::CourseId.eq(key.course_id))
        .filter(file_edit::Column::DirName.eq(&key.dir_name))
        .filter(file_edit::Column::FileName.eq(&key.file_name))
        .filter(file_edit::Column::DeletedAt.is_null())
}

/// Most recent active draft younger than `max_age`.
pub async fn select_file_edit<C: ConnectionTrait>(
    db: &C,
    key: &DraftKey,
    max_age: Duration,
) -> Result<Option<file_edit::Model>, AppError> {
    let cutoff = Utc::now() - max_age;
    let edit = active_drafts(key)
        .filter(file_edit::Column::CreatedAt.gt(cutoff))
        .order_by_desc(file_edit::Column::CreatedAt)
        .order_by_desc(file_edit::Column::Id)
        .one(db)
        .await?;
    Ok(edit)
}

/// Soft-delete every active draft for `key`, expired or not. Returns the
/// rows that were deleted.
pub async fn soft_delete_file_edits<C: ConnectionTrait>(
    db: &C,
    key: &DraftKey,
) -> Result<Vec<file_edit::Model>, AppError> {
    let edits = active_drafts(key).all(db).await?;
    if edits.is_empty() {
        return Ok(edits);
    }

    file_edit::Entity::update_many()
        .col_expr(file_edit::Column::DeletedAt, Expr::value(Utc::now()))
        .filter(file_edit::Column::Id.is_in(edits.iter().map(|e| e.id)))
        .exec(db)
        .await?;

    debug!(count = edits.len(), "Soft-deleted file edits");
    Ok(edits)
}

pub async fn insert_file_edit<C: ConnectionTrait>(
    db: &C,
    key: &DraftKey,
    orig_hash: &str,
    file_id: i32,
) -> Result<file_edit::Model, AppError> {
    let edit = file_edit::ActiveModel {
        user_id: Set(key.user_id),
        course_id: Set(key.course_id),
        dir_name: Set(key.dir_name.clone()),
        file_name: Set(key.file_name.clone()),
        orig_hash: Set(orig_hash.to_string()),
        file_id: Set(file_id),
        job_sequence_id: Set(None),
        created_at: Set(Utc::now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(edit)
}

pub async fn update_file_edit_job_sequence_id<C: ConnectionTrait>(
    db: &C,
    edit_id: i32,
    job_sequence_id: i32,
) -> Result<(), AppError> {
    file_edit::Entity::update_many()
        .col_expr(file_edit::Column::JobSequenceId, Expr::value(job_sequence_id))
        .filter(file_edit::Column::Id.eq(edit_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Take the current draft for `key`, if any.
///
/// All active drafts are soft-deleted before the selected draft's contents
/// are fetched from the file store.
#[instrument(skip(db, blob_store), fields(user_id = key.user_id, course_id = key.course_id))]
pub async fn read_draft_edit(
    db: &DatabaseConnection,
    blob_store: &dyn BlobStore,
    key: &DraftKey,
    max_age: Duration,
) -> Result<Option<DraftEdit>, AppError> {
    let selected = select_file_edit(db, key, max_age).await?;
    soft_delete_file_edits(db, key).await?;

    let Some(edit) = selected else {
        return Ok(None);
    };

    let stored = file_store::get(db, blob_store, edit.file_id).await?;
    debug!(edit_id = edit.id, file_id = edit.file_id, "Read draft edit");

    Ok(Some(DraftEdit {
        edit_id: edit.id,
        orig_hash: edit.orig_hash,
        job_sequence_id: edit.job_sequence_id,
        file_id: edit.file_id,
        contents: stored.contents,
    }))
}

/// Replace any drafts for `key` with a new one holding `contents`.
///
/// `orig_hash` is the hash of the file on disk that the user started from.
/// Superseded drafts are soft-deleted together with their file-store rows.
/// Their blobs are only released after the new draft is committed, so a
/// failed write leaves the previous draft readable.
#[instrument(skip(db, blob_store, contents), fields(user_id = key.user_id, course_id = key.course_id))]
pub async fn write_draft_edit(
    db: &DatabaseConnection,
    blob_store: &dyn BlobStore,
    key: &DraftKey,
    contents: &[u8],
    orig_hash: &str,
    authn_user_id: i32,
) -> Result<file_edit::Model, AppError> {
    let txn = db.begin().await?;

    let mut released = Vec::new();
    for old in soft_delete_file_edits(&txn, key).await? {
        if let Some(hash) = file_store::soft_delete(&txn, old.file_id, authn_user_id).await? {
            released.push(hash);
        }
    }

    let file_id = file_store::upload(
        &txn,
        blob_store,
        &key.file_name,
        contents,
        file_store::INSTRUCTOR_FILE_EDIT,
        Some(authn_user_id),
    )
    .await?;

    let edit = insert_file_edit(&txn, key, orig_hash, file_id).await?;
    txn.commit().await?;

    for storage_hash in released {
        file_store::release_blob(db, blob_store, &storage_hash).await?;
    }

    debug!(edit_id = edit.id, file_id, "Wrote draft edit");
    Ok(edit)
}
