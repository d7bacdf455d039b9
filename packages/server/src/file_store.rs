//! Database-tracked files whose contents live in the content-addressed blob store.

use chrono::Utc;
use common::storage::{BlobStore, ContentHash};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use tracing::{debug, warn};

use crate::entity::file;
use crate::error::AppError;

/// File type recorded for draft contents written by the course file editor.
pub const INSTRUCTOR_FILE_EDIT: &str = "instructor_file_edit";

#[derive(Debug)]
pub struct StoredFile {
    pub file: file::Model,
    pub contents: Vec<u8>,
}

/// Store `contents` and return the id of the new file row.
pub async fn upload<C: ConnectionTrait>(
    db: &C,
    blob_store: &dyn BlobStore,
    display_filename: &str,
    contents: &[u8],
    file_type: &str,
    user_id: Option<i32>,
) -> Result<i32, AppError> {
    let hash = blob_store.put(contents).await?;

    let row = file::ActiveModel {
        display_filename: Set(display_filename.to_string()),
        storage_hash: Set(hash.to_hex()),
        file_type: Set(file_type.to_string()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        deleted_at: Set(None),
        deleted_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(file_id = row.id, hash = %hash, "Uploaded file");
    Ok(row.id)
}

/// Fetch an active file. Soft-deleted and unknown ids are both `NotFound`.
pub async fn get<C: ConnectionTrait>(
    db: &C,
    blob_store: &dyn BlobStore,
    file_id: i32,
) -> Result<StoredFile, AppError> {
    let file = file::Entity::find_by_id(file_id)
        .filter(file::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {file_id} not found")))?;

    let hash = ContentHash::from_hex(&file.storage_hash)?;
    let contents = blob_store.get(&hash).await?;

    Ok(StoredFile { file, contents })
}

/// Soft-delete a file row, returning the storage hash it pointed at.
///
/// The blob is left in place; call [`release_blob`] once the soft-delete has
/// been committed. Already deleted or unknown ids yield `None`.
pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    file_id: i32,
    authn_user_id: i32,
) -> Result<Option<String>, AppError> {
    let Some(existing) = file::Entity::find_by_id(file_id)
        .filter(file::Column::DeletedAt.is_null())
        .one(db)
        .await?
    else {
        debug!(file_id, "File already deleted");
        return Ok(None);
    };

    let storage_hash = existing.storage_hash.clone();
    let mut active: file::ActiveModel = existing.into();
    active.deleted_at = Set(Some(Utc::now()));
    active.deleted_by = Set(Some(authn_user_id));
    active.update(db).await?;

    Ok(Some(storage_hash))
}

/// Remove the blob stored under `storage_hash` unless an active file row
/// still references it.
pub async fn release_blob<C: ConnectionTrait>(
    db: &C,
    blob_store: &dyn BlobStore,
    storage_hash: &str,
) -> Result<(), AppError> {
    let still_referenced = file::Entity::find()
        .filter(file::Column::StorageHash.eq(storage_hash))
        .filter(file::Column::DeletedAt.is_null())
        .count(db)
        .await?;
    if still_referenced > 0 {
        return Ok(());
    }

    let hash = ContentHash::from_hex(storage_hash)?;
    if let Err(e) = blob_store.delete(&hash).await {
        warn!(hash = storage_hash, error = %e, "Failed to remove blob of deleted file");
    }
    Ok(())
}
