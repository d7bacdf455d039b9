use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A draft edit of a course file.
///
/// Rows are never hard-deleted; `deleted_at` marks drafts that have been
/// consumed or superseded.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_edit")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub course_id: i32,

    /// Directory of the edited file, relative to the course root.
    pub dir_name: String,
    pub file_name: String,

    /// Hash of the file on disk when the user started editing.
    pub orig_hash: String,

    /// Draft contents in the file store.
    pub file_id: i32,

    pub job_sequence_id: Option<i32>,

    pub created_at: DateTimeUtc,

    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
