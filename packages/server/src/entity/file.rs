use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A file-store row. Contents live in the blob store under `storage_hash`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub display_filename: String,

    #[sea_orm(indexed)]
    pub storage_hash: String,

    /// What the file is for, e.g. "instructor_file_edit".
    #[sea_orm(column_name = "type")]
    pub file_type: String,

    pub user_id: Option<i32>,

    pub created_at: DateTimeUtc,

    pub deleted_at: Option<DateTimeUtc>,
    pub deleted_by: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}
