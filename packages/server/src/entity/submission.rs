use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub variant_id: i32,
    pub auth_user_id: i32,

    /// Raw answer object. Uploaded files live under `_files` as
    /// `[{"name": ..., "contents": <base64>}]`.
    #[sea_orm(column_type = "JsonBinary")]
    pub submitted_answer: serde_json::Value,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
