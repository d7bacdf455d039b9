use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub question_id: i32,
    pub course_id: i32,

    /// NULL for variants created in course or public preview.
    pub course_instance_id: Option<i32>,

    /// The user the variant was generated for.
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub authn_user_id: i32,

    pub workspace_id: Option<i32>,

    pub seed: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub params: serde_json::Value,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
