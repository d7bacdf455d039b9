use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assessment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub course_instance_id: i32,

    /// Directory name of the assessment, e.g. "hw1".
    pub tid: String,
    pub title: String,
}

impl ActiveModelBehavior for ActiveModel {}
