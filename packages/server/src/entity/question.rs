use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub course_id: i32,

    /// Directory name under `questions/`.
    pub qid: String,
    pub title: String,

    /// Anyone may preview the question through the public routes.
    pub shared_publicly: bool,

    /// Each new variant gets its own workspace.
    pub has_workspace: bool,

    /// Set by sync when the question directory disappears.
    pub deleted_at: Option<DateTimeUtc>,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
