use common::JobSequenceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_sequence")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub course_id: Option<i32>,

    /// Effective user the job acts for.
    pub user_id: i32,
    pub authn_user_id: i32,

    /// e.g. "file_edit", "sync".
    #[sea_orm(column_name = "type")]
    pub job_type: String,
    pub description: String,

    pub status: JobSequenceStatus,

    /// Sequences created before outcome flags were recorded. Their flags
    /// carry no information.
    #[sea_orm(default_value = false)]
    pub legacy: bool,

    /// Outcome flags; `None` until the step is reached.
    pub save_attempted: Option<bool>,
    pub save_succeeded: Option<bool>,
    pub sync_attempted: Option<bool>,
    pub sync_succeeded: Option<bool>,

    pub start_date: DateTimeUtc,
    pub finish_date: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
