use common::JobSequenceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub job_sequence_id: i32,

    pub status: JobSequenceStatus,

    /// Log lines written by the job, newline separated.
    #[sea_orm(column_type = "Text")]
    pub output: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub start_date: DateTimeUtc,
    pub finish_date: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
