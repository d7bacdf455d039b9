use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATE_UNINITIALIZED: &str = "uninitialized";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workspace")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One of: uninitialized, launching, running, stopped.
    pub state: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
