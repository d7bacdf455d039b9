#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by job sequences and the jobs inside them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum JobSequenceStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Running"))]
    Running,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Success"))]
    Success,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Error"))]
    Error,
}

impl JobSequenceStatus {
    /// Returns true once the job has stopped running.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for JobSequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
