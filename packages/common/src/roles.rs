#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Role a user holds on a course.
///
/// Variants are declared from least to most privileged, so the derived
/// ordering can be used for "at least" checks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum CourseRole {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "None"))]
    None,
    /// Can preview questions but not see other users' work.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Previewer"))]
    Previewer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Viewer"))]
    Viewer,
    /// Can edit course files.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Editor"))]
    Editor,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Owner"))]
    Owner,
}

impl CourseRole {
    pub fn can_preview(self) -> bool {
        self >= Self::Previewer
    }

    pub fn can_view(self) -> bool {
        self >= Self::Viewer
    }

    pub fn can_edit(self) -> bool {
        self >= Self::Editor
    }
}

/// Role a user holds on a course instance, governing access to student data.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum CourseInstanceRole {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "None"))]
    None,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Student Data Viewer"))]
    StudentDataViewer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Student Data Editor"))]
    StudentDataEditor,
}

impl CourseInstanceRole {
    pub fn can_view_student_data(self) -> bool {
        self >= Self::StudentDataViewer
    }
}
