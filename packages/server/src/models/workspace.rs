use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct WorkspaceResponse {
    pub id: i32,
    #[schema(example = "uninitialized")]
    pub state: String,
    pub variant_id: i32,
    pub question_id: i32,
    pub question_title: String,
    pub created_at: DateTime<Utc>,
}
