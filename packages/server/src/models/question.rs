use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{submission, variant};

/// Path parameters shared by the course, assessment and public question
/// routes. Which ids are present depends on the route.
#[derive(Debug, Deserialize)]
pub struct QuestionPath {
    pub course_id: Option<i32>,
    pub course_instance_id: Option<i32>,
    pub assessment_id: Option<i32>,
    pub question_id: i32,
    pub variant_id: Option<i32>,
    pub submission_id: Option<i32>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VariantQuery {
    /// Existing variant to show. A new variant is generated when absent.
    pub variant_id: Option<i32>,
}

/// Rendered question for one variant.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VariantResponse {
    pub variant_id: i32,
    pub question_id: i32,
    #[schema(example = "addNumbers")]
    pub qid: String,
    pub title: String,
    pub course_instance_id: Option<i32>,
    pub workspace_id: Option<i32>,
    /// Question HTML with the variant's parameters filled in.
    pub question_html: String,
    /// Names of files generated for this variant.
    pub generated_files: Vec<String>,
    pub submission_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl VariantResponse {
    pub fn new(
        variant: variant::Model,
        qid: String,
        title: String,
        question_html: String,
        generated_files: Vec<String>,
        submission_ids: Vec<i32>,
    ) -> Self {
        Self {
            variant_id: variant.id,
            question_id: variant.question_id,
            qid,
            title,
            course_instance_id: variant.course_instance_id,
            workspace_id: variant.workspace_id,
            question_html,
            generated_files,
            submission_ids,
            created_at: variant.created_at,
        }
    }
}

/// Request body for submitting an answer to a variant.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitAnswerRequest {
    /// Arbitrary answer object. Uploaded files go under `_files` as
    /// `[{"name": ..., "contents": <base64>}]`.
    #[schema(value_type = Object)]
    pub submitted_answer: serde_json::Value,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub variant_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(s: submission::Model) -> Self {
        Self {
            id: s.id,
            variant_id: s.variant_id,
            created_at: s.created_at,
        }
    }
}

/// Submission panel for one submission of a variant.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionPanelResponse {
    pub submission_id: i32,
    pub variant_id: i32,
    pub auth_user_id: i32,
    /// Submitted answer without the uploaded file contents.
    #[schema(value_type = Object)]
    pub answer: serde_json::Value,
    /// Names of uploaded files, downloadable from the submission files route.
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
}
