use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const ACTION_SAVE_AND_SYNC: &str = "save_and_sync";

/// Form posted by the file editor.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FileEditForm {
    /// Requested action. Only `save_and_sync` is supported.
    #[serde(rename = "__action")]
    #[schema(example = "save_and_sync")]
    pub action: String,
    /// New file contents, base64-encoded.
    #[serde(default)]
    pub file_edit_contents: Option<String>,
    /// Hash of the disk contents the edit started from.
    #[serde(default)]
    pub file_edit_orig_hash: Option<String>,
}

/// A validated `save_and_sync` submission.
#[derive(Debug)]
pub struct SaveAndSyncForm {
    pub contents: Vec<u8>,
    pub orig_hash: String,
}

pub fn validate_file_edit_form(form: FileEditForm) -> Result<SaveAndSyncForm, AppError> {
    if form.action != ACTION_SAVE_AND_SYNC {
        return Err(AppError::Validation(format!(
            "Unknown __action: {}",
            form.action
        )));
    }

    let encoded = form
        .file_edit_contents
        .ok_or_else(|| AppError::Validation("file_edit_contents is required".into()))?;
    let contents = Base64
        .decode(encoded.trim().as_bytes())
        .map_err(|_| AppError::Validation("file_edit_contents must be base64".into()))?;

    let orig_hash = form
        .file_edit_orig_hash
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Validation("file_edit_orig_hash is required".into()))?;

    Ok(SaveAndSyncForm {
        contents,
        orig_hash,
    })
}

/// Outcome flags of the job that last handled the draft.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileEditJobSummary {
    pub job_sequence_id: i32,
    pub did_save: bool,
    pub did_sync: bool,
}

/// Everything the editor page needs, rebuilt on every GET.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileEditResponse {
    pub user_id: i32,
    pub course_id: i32,
    /// Directory relative to the course root.
    #[schema(example = "questions/addNumbers")]
    pub dir_name: String,
    #[schema(example = "info.json")]
    pub file_name: String,
    #[schema(example = "questions/addNumbers/info.json")]
    pub file_name_for_display: String,
    #[schema(example = "ace/mode/json")]
    pub ace_mode: String,

    /// Current disk contents, base64-encoded.
    pub disk_contents: String,
    pub disk_hash: String,

    /// Contents to load into the editor, base64-encoded.
    pub edit_contents: String,
    /// Hash to submit back as `file_edit_orig_hash`.
    pub orig_hash: String,

    /// The consumed draft, when there was one.
    pub draft_id: Option<i32>,
    pub draft_contents: Option<String>,
    pub draft_orig_hash: Option<String>,

    pub job: Option<FileEditJobSummary>,

    pub alert_results: bool,
    pub alert_choice: bool,
    pub has_same_hash: bool,
}
