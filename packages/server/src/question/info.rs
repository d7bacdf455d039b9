use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::entity::{course, question};
use crate::error::AppError;

/// Inclusive integer range a parameter is drawn from.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ParameterRange {
    pub min: i64,
    pub max: i64,
}

/// Contents of `questions/<qid>/info.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInfo {
    pub title: String,
    #[serde(default)]
    pub share_publicly: bool,
    /// Every variant of the question gets its own workspace.
    #[serde(default)]
    pub workspace: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterRange>,
    /// Filename to template, rendered per variant.
    #[serde(default)]
    pub generated_files: BTreeMap<String, String>,
}

pub fn question_dir(course: &course::Model, question: &question::Model) -> PathBuf {
    Path::new(&course.path).join("questions").join(&question.qid)
}

pub async fn load_question_info(dir: &Path) -> Result<QuestionInfo, AppError> {
    let path = dir.join("info.json");
    let raw = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_slice(&raw)
        .map_err(|e| AppError::Internal(format!("Invalid JSON in {}: {e}", path.display())))
}
