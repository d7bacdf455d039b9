use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use chrono::Utc;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::info::{load_question_info, question_dir};
use super::render::generate_params;
use crate::entity::{course, question, variant, workspace};
use crate::error::AppError;

/// Generate a new variant of `question` for `user_id`.
///
/// `course_instance_id` is set when the variant is created while working on
/// an assessment; preview variants leave it empty.
pub async fn create_variant<C: ConnectionTrait>(
    db: &C,
    course: &course::Model,
    question: &question::Model,
    user_id: i32,
    authn_user_id: i32,
    course_instance_id: Option<i32>,
) -> Result<variant::Model, AppError> {
    let info = load_question_info(&question_dir(course, question)).await?;

    let seed: u32 = rand::rng().random();
    let params = generate_params(u64::from(seed), &info.parameters);

    let workspace_id = if question.has_workspace {
        let ws = workspace::ActiveModel {
            state: Set(workspace::STATE_UNINITIALIZED.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Some(ws.id)
    } else {
        None
    };

    let variant = variant::ActiveModel {
        question_id: Set(question.id),
        course_id: Set(course.id),
        course_instance_id: Set(course_instance_id),
        user_id: Set(user_id),
        authn_user_id: Set(authn_user_id),
        workspace_id: Set(workspace_id),
        seed: Set(seed.to_string()),
        params: Set(params),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        variant_id = variant.id,
        question_id = question.id,
        user_id,
        ?course_instance_id,
        "Created variant"
    );
    Ok(variant)
}

pub async fn find_variant<C: ConnectionTrait>(
    db: &C,
    variant_id: i32,
) -> Result<variant::Model, AppError> {
    variant::Entity::find_by_id(variant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Variant not found".into()))
}

/// A file uploaded as part of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Deserialize)]
struct RawSubmittedFile {
    name: String,
    contents: String,
}

/// Decode the `_files` entry of a submitted answer. Answers without files
/// yield an empty list.
pub fn load_submission_files(answer: &Value) -> Result<Vec<SubmittedFile>, AppError> {
    let Some(raw) = answer.get("_files") else {
        return Ok(vec![]);
    };

    let files: Vec<RawSubmittedFile> = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::Validation(format!("Malformed _files in submission: {e}")))?;

    files
        .into_iter()
        .map(|f| {
            let contents = Base64.decode(f.contents.as_bytes()).map_err(|e| {
                AppError::Validation(format!("Malformed contents of submitted file {}: {e}", f.name))
            })?;
            Ok(SubmittedFile {
                name: f.name,
                contents,
            })
        })
        .collect()
}
