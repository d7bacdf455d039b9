use std::path::Path;

use anyhow::{Context, bail};
use common::storage::ContentHash;
use sea_orm::DatabaseConnection;

use crate::entity::course;
use crate::jobs::{SaveSyncOutcome, ServerJob};
use crate::sync::sync_course;
use crate::utils::filename::CourseFilePath;

/// Everything the save-and-sync job needs, owned so it can outlive the request.
#[derive(Debug, Clone)]
pub struct SaveAndSyncRequest {
    pub course: course::Model,
    pub path: CourseFilePath,
    pub contents: Vec<u8>,
    pub orig_hash: String,
}

/// Write the draft to disk, then sync the course.
///
/// The write is refused when the file on disk no longer matches the hash the
/// user started from. Outcome flags are recorded on the job sequence as each
/// step starts and succeeds.
pub async fn save_and_sync(
    db: DatabaseConnection,
    request: SaveAndSyncRequest,
    job: ServerJob,
) -> anyhow::Result<()> {
    let mut outcome = SaveSyncOutcome {
        save_attempted: Some(true),
        ..Default::default()
    };
    job.set_outcome(outcome).await?;

    let full_path = request.path.full_path();
    job.info(format!("Saving {}", request.path.relative)).await;

    let on_disk = tokio::fs::read(&full_path)
        .await
        .with_context(|| format!("Failed to read {}", request.path.relative))?;
    if ContentHash::compute(&on_disk).to_hex() != request.orig_hash {
        bail!(
            "Another user changed {} since you started editing it",
            request.path.relative
        );
    }

    write_atomically(&full_path, &request.contents)
        .await
        .with_context(|| format!("Failed to write {}", request.path.relative))?;

    outcome.save_succeeded = Some(true);
    outcome.sync_attempted = Some(true);
    job.set_outcome(outcome).await?;
    job.info("Syncing course content").await;

    let report = sync_course(&db, &request.course)
        .await
        .context("Course sync failed")?;
    job.info(format!(
        "Synced {} questions, removed {}",
        report.questions_synced, report.questions_deleted
    ))
    .await;

    outcome.sync_succeeded = Some(true);
    job.set_outcome(outcome).await?;
    Ok(())
}

async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
