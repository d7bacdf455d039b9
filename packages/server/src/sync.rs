//! Load course configuration from disk into the database.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::entity::{course, question};
use crate::question::QuestionInfo;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Debug, Deserialize)]
struct InfoCourse {
    title: String,
}

/// Counts reported back to the sync job output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub questions_synced: usize,
    pub questions_deleted: usize,
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SyncError> {
    let raw = tokio::fs::read(path).await.map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| SyncError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Find every directory below `questions/` that holds an `info.json`.
/// Returns `(qid, info)` pairs where the qid is the `/`-joined relative path.
async fn discover_questions(course_root: &Path) -> Result<Vec<(String, QuestionInfo)>, SyncError> {
    let questions_root = course_root.join("questions");
    if !tokio::fs::try_exists(&questions_root)
        .await
        .map_err(|source| SyncError::Io {
            path: questions_root.clone(),
            source,
        })?
    {
        return Ok(vec![]);
    }

    let mut found = Vec::new();
    let mut pending = vec![questions_root.clone()];

    while let Some(dir) = pending.pop() {
        let info_path = dir.join("info.json");
        let has_info = dir != questions_root
            && tokio::fs::try_exists(&info_path)
                .await
                .map_err(|source| SyncError::Io {
                    path: info_path.clone(),
                    source,
                })?;
        if has_info {
            let info: QuestionInfo = read_json(&info_path).await?;
            let qid = dir
                .strip_prefix(&questions_root)
                .unwrap_or(&dir)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            found.push((qid, info));
            continue;
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| SyncError::Io {
                path: dir.clone(),
                source,
            })?;
        while let Some(entry) = entries.next_entry().await.map_err(|source| SyncError::Io {
            path: dir.clone(),
            source,
        })? {
            let file_type = entry.file_type().await.map_err(|source| SyncError::Io {
                path: entry.path(),
                source,
            })?;
            if file_type.is_dir() {
                pending.push(entry.path());
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// Sync `course` from its directory.
///
/// Everything is parsed before the database is touched, so a course with a
/// broken `info.json` leaves the previous state in place.
#[instrument(skip(db, course), fields(course_id = course.id))]
pub async fn sync_course(
    db: &DatabaseConnection,
    course: &course::Model,
) -> Result<SyncReport, SyncError> {
    let root = PathBuf::from(&course.path);
    let info_course: InfoCourse = read_json(&root.join("infoCourse.json")).await?;
    let questions = discover_questions(&root).await?;

    let txn = db.begin().await?;
    let now = Utc::now();

    if info_course.title != course.title {
        let mut active: course::ActiveModel = course.clone().into();
        active.title = Set(info_course.title);
        active.update(&txn).await?;
    }

    let existing = question::Entity::find()
        .filter(question::Column::CourseId.eq(course.id))
        .all(&txn)
        .await?;

    let mut seen = HashSet::new();
    for (qid, info) in &questions {
        seen.insert(qid.as_str());
        match existing.iter().find(|q| &q.qid == qid) {
            Some(q) => {
                let mut active: question::ActiveModel = q.clone().into();
                active.title = Set(info.title.clone());
                active.shared_publicly = Set(info.share_publicly);
                active.has_workspace = Set(info.workspace);
                active.deleted_at = Set(None);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
            None => {
                question::ActiveModel {
                    course_id: Set(course.id),
                    qid: Set(qid.clone()),
                    title: Set(info.title.clone()),
                    shared_publicly: Set(info.share_publicly),
                    has_workspace: Set(info.workspace),
                    deleted_at: Set(None),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    let mut questions_deleted = 0;
    for q in existing
        .iter()
        .filter(|q| q.deleted_at.is_none() && !seen.contains(q.qid.as_str()))
    {
        let mut active: question::ActiveModel = q.clone().into();
        active.deleted_at = Set(Some(now));
        active.update(&txn).await?;
        questions_deleted += 1;
    }

    txn.commit().await?;

    let report = SyncReport {
        questions_synced: questions.len(),
        questions_deleted,
    };
    info!(?report, "Synced course");
    Ok(report)
}
