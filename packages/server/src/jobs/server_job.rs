use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use common::JobSequenceStatus;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{error, info};

use crate::entity::{job, job_sequence};

/// What a job sequence is about, recorded when it is prepared.
#[derive(Debug, Clone)]
pub struct ServerJobOptions {
    pub course_id: Option<i32>,
    pub user_id: i32,
    pub authn_user_id: i32,
    pub job_type: String,
    pub description: String,
}

/// Structured outcome of a save-and-sync job. Steps that were never reached
/// stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSyncOutcome {
    pub save_attempted: Option<bool>,
    pub save_succeeded: Option<bool>,
    pub sync_attempted: Option<bool>,
    pub sync_succeeded: Option<bool>,
}

/// Handle to a prepared job sequence with a single job.
///
/// Cloning is cheap; all clones append to the same output log.
#[derive(Clone)]
pub struct ServerJob {
    db: DatabaseConnection,
    pub job_sequence_id: i32,
    pub job_id: i32,
    output: Arc<Mutex<String>>,
}

/// Insert a `Running` job sequence and its job.
pub async fn prepare_server_job(
    db: &DatabaseConnection,
    options: ServerJobOptions,
) -> Result<ServerJob, DbErr> {
    let now = Utc::now();

    let sequence = job_sequence::ActiveModel {
        course_id: Set(options.course_id),
        user_id: Set(options.user_id),
        authn_user_id: Set(options.authn_user_id),
        job_type: Set(options.job_type.clone()),
        description: Set(options.description),
        status: Set(JobSequenceStatus::Running),
        legacy: Set(false),
        save_attempted: Set(None),
        save_succeeded: Set(None),
        sync_attempted: Set(None),
        sync_succeeded: Set(None),
        start_date: Set(now),
        finish_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let job = job::ActiveModel {
        job_sequence_id: Set(sequence.id),
        status: Set(JobSequenceStatus::Running),
        output: Set(String::new()),
        error_message: Set(None),
        start_date: Set(now),
        finish_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        job_sequence_id = sequence.id,
        job_type = %options.job_type,
        "Prepared server job"
    );

    Ok(ServerJob {
        db: db.clone(),
        job_sequence_id: sequence.id,
        job_id: job.id,
        output: Arc::new(Mutex::new(String::new())),
    })
}

impl ServerJob {
    /// Append a line to the job output.
    pub async fn info(&self, line: impl AsRef<str>) {
        self.append(line.as_ref()).await;
    }

    /// Append an error line to the job output. Does not fail the job.
    pub async fn error(&self, line: impl AsRef<str>) {
        self.append(&format!("ERROR: {}", line.as_ref())).await;
    }

    async fn append(&self, line: &str) {
        let snapshot = {
            let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
            output.push_str(line);
            output.push('\n');
            output.clone()
        };

        if let Err(e) = job::Entity::update_many()
            .col_expr(job::Column::Output, Expr::value(snapshot))
            .filter(job::Column::Id.eq(self.job_id))
            .exec(&self.db)
            .await
        {
            error!(job_id = self.job_id, error = %e, "Failed to write job output");
        }
    }

    /// Record the structured outcome on the job sequence.
    pub async fn set_outcome(&self, outcome: SaveSyncOutcome) -> Result<(), DbErr> {
        job_sequence::Entity::update_many()
            .col_expr(
                job_sequence::Column::SaveAttempted,
                Expr::value(outcome.save_attempted),
            )
            .col_expr(
                job_sequence::Column::SaveSucceeded,
                Expr::value(outcome.save_succeeded),
            )
            .col_expr(
                job_sequence::Column::SyncAttempted,
                Expr::value(outcome.sync_attempted),
            )
            .col_expr(
                job_sequence::Column::SyncSucceeded,
                Expr::value(outcome.sync_succeeded),
            )
            .filter(job_sequence::Column::Id.eq(self.job_sequence_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Run `body` to completion, then mark the job and its sequence as
    /// `Success` or `Error`. The body's error is returned to the caller after
    /// it has been recorded.
    pub async fn execute<F, Fut, T>(&self, body: F) -> anyhow::Result<T>
    where
        F: FnOnce(ServerJob) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let result = body(self.clone()).await;

        let (status, error_message) = match &result {
            Ok(_) => (JobSequenceStatus::Success, None),
            Err(e) => {
                self.error(format!("{e:#}")).await;
                (JobSequenceStatus::Error, Some(format!("{e:#}")))
            }
        };

        if let Err(e) = self.finish(status, error_message).await {
            error!(
                job_sequence_id = self.job_sequence_id,
                error = %e,
                "Failed to record job completion"
            );
        }

        info!(
            job_sequence_id = self.job_sequence_id,
            status = %status,
            "Server job finished"
        );

        result
    }

    /// Like [`execute`](Self::execute), but detached from the caller.
    pub fn execute_in_background<F, Fut, T>(&self, body: F)
    where
        F: FnOnce(ServerJob) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let job = self.clone();
        tokio::spawn(async move {
            let _ = job.execute(body).await;
        });
    }

    async fn finish(
        &self,
        status: JobSequenceStatus,
        error_message: Option<String>,
    ) -> Result<(), DbErr> {
        let now = Utc::now();

        let job = job::ActiveModel {
            id: Set(self.job_id),
            status: Set(status),
            error_message: Set(error_message),
            finish_date: Set(Some(now)),
            ..Default::default()
        };
        job.update(&self.db).await?;

        let sequence = job_sequence::ActiveModel {
            id: Set(self.job_sequence_id),
            status: Set(status),
            finish_date: Set(Some(now)),
            ..Default::default()
        };
        sequence.update(&self.db).await?;

        Ok(())
    }
}
