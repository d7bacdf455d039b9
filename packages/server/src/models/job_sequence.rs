use chrono::{DateTime, Utc};
use common::JobSequenceStatus;
use serde::Serialize;

use crate::entity::job;
use crate::jobs::JobSequenceWithOutput;

#[derive(Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub id: i32,
    #[schema(example = "Success")]
    pub status: JobSequenceStatus,
    pub output: String,
    pub error_message: Option<String>,
    pub start_date: DateTime<Utc>,
    pub finish_date: Option<DateTime<Utc>>,
}

impl From<job::Model> for JobResponse {
    fn from(job: job::Model) -> Self {
        Self {
            id: job.id,
            status: job.status,
            output: job.output,
            error_message: job.error_message,
            start_date: job.start_date,
            finish_date: job.finish_date,
        }
    }
}

/// A job sequence with its outcome flags and job logs.
#[derive(Serialize, utoipa::ToSchema)]
pub struct JobSequenceResponse {
    pub id: i32,
    pub course_id: Option<i32>,
    pub user_id: i32,
    #[schema(example = "file_edit")]
    pub job_type: String,
    pub description: String,
    #[schema(example = "Running")]
    pub status: JobSequenceStatus,
    pub legacy: bool,
    pub save_attempted: Option<bool>,
    pub save_succeeded: Option<bool>,
    pub sync_attempted: Option<bool>,
    pub sync_succeeded: Option<bool>,
    pub start_date: DateTime<Utc>,
    pub finish_date: Option<DateTime<Utc>>,
    pub jobs: Vec<JobResponse>,
}

impl From<JobSequenceWithOutput> for JobSequenceResponse {
    fn from(JobSequenceWithOutput { sequence, jobs }: JobSequenceWithOutput) -> Self {
        Self {
            id: sequence.id,
            course_id: sequence.course_id,
            user_id: sequence.user_id,
            job_type: sequence.job_type,
            description: sequence.description,
            status: sequence.status,
            legacy: sequence.legacy,
            save_attempted: sequence.save_attempted,
            save_succeeded: sequence.save_succeeded,
            sync_attempted: sequence.sync_attempted,
            sync_succeeded: sequence.sync_succeeded,
            start_date: sequence.start_date,
            finish_date: sequence.finish_date,
            jobs: jobs.into_iter().map(JobResponse::from).collect(),
        }
    }
}

/// Returned when a job is started in the background.
#[derive(Serialize, utoipa::ToSchema)]
pub struct JobStartedResponse {
    pub job_sequence_id: i32,
}
