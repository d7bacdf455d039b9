use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{job, job_sequence};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct JobSequenceWithOutput {
    pub sequence: job_sequence::Model,
    pub jobs: Vec<job::Model>,
}

/// Look up a job sequence belonging to `course_id`, returning 404 otherwise.
pub async fn find_job_sequence<C: ConnectionTrait>(
    db: &C,
    job_sequence_id: i32,
    course_id: i32,
) -> Result<job_sequence::Model, AppError> {
    job_sequence::Entity::find_by_id(job_sequence_id)
        .filter(job_sequence::Column::CourseId.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Job sequence not found".into()))
}

pub async fn job_sequence_with_output<C: ConnectionTrait>(
    db: &C,
    job_sequence_id: i32,
    course_id: i32,
) -> Result<JobSequenceWithOutput, AppError> {
    let sequence = find_job_sequence(db, job_sequence_id, course_id).await?;
    let jobs = job::Entity::find()
        .filter(job::Column::JobSequenceId.eq(sequence.id))
        .order_by_asc(job::Column::Id)
        .all(db)
        .await?;
    Ok(JobSequenceWithOutput { sequence, jobs })
}
