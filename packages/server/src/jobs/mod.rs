//! Server jobs: units of work tracked in the database as job sequences so
//! that users can watch their progress and outcome after the request ends.

mod sequence;
mod server_job;

pub use sequence::{JobSequenceWithOutput, find_job_sequence, job_sequence_with_output};
pub use server_job::{SaveSyncOutcome, ServerJob, ServerJobOptions, prepare_server_job};
