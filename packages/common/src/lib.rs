pub mod job_status;
pub mod roles;
pub mod storage;

pub use job_status::JobSequenceStatus;
pub use roles::{CourseInstanceRole, CourseRole};
