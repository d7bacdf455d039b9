pub mod auth;
pub mod course;
pub mod file_edit;
pub mod job_sequence;
pub mod question;
pub mod workspace;
