pub mod assessment;
pub mod assessment_question;
pub mod course;
pub mod course_instance;
pub mod course_instance_permission;
pub mod course_permission;
pub mod enrollment;
pub mod file;
pub mod file_edit;
pub mod job;
pub mod job_sequence;
pub mod question;
pub mod submission;
pub mod user;
pub mod variant;
pub mod workspace;
