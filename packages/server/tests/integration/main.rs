mod common;
mod file_edit;
mod job_sequence;
