//! Draft-aware editing of files inside a course directory.
//!
//! Every draft read consumes the draft: it is soft-deleted before its
//! contents are loaded, so a draft that cannot be read never blocks the
//! editor again.

mod content;
mod draft;
mod reconcile;
mod save;

pub use content::{ace_mode, is_binary};
pub use draft::{
    DraftEdit, DraftKey, insert_file_edit, read_draft_edit, select_file_edit,
    soft_delete_file_edits, update_file_edit_job_sequence_id, write_draft_edit,
};
pub use reconcile::{EditSource, LinkedJob, Reconciliation, linked_job, reconcile};
pub use save::{SaveAndSyncRequest, save_and_sync};
