use common::JobSequenceStatus;
use tracing::warn;

use crate::entity::job_sequence;

/// State of the save-and-sync job a draft points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedJob {
    /// The job has not finished; the editor hands over to the job page.
    Running { job_sequence_id: i32 },
    Finished { did_save: bool, did_sync: bool },
}

/// Classify a job sequence linked from a draft.
///
/// Legacy sequences carry no outcome flags and are reported as neither
/// saved nor synced. Unset flags count as not succeeded.
pub fn linked_job(sequence: &job_sequence::Model) -> LinkedJob {
    if sequence.status == JobSequenceStatus::Running {
        return LinkedJob::Running {
            job_sequence_id: sequence.id,
        };
    }
    if sequence.legacy {
        warn!(
            job_sequence_id = sequence.id,
            "Draft links a legacy job sequence without outcome flags"
        );
        return LinkedJob::Finished {
            did_save: false,
            did_sync: false,
        };
    }
    LinkedJob::Finished {
        did_save: sequence.save_succeeded.unwrap_or(false),
        did_sync: sequence.sync_succeeded.unwrap_or(false),
    }
}

/// Which contents the editor starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    Disk,
    Draft,
}

/// Flags shown alongside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub did_save: bool,
    pub did_sync: bool,
    /// Report the outcome of the job that last handled this draft.
    pub alert_results: bool,
    /// The file changed on disk since the draft was started, and the draft
    /// never made it to disk. The user must pick a version.
    pub alert_choice: bool,
    /// The draft was started from the current disk contents.
    pub has_same_hash: bool,
    pub source: EditSource,
}

/// Decide what the editor shows given the current disk hash, the consumed
/// draft's original hash, and the outcome of its job.
///
/// A draft with no linked job (or one whose job was never reached) counts
/// as not saved.
pub fn reconcile(
    disk_hash: &str,
    draft_orig_hash: Option<&str>,
    job: Option<LinkedJob>,
) -> Reconciliation {
    let (did_save, did_sync, alert_results) = match job {
        Some(LinkedJob::Finished { did_save, did_sync }) => (did_save, did_sync, true),
        _ => (false, false, false),
    };

    let Some(orig_hash) = draft_orig_hash else {
        return Reconciliation {
            did_save,
            did_sync,
            alert_results: false,
            alert_choice: false,
            has_same_hash: false,
            source: EditSource::Disk,
        };
    };

    let has_same_hash = orig_hash == disk_hash;
    let alert_choice = !did_save && !has_same_hash;
    let source = if did_save {
        EditSource::Disk
    } else {
        EditSource::Draft
    };

    Reconciliation {
        did_save,
        did_sync,
        alert_results,
        alert_choice,
        has_same_hash,
        source,
    }
}
