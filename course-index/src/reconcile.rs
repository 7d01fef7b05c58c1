//! Reconciliation between the metadata store and the vector index.
//!
//! Deleting a document that does not cascade into the vector index, or a
//! crash mid-ingestion, leaves orphaned chunks behind. Reconciliation
//! compares the store's live document ids against the ids present in the
//! index and reclaims the difference.
//!
//! This is advisory cleanup, run on a schedule or on demand, never a
//! correctness-critical path invoked synchronously from ingestion. It may
//! race with ingestion for the same course; a document can appear
//! "orphaned" transiently between its creation in the metadata store and
//! its first successful ingestion, which is tolerated by design instead of
//! prevented with locks.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::errors::IndexError;
use crate::index::VectorIndex;
use crate::metadata::CourseStore;

/// Outcome of one reconciliation pass.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileReport {
    /// Documents present in both the metadata store and the index.
    pub valid_docs: usize,
    /// Documents found in the index with no live metadata record.
    pub orphaned_docs: usize,
    /// Chunks deleted while reclaiming orphans.
    pub deleted_chunks: u64,
}

/// Reconciles one course: deletes chunks whose document no longer exists.
///
/// Failures while deleting an individual orphan are logged and skipped;
/// they never abort the whole pass.
///
/// # Errors
/// Returns [`IndexError::Metadata`] if the store cannot be read and
/// [`IndexError::Unavailable`] if the index scan itself fails.
pub async fn reconcile(
    course_id: &str,
    store: &dyn CourseStore,
    index: &dyn VectorIndex,
) -> Result<ReconcileReport, IndexError> {
    let live: HashSet<String> = store
        .document_ids_for_course(course_id)
        .await?
        .into_iter()
        .collect();
    let stored = index.scroll_document_ids(course_id).await?;

    let valid_docs = stored.intersection(&live).count();
    let orphans: Vec<&String> = stored.difference(&live).collect();

    let mut deleted_chunks = 0u64;
    for document_id in &orphans {
        match index.delete_by_document(document_id).await {
            Ok(n) => {
                info!(course_id, document_id = %document_id, deleted = n, "reclaimed orphaned chunks");
                deleted_chunks += n;
            }
            Err(err) => {
                warn!(
                    course_id,
                    document_id = %document_id,
                    error = %err,
                    "failed to reclaim orphan; skipping"
                );
            }
        }
    }

    let report = ReconcileReport {
        valid_docs,
        orphaned_docs: orphans.len(),
        deleted_chunks,
    };
    info!(
        course_id,
        valid = report.valid_docs,
        orphaned = report.orphaned_docs,
        deleted_chunks = report.deleted_chunks,
        "reconciliation pass finished"
    );
    Ok(report)
}
