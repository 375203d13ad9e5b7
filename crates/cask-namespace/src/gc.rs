//! Mark-and-sweep garbage collection of one namespace.
//!
//! Live refs are the roots. Every blob reachable from a root through
//! reference tables is kept; every other catalogued blob is deleted once
//! its last write is at least the namespace's GC delay in the past.
//! Writing, referencing, or pointing a ref at a blob counts as a write.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use cask_refs::RefManager;
use cask_store::{BlobStore, StoreError};
use cask_types::{ContentHash, HashedBlobRef, Timestamp};

use crate::error::NamespaceResult;

/// What one collection pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
    /// Expired refs removed before marking.
    pub refs_purged: usize,
    /// Live refs used as roots.
    pub roots: usize,
    /// Blobs reached from the roots, catalogued or not.
    pub blobs_reachable: usize,
    /// Catalogued blobs considered for sweeping.
    pub blobs_scanned: usize,
    pub blobs_deleted: usize,
    /// Unreachable blobs kept because they were written too recently.
    pub blobs_deferred: usize,
}

/// Run one mark-and-sweep pass.
pub(crate) async fn collect(
    store: &BlobStore,
    refs: &RefManager,
    gc_delay: Duration,
    now: Timestamp,
) -> NamespaceResult<GcReport> {
    let mut report = GcReport {
        refs_purged: refs.purge_expired().await?,
        ..GcReport::default()
    };

    let roots: Vec<HashedBlobRef> = refs
        .list_live()
        .await?
        .into_iter()
        .map(|record| record.target)
        .collect();
    report.roots = roots.len();

    let reachable = mark(store, roots).await?;
    report.blobs_reachable = reachable.len();

    let cutoff = chrono::Duration::from_std(gc_delay)
        .ok()
        .and_then(|delay| now.checked_sub_signed(delay));
    for (hash, entry) in store.catalog_snapshot() {
        report.blobs_scanned += 1;
        if reachable.contains(&hash) {
            continue;
        }
        // The store re-checks the age under the blob's lock, so a blob
        // rewritten or referenced since the snapshot is deferred too.
        let deleted = match cutoff.filter(|cutoff| entry.last_written <= *cutoff) {
            Some(cutoff) => store.delete_blob(&hash, cutoff).await?,
            None => false,
        };
        if deleted {
            report.blobs_deleted += 1;
        } else {
            report.blobs_deferred += 1;
        }
    }

    Ok(report)
}

/// Every hash reachable from `roots`. Tolerates cycles and blobs that can
/// no longer be read.
async fn mark(store: &BlobStore, roots: Vec<HashedBlobRef>) -> NamespaceResult<HashSet<ContentHash>> {
    let mut visited = HashSet::new();
    let mut pending = roots;
    while let Some(target) = pending.pop() {
        if !visited.insert(target.hash) {
            continue;
        }
        match store.imports_of(&target).await {
            Ok(imports) => pending.extend(imports),
            Err(err @ (StoreError::BlobNotFound { .. } | StoreError::CorruptBlob { .. })) => {
                warn!(target = %target, error = %err, "unreadable blob during gc mark");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(visited)
}
