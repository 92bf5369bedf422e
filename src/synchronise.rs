//! High-level pipeline: provision → fetch → reconcile → upload.
//!
//! This module provides the top-level orchestration of one synchronisation
//! run against a [`RecordStore`]:
//!   - Optionally ensures the bucket and collection exist ([`ensure_container`])
//!   - Lists the remote records once
//!   - Reconciles them with the manifest ([`reconcile`])
//!   - Uploads every stale or missing file, one at a time, in manifest order
//!
//! # Error Handling
//! Fail-fast: the first error from any step is returned as-is and nothing
//! after it runs. Nothing is checkpointed; a re-run recomputes the diff and
//! only re-uploads what is still stale.

use tracing::{error, info};

use crate::config::SyncConfig;
use crate::contract::RecordStore;
use crate::error::SyncError;
use crate::provision::ensure_container;
use crate::reconcile::reconcile;
use crate::upload::{upload, UploadOutcome};

/// What a run did (or, in dry-run mode, would have done).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub uploaded: Vec<UploadedFileReport>,
    /// File names already matching their remote copy.
    pub up_to_date: Vec<String>,
    /// Remote attachment file names absent from the manifest.
    pub orphaned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFileReport {
    pub record_id: String,
    pub file_name: String,
    pub new_record: bool,
}

pub async fn synchronise<S>(config: &SyncConfig, store: &S) -> Result<SyncReport, SyncError>
where
    S: RecordStore + ?Sized,
{
    config.trace_loaded();
    info!("[SYNC] Starting synchronisation");

    if config.create_collection {
        info!("[SYNC] Ensuring bucket and collection");
        ensure_container(store, &config.collection, config.dry_run)
            .await
            .map_err(|e| {
                error!(error = %e, "[SYNC][ERROR] Provisioning failed");
                e
            })?;
    }

    let records = store.fetch_records(&config.collection).await.map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Failed to fetch remote records");
        e
    })?;

    let reconciliation = reconcile(records, &config.manifest).map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Reconciliation failed");
        e
    })?;

    let mut report = SyncReport {
        dry_run: config.dry_run,
        up_to_date: reconciliation
            .up_to_date
            .iter()
            .map(|entry| entry.filename())
            .collect(),
        orphaned: reconciliation
            .orphaned
            .iter()
            .map(|record| record.attachment.filename.clone())
            .collect(),
        ..SyncReport::default()
    };

    for task in &reconciliation.to_upload {
        let outcome = upload(store, &config.collection, task, config.dry_run)
            .await
            .map_err(|e| {
                error!(file = %task.local_path.display(), error = %e, "[SYNC][ERROR] Upload failed");
                e
            })?;
        if let UploadOutcome::Uploaded { record_id, .. } = &outcome {
            info!(id = %record_id, "[SYNC][UPLOAD] Attachment stored");
        }
        report.uploaded.push(UploadedFileReport {
            record_id: outcome.record_id().to_string(),
            file_name: task
                .local_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            new_record: task.is_new(),
        });
    }

    info!(
        uploaded = report.uploaded.len(),
        up_to_date = report.up_to_date.len(),
        orphaned = report.orphaned.len(),
        dry_run = report.dry_run,
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}
