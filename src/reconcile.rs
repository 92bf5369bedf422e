//! Decides which manifest entries need uploading.
//!
//! Pure set difference over derived identifiers: the only I/O is reading
//! local files whose remote copy exists, to compare content hashes.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{Manifest, ManifestEntry};
use crate::contract::{AttachedRecord, RemoteRecord, UploadTarget, UploadTask};
use crate::error::SyncError;
use crate::hashing::hash_file;
use crate::identifier::derive_id;

/// Outcome of comparing the remote listing with the manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Uploads to perform, in manifest order.
    pub to_upload: Vec<UploadTask>,
    /// Manifest entries whose remote copy matches the local file.
    pub up_to_date: Vec<ManifestEntry>,
    /// Remote records with no manifest entry. Reported, never deleted.
    pub orphaned: Vec<AttachedRecord>,
}

/// Partitions `manifest` into up-to-date entries and upload tasks.
///
/// Placeholder records (no attachment) are treated as missing. A local file
/// that cannot be read aborts the whole reconciliation.
pub fn reconcile(
    remote_records: Vec<RemoteRecord>,
    manifest: &Manifest,
) -> Result<Reconciliation, SyncError> {
    let mut listing_order = Vec::new();
    let mut by_id: HashMap<String, AttachedRecord> = HashMap::new();
    for record in remote_records {
        match record.into_attached() {
            Ok(attached) => {
                listing_order.push(attached.id.clone());
                by_id.insert(attached.id.clone(), attached);
            }
            Err(placeholder) => {
                debug!(id = %placeholder.id, "Skipping remote record without attachment");
            }
        }
    }

    let mut result = Reconciliation::default();

    for entry in manifest.iter() {
        let filename = entry.filename();
        let record_id = derive_id(&filename);

        match by_id.remove(&record_id) {
            Some(record) => {
                let local_hash = hash_file(&entry.local_path)?;
                if local_hash == record.attachment.comparison_hash() {
                    info!(file = %filename, id = %record_id, "File is up-to-date");
                    result.up_to_date.push(entry.clone());
                } else {
                    info!(
                        file = %filename,
                        id = %record_id,
                        local_hash = %local_hash,
                        remote_hash = %record.attachment.comparison_hash(),
                        "File has changed"
                    );
                    result.to_upload.push(UploadTask {
                        local_path: entry.local_path.clone(),
                        target: UploadTarget::Existing(record),
                        manifest_platforms: entry.platforms.clone(),
                    });
                }
            }
            None => {
                info!(file = %filename, id = %record_id, "File is new");
                result.to_upload.push(UploadTask {
                    local_path: entry.local_path.clone(),
                    target: UploadTarget::New {
                        id: record_id,
                        platforms: entry.platforms.clone(),
                    },
                    manifest_platforms: entry.platforms.clone(),
                });
            }
        }
    }

    for id in listing_order {
        if let Some(record) = by_id.remove(&id) {
            info!(file = %record.attachment.filename, id = %record.id, "Ignore remote file");
            result.orphaned.push(record);
        }
    }

    info!(
        to_upload = result.to_upload.len(),
        up_to_date = result.up_to_date.len(),
        orphaned = result.orphaned.len(),
        "Reconciliation complete"
    );
    Ok(result)
}
