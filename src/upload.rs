//! # Uploader
//!
//! Turns an [`UploadTask`] into a multipart attachment upload and sends it
//! through a [`RecordStore`].
//!
//! Each upload carries three parts:
//! - `attachment`: the raw file bytes, with file name and MIME type
//! - `data`: JSON record attributes, currently only `platforms`
//! - `permissions`: JSON permissions, always `{}` (attachments inherit the
//!   collection's read grant)
//!
//! In dry-run mode nothing is sent; the would-be payload is printed on
//! stdout instead.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::CollectionRef;
use crate::contract::{AttachmentUpload, RecordStore, UploadTask};
use crate::error::SyncError;

/// Result of handling one upload task.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded { record_id: String, response: Value },
    DryRun { record_id: String },
}

impl UploadOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            UploadOutcome::Uploaded { record_id, .. } | UploadOutcome::DryRun { record_id } => {
                record_id
            }
        }
    }
}

/// MIME type for `path`, from its extension.
///
/// `.ttf` is pinned to `application/x-font-ttf`, which is what the server
/// side has always received for TrueType files.
pub fn guess_mimetype(path: &Path) -> Result<String, SyncError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    if extension.as_deref() == Some("ttf") {
        return Ok("application/x-font-ttf".to_string());
    }
    mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string)
        .ok_or_else(|| SyncError::UnrecognizedMimeType(path.to_path_buf()))
}

/// Reads the file behind `task` and builds its multipart payload.
///
/// The MIME type is checked before the file is read.
pub fn build_upload(task: &UploadTask) -> Result<AttachmentUpload, SyncError> {
    let path = task.local_path.as_path();
    let mimetype = guess_mimetype(path).map_err(|e| {
        error!(path = %path.display(), "Could not recognize the mimetype");
        e
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = fs::read(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to read file for upload");
        SyncError::filesystem(path, e)
    })?;

    let data = serde_json::to_string(&json!({ "platforms": task.platforms() }))?;
    let permissions = serde_json::to_string(&json!({}))?;

    Ok(AttachmentUpload {
        record_id: task.record_id().to_string(),
        filename,
        mimetype,
        content,
        data,
        permissions,
    })
}

#[derive(Serialize)]
struct DryRunPayload<'a> {
    data: &'a str,
    permissions: &'a str,
    attachment: DryRunAttachment<'a>,
}

#[derive(Serialize)]
struct DryRunAttachment<'a> {
    filename: &'a str,
    mimetype: &'a str,
    size: usize,
}

/// Uploads one task, or prints what would be uploaded when `dry_run` is set.
pub async fn upload<S>(
    store: &S,
    collection: &CollectionRef,
    task: &UploadTask,
    dry_run: bool,
) -> Result<UploadOutcome, SyncError>
where
    S: RecordStore + ?Sized,
{
    let upload = build_upload(task)?;
    let record_id = upload.record_id.clone();
    info!(
        file = %upload.filename,
        id = %record_id,
        size = upload.content.len(),
        new_record = task.is_new(),
        "Uploading attachment"
    );

    if dry_run {
        let payload = DryRunPayload {
            data: &upload.data,
            permissions: &upload.permissions,
            attachment: DryRunAttachment {
                filename: &upload.filename,
                mimetype: &upload.mimetype,
                size: upload.content.len(),
            },
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(UploadOutcome::DryRun { record_id });
    }

    let response = store
        .upload_attachment(collection, upload)
        .await
        .map_err(|e| {
            error!(id = %record_id, error = %e, "Attachment upload failed");
            e
        })?;
    debug!(id = %record_id, %response, "Attachment uploaded");
    Ok(UploadOutcome::Uploaded {
        record_id,
        response,
    })
}
