//! # contract: remote data model and the record store seam
//!
//! This module defines the wire types returned by the attachments server and
//! the [`RecordStore`] trait through which every remote call is made.
//!
//! - The real HTTP implementation lives in [`crate::client`].
//! - The trait is annotated for `mockall` so the pipeline can be exercised
//!   without a server (`MockRecordStore`, behind the `test-export-mocks`
//!   feature).
//!
//! Records come in two shapes: placeholders without an attachment and
//! records that carry one. [`RemoteRecord::into_attached`] turns the latter
//! into an [`AttachedRecord`], so code that needs a remote hash can only be
//! handed records that have one.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CollectionRef;
use crate::error::SyncError;

/// Principal granting read access to anonymous users.
pub const EVERYONE: &str = "system.Everyone";

/// A record as listed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    /// Server-side fields (`last_modified`, schema, ...) kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RemoteRecord {
    /// Splits records carrying an attachment from placeholders.
    pub fn into_attached(self) -> Result<AttachedRecord, RemoteRecord> {
        match self.attachment {
            Some(attachment) => Ok(AttachedRecord {
                id: self.id,
                attachment,
                platforms: self.platforms,
                extra: self.extra,
            }),
            None => Err(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub hash: String,
    #[serde(default)]
    pub filename: String,
    /// Present when the server stored a compressed copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalAttachment>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Attachment {
    /// Hash to compare against uncompressed local bytes: the original
    /// content hash when the server recorded one, the stored hash otherwise.
    pub fn comparison_hash(&self) -> &str {
        self.original
            .as_ref()
            .and_then(|original| original.hash.as_deref())
            .filter(|hash| !hash.is_empty())
            .unwrap_or(&self.hash)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalAttachment {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A remote record known to carry an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedRecord {
    pub id: String,
    pub attachment: Attachment,
    pub platforms: Option<Vec<String>>,
    pub extra: BTreeMap<String, Value>,
}

/// Which record an upload writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadTarget {
    /// Stale remote copy; the record keeps its id and server-side fields.
    Existing(AttachedRecord),
    /// No remote copy yet.
    New { id: String, platforms: Vec<String> },
}

/// One file to upload and the record it goes to.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub target: UploadTarget,
    /// Platform tags from the manifest entry.
    pub manifest_platforms: Vec<String>,
}

impl UploadTask {
    pub fn record_id(&self) -> &str {
        match &self.target {
            UploadTarget::Existing(record) => &record.id,
            UploadTarget::New { id, .. } => id,
        }
    }

    /// Platform tags sent as attachment metadata. Existing records keep
    /// their remote tags unless they have none.
    pub fn platforms(&self) -> &[String] {
        match &self.target {
            UploadTarget::Existing(record) => record
                .platforms
                .as_deref()
                .unwrap_or(&self.manifest_platforms),
            UploadTarget::New { platforms, .. } => platforms,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self.target, UploadTarget::New { .. })
    }
}

/// Access control lists keyed by permission name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read: Vec<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Vec<String>>,
}

impl Permissions {
    pub fn public_read() -> Self {
        Self {
            read: vec![EVERYONE.to_string()],
            other: BTreeMap::new(),
        }
    }

    pub fn grants_public_read(&self) -> bool {
        self.read.iter().any(|principal| principal == EVERYONE)
    }
}

/// A bucket as returned by `GET {bucket_url}`; only its permissions matter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub permissions: Permissions,
}

/// A fully built attachment upload, ready to be sent as multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    pub record_id: String,
    pub filename: String,
    pub mimetype: String,
    pub content: Vec<u8>,
    /// JSON-encoded record attributes (`{"platforms": [...]}`).
    pub data: String,
    /// JSON-encoded attachment permissions.
    pub permissions: String,
}

/// Remote operations needed by a synchronisation run.
///
/// Implementations map every non-success response to
/// [`SyncError::Transport`]; callers never retry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every record of the collection.
    async fn fetch_records(&self, collection: &CollectionRef)
        -> Result<Vec<RemoteRecord>, SyncError>;

    /// Fetch the parent bucket; `None` when it cannot be read.
    async fn fetch_bucket(&self, collection: &CollectionRef) -> Result<Option<Bucket>, SyncError>;

    async fn create_bucket(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<(), SyncError>;

    async fn patch_bucket_permissions(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<(), SyncError>;

    /// Create (or overwrite) the collection record itself.
    async fn create_collection(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<Value, SyncError>;

    /// Upload one attachment, creating the record if needed.
    async fn upload_attachment(
        &self,
        collection: &CollectionRef,
        upload: AttachmentUpload,
    ) -> Result<Value, SyncError>;
}
