//! Runtime configuration: the font manifest, credentials and the target
//! collection. All of it is built once at startup and passed explicitly
//! into the pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SyncError;

/// One local file to keep synchronised, tagged with its target platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "path")]
    pub local_path: PathBuf,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl ManifestEntry {
    pub fn new(local_path: impl Into<PathBuf>, platforms: &[&str]) -> Self {
        Self {
            local_path: local_path.into(),
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Base name of the local path; the remote identifier is derived from it.
    pub fn filename(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordered list of files to synchronise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

const MAC_LINUX: &[&str] = &["macosx", "linux"];
const MAC_WIN_LINUX: &[&str] = &["macosx", "win", "linux"];
const LINUX: &[&str] = &["linux"];

const DEFAULT_FONTS: &[(&str, &[&str])] = &[
    ("./fonts/noto-fonts/hinted/NotoSansArmenian-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansBengali-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansDevanagari-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansEthiopic-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansGujarati-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansGurmukhi-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansKannada-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansKhmer-Regular.ttf", MAC_WIN_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansLao-Regular.ttf", MAC_WIN_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansMalayalam-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansMyanmar-Regular.ttf", MAC_WIN_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansOriya-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansSinhala-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansTamil-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansTelugu-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansThaana-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansTibetan-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/unhinted/NotoSansCanadianAboriginal-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/unhinted/NotoSansBuginese-Regular.ttf", MAC_WIN_LINUX),
    ("./fonts/noto-fonts/unhinted/NotoSansCherokee-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/unhinted/NotoSansMongolian-Regular.ttf", MAC_LINUX),
    ("./fonts/noto-fonts/unhinted/NotoSansYi-Regular.ttf", MAC_WIN_LINUX),
    ("./fonts/stix-fonts/fonts/STIXMath-Regular.otf", MAC_LINUX),
    ("./fonts/google-fonts/apache/arimo/Arimo-Regular.ttf", LINUX),
    ("./fonts/google-fonts/apache/arimo/Arimo-Bold.ttf", LINUX),
    ("./fonts/google-fonts/apache/arimo/Arimo-Italic.ttf", LINUX),
    ("./fonts/google-fonts/apache/arimo/Arimo-BoldItalic.ttf", LINUX),
    ("./fonts/google-fonts/apache/cousine/Cousine-Regular.ttf", LINUX),
    ("./fonts/google-fonts/apache/tinos/Tinos-Regular.ttf", LINUX),
    ("./fonts/google-fonts/apache/tinos/Tinos-Bold.ttf", LINUX),
    ("./fonts/google-fonts/apache/tinos/Tinos-Italic.ttf", LINUX),
    ("./fonts/google-fonts/apache/tinos/Tinos-BoldItalic.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoNaskhArabic-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansGeorgian-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansHebrew-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSansThai-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSerifArmenian-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSerifKhmer-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSerifLao-Regular.ttf", LINUX),
    ("./fonts/noto-fonts/hinted/NotoSerifThai-Regular.ttf", LINUX),
    ("./fonts/noto-emoji/fonts/NotoEmoji-Regular.ttf", LINUX),
    ("./fonts/noto-cjk/NotoSansJP-Regular.otf", LINUX),
    ("./fonts/noto-cjk/NotoSansKR-Regular.otf", LINUX),
    ("./fonts/noto-cjk/NotoSansSC-Regular.otf", LINUX),
    ("./fonts/noto-cjk/NotoSansTC-Regular.otf", LINUX),
];

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// The compiled-in font list, paths relative to the working directory.
    pub fn default_fonts() -> Self {
        Self::new(
            DEFAULT_FONTS
                .iter()
                .map(|(path, platforms)| ManifestEntry::new(*path, platforms))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn trace_loaded(&self) {
        info!(entries = self.entries.len(), "Loaded manifest");
        debug!(?self, "Manifest loaded (full debug)");
    }
}

/// Basic-auth credentials given as `user:pass`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl FromStr for Credentials {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (username, password) = raw.split_once(':').ok_or(SyncError::InvalidCredentials)?;
        if username.is_empty() {
            return Err(SyncError::InvalidCredentials);
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A records collection inside a bucket, addressed by its server URL.
///
/// Accepts `{server}/buckets/{bucket}/collections/{collection}` with or
/// without a trailing `/records` segment or slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub bucket: String,
    pub collection: String,
    bucket_url: String,
    collection_url: String,
}

impl CollectionRef {
    pub fn parse(url: &str) -> Result<Self, SyncError> {
        let invalid = |reason: &str| SyncError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix("/records").unwrap_or(trimmed);

        let segments: Vec<&str> = trimmed.rsplitn(5, '/').collect();
        // rsplitn yields [collection, "collections", bucket, "buckets", server]
        match segments.as_slice() {
            [collection, "collections", bucket, "buckets", server]
                if !collection.is_empty() && !bucket.is_empty() && !server.is_empty() =>
            {
                let bucket_url = format!("{server}/buckets/{bucket}");
                let collection_url = format!("{bucket_url}/collections/{collection}");
                Ok(Self {
                    bucket: bucket.to_string(),
                    collection: collection.to_string(),
                    bucket_url,
                    collection_url,
                })
            }
            _ => Err(invalid(
                "expected {server}/buckets/{bucket}/collections/{collection}",
            )),
        }
    }

    pub fn bucket_url(&self) -> &str {
        &self.bucket_url
    }

    pub fn collections_url(&self) -> String {
        format!("{}/collections", self.bucket_url)
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn records_url(&self) -> String {
        format!("{}/records", self.collection_url)
    }

    pub fn attachment_url(&self, record_id: &str) -> String {
        format!("{}/{}/attachment?gzipped=true", self.records_url(), record_id)
    }
}

/// Everything a single synchronisation run needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub collection: CollectionRef,
    pub manifest: Manifest,
    /// Ensure bucket and collection exist before uploading.
    pub create_collection: bool,
    /// Only read from the server; print what would be sent.
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.collection.bucket,
            collection = %self.collection.collection,
            entries = self.manifest.len(),
            create_collection = self.create_collection,
            dry_run = self.dry_run,
            "Loaded SyncConfig"
        );
    }
}

