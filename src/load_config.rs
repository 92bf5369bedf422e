//! `load_config` module: loads a font manifest from a YAML file.
//!
//! Used when the CLI is given `--manifest`; otherwise the compiled-in
//! [`Manifest::default_fonts`] list applies. Accepted schema:
//!
//! ```yaml
//! fonts:
//!   - path: ./fonts/noto-cjk/NotoSansJP-Regular.otf
//!     platforms: [linux]
//! ```
//!
//! Entries keep file order, which is also upload order. Paths are used as
//! written, so relative paths resolve against the working directory.

use crate::config::{Manifest, ManifestEntry};
use crate::error::SyncError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct ManifestFile {
    fonts: Vec<ManifestEntry>,
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, SyncError> {
    let path_ref = path.as_ref();
    info!(manifest_path = ?path_ref, "Loading manifest from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, manifest_path = ?path_ref, "Failed to read manifest file");
            return Err(SyncError::Config(format!(
                "failed to read manifest file {}: {e}",
                path_ref.display()
            )));
        }
    };

    let raw: ManifestFile = match serde_yaml::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = ?e, manifest_path = ?path_ref, "Failed to parse manifest YAML");
            return Err(SyncError::Config(format!(
                "failed to parse manifest YAML {}: {e}",
                path_ref.display()
            )));
        }
    };

    let manifest = Manifest::new(raw.fonts);
    manifest.trace_loaded();
    Ok(manifest)
}
