//! Command line surface of `font-sync`.
//!
//! All reconciliation and upload logic lives in the library modules; this
//! module only parses flags, builds a [`SyncConfig`] and a [`KintoClient`],
//! and reports the outcome. [`run`] is the entry point for both `main` and
//! the integration tests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::client::KintoClient;
use crate::config::{CollectionRef, Credentials, Manifest, SyncConfig};
use crate::load_config::load_manifest;
use crate::synchronise::synchronise;

pub const DRY_RUN_BANNER: &str = "=== DRY RUN === (Use --force to actually perform those actions)";

/// Upload font files to a Kinto attachments collection.
#[derive(Parser, Debug)]
#[clap(name = "font-sync", version, about = "Upload files to Kinto")]
pub struct Cli {
    /// Collection URL, e.g. https://host/v1/buckets/fonts/collections/fonts
    #[clap(long)]
    pub url: String,

    /// Credentials as user:pass
    #[clap(long, env = "FONT_SYNC_AUTH", hide_env_values = true)]
    pub auth: String,

    /// Ensure the bucket and collection exist before uploading
    #[clap(long = "create-collection")]
    pub create_collection: bool,

    /// Actually perform actions on the server. Without this no write request is sent
    #[clap(long)]
    pub force: bool,

    /// YAML manifest to use instead of the built-in font list
    #[clap(long)]
    pub manifest: Option<PathBuf>,
}

impl Cli {
    /// Builds the run configuration without touching the network.
    pub fn sync_config(&self) -> Result<SyncConfig> {
        let collection = CollectionRef::parse(&self.url)?;
        let manifest = match &self.manifest {
            Some(path) => load_manifest(path)?,
            None => Manifest::default_fonts(),
        };
        Ok(SyncConfig {
            collection,
            manifest,
            create_collection: self.create_collection,
            dry_run: !self.force,
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    if !cli.force {
        println!("{DRY_RUN_BANNER}");
    }

    let credentials: Credentials = cli.auth.parse()?;
    let config = cli.sync_config()?;
    let client = KintoClient::new(credentials).context("Failed to construct HTTP client")?;

    if config.create_collection {
        println!("=== create collection ===");
    }

    match synchronise(&config, &client).await {
        Ok(report) => {
            tracing::info!(command = "sync", "Synchronisation complete");
            println!("Synchronise complete.\nReport:");
            println!("{:#?}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e).context("Synchronisation failed"))
        }
    }
}
