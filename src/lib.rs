#![doc = "font-sync: keep a fixed set of font files synchronised with a Kinto attachments collection."]

//! Each manifest entry maps to one remote record whose id is derived from
//! the file name. A run lists the remote records, uploads every file whose
//! content hash differs from (or is missing on) the server, and reports
//! remote records that are not in the manifest.
//!
//! Without `--force` the run is a dry run: only `GET` requests are sent.

pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod hashing;
pub mod identifier;
pub mod load_config;
pub mod provision;
pub mod reconcile;
pub mod synchronise;
pub mod upload;

pub use cli::{run, Cli};
pub use error::SyncError;
