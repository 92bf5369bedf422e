//! Stable remote record identifiers derived from font file names.

use md5::{Digest, Md5};
use uuid::Uuid;

/// Maps a file name to the identifier of its remote record.
///
/// The MD5 digest of the name is used verbatim as the 16 bytes of a UUID,
/// so every run (and every client) computes the same id for the same file
/// without a lookup table.
pub fn derive_id(filename: &str) -> String {
    let digest = Md5::digest(filename.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}
