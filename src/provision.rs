//! Ensures the destination bucket and collection exist and are publicly
//! readable before anything is uploaded into them.

use tracing::{error, info};

use crate::config::CollectionRef;
use crate::contract::{Permissions, RecordStore};
use crate::error::SyncError;

/// Makes sure the bucket grants public read and (re)creates the collection.
///
/// The bucket is only written when it is missing or lacks the read grant.
/// The collection is always re-posted outside dry-run mode; the server
/// treats a repeated create with the same id as an upsert. In dry-run mode
/// only `GET` requests are made and the skipped writes are printed on
/// stdout.
pub async fn ensure_container<S>(
    store: &S,
    collection: &CollectionRef,
    dry_run: bool,
) -> Result<(), SyncError>
where
    S: RecordStore + ?Sized,
{
    let public_read = Permissions::public_read();

    match store.fetch_bucket(collection).await? {
        Some(bucket) => {
            if bucket.permissions.grants_public_read() {
                info!(bucket = %collection.bucket, "Bucket already grants public read");
            } else if dry_run {
                info!(bucket = %collection.bucket, "Bucket lacks public read");
                println!("[DRY RUN] Changing bucket permissions");
            } else {
                info!(bucket = %collection.bucket, "Adding public read to bucket permissions");
                store
                    .patch_bucket_permissions(collection, &public_read)
                    .await
                    .map_err(|e| {
                        error!(bucket = %collection.bucket, error = %e, "Failed to patch bucket permissions");
                        e
                    })?;
            }
        }
        None => {
            if dry_run {
                info!(bucket = %collection.bucket, "Bucket not found");
                println!("[DRY RUN] Creating bucket");
            } else {
                info!(bucket = %collection.bucket, "Creating bucket");
                store
                    .create_bucket(collection, &public_read)
                    .await
                    .map_err(|e| {
                        error!(bucket = %collection.bucket, error = %e, "Failed to create bucket");
                        e
                    })?;
            }
        }
    }

    if dry_run {
        println!("[DRY RUN] Adding the collection");
        return Ok(());
    }

    info!(collection = %collection.collection, "Adding the collection");
    let response = store
        .create_collection(collection, &public_read)
        .await
        .map_err(|e| {
            error!(collection = %collection.collection, error = %e, "Failed to create collection");
            e
        })?;
    info!(collection = %collection.collection, %response, "Collection created");
    Ok(())
}
