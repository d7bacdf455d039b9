use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Content-addressed blob storage.
///
/// Identical contents always map to the same [`ContentHash`], so callers that
/// share blobs must track references themselves before calling `delete`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their content hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Fetch the bytes stored under `hash`.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    /// Remove a blob. Returns `false` if it was already absent.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;
}
