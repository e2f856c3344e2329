//! Object store trait

use async_trait::async_trait;

use crate::Result;

/// A bucket-style object store
///
/// Keys are `/`-separated paths inside the store's bucket, e.g. `output/output_42.pdf`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object, and return its public URL
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Fetch the object stored under `key` with the store's credentials
    async fn download(&self, key: &str) -> Result<Vec<u8>>;

    /// Map a stored file URL to the key it lives under in this store
    ///
    /// Stores that cannot tell fall back to `input/<file_name>`.
    fn object_key_for(&self, url: &str, file_name: &str) -> String {
        let _ = url;
        format!("input/{}", file_name)
    }

    /// Store name for logs
    fn name(&self) -> &'static str;
}
