//! Supabase Storage REST client

use async_trait::async_trait;
use std::time::Duration;

use super::ObjectStore;
use crate::config::RemoteStorageConfig;
use crate::{Error, Result};

/// Object store backed by the Supabase Storage API
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
    timeout: Duration,
}

impl std::fmt::Debug for SupabaseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStorage")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl SupabaseStorage {
    /// Create a client for the configured project and bucket
    pub fn new(config: &RemoteStorageConfig, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
            timeout,
        }
    }

    /// Public URL of an object
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .authorized(self.client.post(self.object_url(key)))
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("upload of '{}' failed: {}", key, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "upload of '{}' returned {}: {}",
                key, status, body
            )));
        }

        Ok(self.public_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .authorized(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("download of '{}' failed: {}", key, e)))?;

        if !response.status().is_success() {
            return Err(Error::Storage(format!(
                "download of '{}' returned {}",
                key,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Storage(format!("reading '{}' failed: {}", key, e)))?;
        Ok(bytes.to_vec())
    }

    fn object_key_for(&self, url: &str, file_name: &str) -> String {
        derive_object_path(url, &self.bucket, file_name)
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the object key of a stored file from its URL
///
/// Storage URLs look like `.../storage/v1/object/[public|sign|authenticated/]<bucket>/<key>`.
/// When the URL names `bucket`, the percent-decoded key is returned. Anything else maps to
/// `input/<file_name>`.
pub fn derive_object_path(url: &str, bucket: &str, file_name: &str) -> String {
    let fallback = || format!("input/{}", file_name);

    let Ok(parsed) = url::Url::parse(url) else {
        return fallback();
    };
    let Some(segments) = parsed.path_segments() else {
        return fallback();
    };
    let segments: Vec<&str> = segments.collect();

    let Some(object_pos) = segments.iter().position(|s| *s == "object") else {
        return fallback();
    };
    let mut rest = &segments[object_pos + 1..];
    if let Some(first) = rest.first()
        && matches!(*first, "public" | "sign" | "authenticated")
    {
        rest = &rest[1..];
    }

    match rest.split_first() {
        Some((found_bucket, key)) if *found_bucket == bucket && !key.is_empty() => {
            let joined = key.join("/");
            urlencoding::decode(&joined)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(joined)
        }
        _ => fallback(),
    }
}
