//! Mock ObjectStore for testing.
//!
//! Records all calls to probe(), fetch(), upload(), delete() for
//! assertions. Per-key scripted outcomes drive records down every branch
//! of the copy decision: present objects, delete-marker refusals, fetch
//! and upload failures.

// Each test binary exercises a subset of the mock surface.
#![allow(dead_code)]

use replicopy::store::{
    BoxFuture, DeleteOptions, FetchOptions, FetchedObject, ObjectMeta, ObjectStore, ProbeOptions,
    StoreError, StoreResult, UploadOptions,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

/// A recorded probe() call.
#[derive(Debug, Clone)]
pub struct ProbeCall {
    pub key: String,
    pub version: Option<String>,
    pub replication_proxy: bool,
}

/// A recorded fetch() call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub key: String,
    pub version: Option<String>,
    pub match_etag: Option<String>,
    pub replication_proxy: bool,
}

/// A recorded upload() call, body fully drained.
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub key: String,
    pub size: i64,
    pub options: UploadOptions,
    pub body: Vec<u8>,
}

/// A recorded delete() call.
#[derive(Debug, Clone)]
pub struct DeleteCall {
    pub key: String,
    pub version: Option<String>,
    pub options: DeleteOptions,
}

/// Mock implementation of ObjectStore that records all calls.
///
/// Probes answer "not found" by default, so against a fresh mock every
/// record takes the full copy path. Script the exceptions per key.
///
/// # Example
/// ```rust,ignore
/// let destination = MockStore::new();
/// destination.present("already-there.txt").await;
/// destination.fail_upload("flaky.bin").await;
///
/// // Run the engine...
///
/// let uploads = destination.uploads().await;
/// assert!(uploads.iter().any(|u| u.key == "fresh.txt"));
/// ```
pub struct MockStore {
    /// Recorded probe() calls
    probes: RwLock<Vec<ProbeCall>>,
    /// Recorded fetch() calls
    fetches: RwLock<Vec<FetchCall>>,
    /// Recorded upload() calls
    uploads: RwLock<Vec<UploadCall>>,
    /// Recorded delete() calls
    deletes: RwLock<Vec<DeleteCall>>,
    /// Keys the probe reports as present (with the meta to report)
    present: RwLock<HashMap<String, ObjectMeta>>,
    /// Keys the probe refuses with method-not-allowed
    marker_refusals: RwLock<HashMap<String, ()>>,
    /// Scripted per-key errors
    fetch_errors: RwLock<HashMap<String, StoreError>>,
    upload_errors: RwLock<HashMap<String, StoreError>>,
    delete_errors: RwLock<HashMap<String, StoreError>>,
    /// Objects served by fetch: key -> (meta, body)
    objects: RwLock<HashMap<String, (ObjectMeta, Vec<u8>)>>,
    /// Simulate failures after N uploads
    fail_after_uploads: AtomicUsize,
    /// Counter for upload calls
    upload_count: AtomicUsize,
    /// Artificial per-fetch delay, for cancellation-timing tests
    fetch_latency: RwLock<Option<std::time::Duration>>,
    /// Concurrency high-water mark across fetches
    in_flight_fetches: AtomicUsize,
    max_in_flight_fetches: AtomicUsize,
}

impl MockStore {
    /// Create a mock where nothing exists yet and every operation works.
    pub fn new() -> Self {
        Self {
            probes: RwLock::new(Vec::new()),
            fetches: RwLock::new(Vec::new()),
            uploads: RwLock::new(Vec::new()),
            deletes: RwLock::new(Vec::new()),
            present: RwLock::new(HashMap::new()),
            marker_refusals: RwLock::new(HashMap::new()),
            fetch_errors: RwLock::new(HashMap::new()),
            upload_errors: RwLock::new(HashMap::new()),
            delete_errors: RwLock::new(HashMap::new()),
            objects: RwLock::new(HashMap::new()),
            fail_after_uploads: AtomicUsize::new(usize::MAX),
            upload_count: AtomicUsize::new(0),
            fetch_latency: RwLock::new(None),
            in_flight_fetches: AtomicUsize::new(0),
            max_in_flight_fetches: AtomicUsize::new(0),
        }
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Make the probe report `key` as present (already replicated).
    pub async fn present(&self, key: &str) {
        let meta = ObjectMeta {
            key: key.to_string(),
            ..Default::default()
        };
        self.present.write().await.insert(key.to_string(), meta);
    }

    /// Make the probe refuse `key` with method-not-allowed, the way stores
    /// answer delete-marker probes they already hold a marker for.
    pub async fn refuse_marker_probe(&self, key: &str) {
        self.marker_refusals.write().await.insert(key.to_string(), ());
    }

    /// Serve a concrete object (metadata and body) for fetches of `key`.
    pub async fn serve_object(&self, key: &str, meta: ObjectMeta, body: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (meta, body));
    }

    /// Make fetches of `key` fail.
    pub async fn fail_fetch(&self, key: &str) {
        self.fetch_errors
            .write()
            .await
            .insert(key.to_string(), StoreError::other("scripted fetch failure"));
    }

    /// Make uploads of `key` fail.
    pub async fn fail_upload(&self, key: &str) {
        self.upload_errors
            .write()
            .await
            .insert(key.to_string(), StoreError::other("scripted upload failure"));
    }

    /// Make deletes of `key` fail.
    pub async fn fail_delete(&self, key: &str) {
        self.delete_errors
            .write()
            .await
            .insert(key.to_string(), StoreError::other("scripted delete failure"));
    }

    /// Configure upload() to fail after N successful calls.
    pub fn fail_after_uploads(&self, n: usize) {
        self.fail_after_uploads.store(n, Ordering::SeqCst);
    }

    /// Delay every fetch, to hold records in flight long enough for
    /// cancellation and concurrency assertions.
    pub async fn set_fetch_latency(&self, latency: std::time::Duration) {
        *self.fetch_latency.write().await = Some(latency);
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Get all recorded probe() calls.
    pub async fn probes(&self) -> Vec<ProbeCall> {
        self.probes.read().await.clone()
    }

    /// Get all recorded fetch() calls.
    pub async fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.read().await.clone()
    }

    /// Get all recorded upload() calls.
    pub async fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.read().await.clone()
    }

    /// Get all recorded delete() calls.
    pub async fn deletes(&self) -> Vec<DeleteCall> {
        self.deletes.read().await.clone()
    }

    /// Get count of uploads.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Get count of deletes.
    pub async fn delete_count(&self) -> usize {
        self.deletes.read().await.len()
    }

    /// Check if a specific key was uploaded.
    pub async fn was_uploaded(&self, key: &str) -> bool {
        self.uploads.read().await.iter().any(|u| u.key == key)
    }

    /// Check if a specific key was deleted.
    pub async fn was_deleted(&self, key: &str) -> bool {
        self.deletes.read().await.iter().any(|d| d.key == key)
    }

    /// Check whether any call mutated the store.
    pub async fn was_mutated(&self) -> bool {
        !self.uploads.read().await.is_empty() || !self.deletes.read().await.is_empty()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn max_in_flight_fetches(&self) -> usize {
        self.max_in_flight_fetches.load(Ordering::SeqCst)
    }

    async fn serve_fetch(
        &self,
        key: String,
        version: Option<String>,
        opts: FetchOptions,
    ) -> StoreResult<FetchedObject> {
        if let Some(error) = self.fetch_errors.read().await.get(&key) {
            return Err(error.clone());
        }

        if let Some((meta, body)) = self.objects.read().await.get(&key) {
            // Honor the ETag pin the way a real store would.
            if let Some(expected) = &opts.match_etag {
                if &meta.etag != expected {
                    return Err(StoreError::other(format!(
                        "etag mismatch: want {}, have {}",
                        expected, meta.etag
                    )));
                }
            }
            return Ok(FetchedObject {
                meta: meta.clone(),
                body: Box::pin(std::io::Cursor::new(body.clone())),
            });
        }

        // No scripted object: synthesize one that satisfies the pin.
        Ok(FetchedObject {
            meta: ObjectMeta {
                key,
                version_id: version,
                etag: opts.match_etag.unwrap_or_default(),
                ..Default::default()
            },
            body: Box::pin(std::io::Cursor::new(Vec::new())),
        })
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MockStore {
    fn probe(
        &self,
        key: &str,
        version: Option<&str>,
        opts: ProbeOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = StoreResult<ObjectMeta>> + Send + '_>>
    {
        let key = key.to_string();
        let version = version.map(str::to_string);
        Box::pin(async move {
            self.probes.write().await.push(ProbeCall {
                key: key.clone(),
                version,
                replication_proxy: opts.replication_proxy,
            });

            if self.marker_refusals.read().await.contains_key(&key) {
                return Err(StoreError::method_not_allowed(key));
            }
            match self.present.read().await.get(&key) {
                Some(meta) => Ok(meta.clone()),
                None => Err(StoreError::not_found(key)),
            }
        })
    }

    fn fetch(
        &self,
        key: &str,
        version: Option<&str>,
        opts: FetchOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = StoreResult<FetchedObject>> + Send + '_>>
    {
        let key = key.to_string();
        let version = version.map(str::to_string);
        Box::pin(async move {
            self.fetches.write().await.push(FetchCall {
                key: key.clone(),
                version: version.clone(),
                match_etag: opts.match_etag.clone(),
                replication_proxy: opts.replication_proxy,
            });

            let in_flight = self.in_flight_fetches.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight_fetches
                .fetch_max(in_flight, Ordering::SeqCst);
            if let Some(latency) = *self.fetch_latency.read().await {
                tokio::time::sleep(latency).await;
            }
            let result = self.serve_fetch(key, version, opts).await;
            self.in_flight_fetches.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }

    fn upload(
        &self,
        key: &str,
        mut body: replicopy::store::ObjectBody,
        size: i64,
        opts: UploadOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = StoreResult<ObjectMeta>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move {
            // Check if we should fail
            let count = self.upload_count.fetch_add(1, Ordering::SeqCst);
            if count >= self.fail_after_uploads.load(Ordering::SeqCst) {
                return Err(StoreError::other("simulated upload failure"));
            }

            if let Some(error) = self.upload_errors.read().await.get(&key) {
                return Err(error.clone());
            }

            // Drain the body like a real transfer would.
            let mut bytes = Vec::new();
            body.read_to_end(&mut bytes)
                .await
                .map_err(|e| StoreError::other(format!("body read: {}", e)))?;

            self.uploads.write().await.push(UploadCall {
                key: key.clone(),
                size,
                options: opts,
                body: bytes,
            });
            Ok(ObjectMeta {
                key,
                size,
                ..Default::default()
            })
        })
    }

    fn delete(&self, key: &str, version: Option<&str>, opts: DeleteOptions) -> BoxFuture<'_, ()> {
        let key = key.to_string();
        let version = version.map(str::to_string);
        Box::pin(async move {
            if let Some(error) = self.delete_errors.read().await.get(&key) {
                return Err(error.clone());
            }
            self.deletes.write().await.push(DeleteCall {
                key,
                version,
                options: opts,
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_probe_defaults_to_not_found() {
        let mock = MockStore::new();

        let err = mock
            .probe("anything", None, ProbeOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        mock.present("known").await;
        let meta = mock
            .probe("known", None, ProbeOptions::default())
            .await
            .unwrap();
        assert_eq!(meta.key, "known");
    }

    #[tokio::test]
    async fn test_mock_records_uploads_with_body() {
        let mock = MockStore::new();

        let body: replicopy::store::ObjectBody =
            Box::pin(std::io::Cursor::new(b"hello".to_vec()));
        mock.upload("k", body, 5, UploadOptions::default())
            .await
            .unwrap();

        let uploads = mock.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].body, b"hello");
        assert!(mock.was_uploaded("k").await);
    }

    #[tokio::test]
    async fn test_mock_etag_pin_is_enforced() {
        let mock = MockStore::new();
        mock.serve_object(
            "pinned",
            ObjectMeta {
                key: "pinned".to_string(),
                etag: "right".to_string(),
                ..Default::default()
            },
            b"data".to_vec(),
        )
        .await;

        let opts = FetchOptions {
            match_etag: Some("wrong".to_string()),
            replication_proxy: true,
        };
        assert!(mock.fetch("pinned", None, opts).await.is_err());

        let opts = FetchOptions {
            match_etag: Some("right".to_string()),
            replication_proxy: true,
        };
        assert!(mock.fetch("pinned", None, opts).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_fail_after_uploads() {
        let mock = MockStore::new();
        mock.fail_after_uploads(1);

        let body = || -> replicopy::store::ObjectBody { Box::pin(tokio::io::empty()) };
        assert!(mock
            .upload("k1", body(), 0, UploadOptions::default())
            .await
            .is_ok());
        assert!(mock
            .upload("k2", body(), 0, UploadOptions::default())
            .await
            .is_err());
    }
}
