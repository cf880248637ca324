// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Object store integration trait.
//!
//! Defines the interface the copy engine needs from the two store handles
//! (source and destination). Callers construct pre-authenticated handles and
//! pass them into the engine; the engine never knows about endpoints,
//! credentials, or transport.
//!
//! # Example
//!
//! ```rust,no_run
//! use replicopy::store::{
//!     BoxFuture, DeleteOptions, FetchOptions, FetchedObject, ObjectMeta, ObjectStore,
//!     ProbeOptions, StoreResult, UploadOptions,
//! };
//! use std::future::Future;
//! use std::pin::Pin;
//!
//! struct MyStore { /* ... */ }
//!
//! impl ObjectStore for MyStore {
//!     fn probe(
//!         &self,
//!         key: &str,
//!         _version: Option<&str>,
//!         _opts: ProbeOptions,
//!     ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>> {
//!         let key = key.to_string();
//!         Box::pin(async move { Ok(ObjectMeta { key, ..Default::default() }) })
//!     }
//!
//!     fn fetch(
//!         &self,
//!         key: &str,
//!         _version: Option<&str>,
//!         _opts: FetchOptions,
//!     ) -> Pin<Box<dyn Future<Output = StoreResult<FetchedObject>> + Send + '_>> {
//!         let key = key.to_string();
//!         Box::pin(async move {
//!             Ok(FetchedObject {
//!                 meta: ObjectMeta { key, ..Default::default() },
//!                 body: Box::pin(tokio::io::empty()),
//!             })
//!         })
//!     }
//!
//!     fn upload(
//!         &self,
//!         key: &str,
//!         _body: replicopy::store::ObjectBody,
//!         _size: i64,
//!         _opts: UploadOptions,
//!     ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>> {
//!         let key = key.to_string();
//!         Box::pin(async move { Ok(ObjectMeta { key, ..Default::default() }) })
//!     }
//!
//!     fn delete(
//!         &self,
//!         _key: &str,
//!         _version: Option<&str>,
//!         _opts: DeleteOptions,
//!     ) -> BoxFuture<'_, ()> {
//!         Box::pin(async move { Ok(()) })
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Streaming object body handed from fetch to upload.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Simplified error for store operations.
///
/// Object-scoped: a `StoreError` fails one record, never the run. The
/// `MethodNotAllowed` variant exists so the copy decision can recognize the
/// "delete-marker operations disallowed" probe outcome without inspecting
/// message strings.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The key (or key + version) does not exist on the store.
    NotFound(String),
    /// The store refuses this operation class for the object.
    MethodNotAllowed(String),
    /// Anything else: network trouble, throttling, permission failures.
    Other(String),
}

impl StoreError {
    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a method-not-allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed(message.into())
    }

    /// Create a generic store error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check for the method-not-allowed condition
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, Self::MethodNotAllowed(_))
    }

    /// Check for the not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not found: {}", msg),
            Self::MethodNotAllowed(msg) => write!(f, "method not allowed: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Replication status tag carried on replicated objects and delete markers.
///
/// This engine only ever writes `Replica`; the other values appear when
/// reading metadata back from stores that run their own replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationStatus {
    Pending,
    Completed,
    Failed,
    Replica,
}

impl ReplicationStatus {
    /// Wire value used in store metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Replica => "REPLICA",
        }
    }
}

impl std::fmt::Display for ReplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing one object version as a store reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMeta {
    pub key: String,
    pub version_id: Option<String>,
    pub etag: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub storage_class: Option<String>,
    /// User-supplied metadata pairs (the `x-amz-meta-` family, unprefixed).
    pub user_metadata: BTreeMap<String, String>,
    /// Object tags as a plain map.
    pub user_tags: BTreeMap<String, String>,
    /// Raw response headers. Multi-valued, case preserved as received.
    pub headers: BTreeMap<String, Vec<String>>,
}

/// A fetched object: its metadata plus the streaming body.
pub struct FetchedObject {
    pub meta: ObjectMeta,
    pub body: ObjectBody,
}

/// Flags for the destination existence probe.
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// When false the destination must answer from its own state instead of
    /// proxying the lookup to its replication source.
    pub replication_proxy: bool,
}

/// Flags for the source fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Fail the fetch unless the object's ETag matches exactly.
    pub match_etag: Option<String>,
    /// Mark the read as replication traffic rather than a user request.
    pub replication_proxy: bool,
}

/// Flags for replicating a delete marker to the destination.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Write a delete marker instead of performing a user-visible delete.
    pub replication_delete_marker: bool,
    /// Modification time of the source marker.
    pub replication_mtime: Option<DateTime<Utc>>,
    /// Status tag stamped on the marker.
    pub replication_status: Option<ReplicationStatus>,
    /// Mark the call as replication-driven rather than user-initiated.
    pub replication_request: bool,
}

/// Options for uploading a replicated object to the destination.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub user_metadata: BTreeMap<String, String>,
    pub content_type: Option<String>,
    /// Joined content-encoding values ("gzip" or "gzip,br").
    pub content_encoding: Option<String>,
    pub storage_class: Option<String>,
    /// Validated object tags; `None` when the source carried none (or
    /// carried tags that fail validation).
    pub user_tags: Option<BTreeMap<String, String>>,
    /// Version id of the source object this write replicates.
    pub source_version_id: Option<String>,
    pub replication_status: Option<ReplicationStatus>,
    pub source_mtime: Option<DateTime<Utc>>,
    pub source_etag: Option<String>,
    /// Mark the call as replication-driven rather than user-initiated.
    pub replication_request: bool,
}

/// Trait defining what the engine needs from a store handle.
///
/// Both handles (source and destination) implement this. Every worker in the
/// pool calls the same handle concurrently, so implementations must be safe
/// for concurrent use without external locking.
///
/// This trait allows testing with mocks and decouples the engine from any
/// particular client library.
pub trait ObjectStore: Send + Sync + 'static {
    /// Look up object metadata without transferring data.
    ///
    /// Used against the destination to decide whether a record still needs
    /// copying. `NotFound` is the expected answer for work that remains.
    fn probe(
        &self,
        key: &str,
        version: Option<&str>,
        opts: ProbeOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>>;

    /// Fetch an object's metadata and streaming body from the source.
    ///
    /// With `opts.match_etag` set, implementations must fail unless the
    /// stored ETag matches exactly.
    fn fetch(
        &self,
        key: &str,
        version: Option<&str>,
        opts: FetchOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<FetchedObject>> + Send + '_>>;

    /// Write a replicated object to the destination.
    ///
    /// `size` is the expected body length in bytes as reported by the
    /// source fetch.
    fn upload(
        &self,
        key: &str,
        body: ObjectBody,
        size: i64,
        opts: UploadOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>>;

    /// Replicate a delete marker to the destination.
    fn delete(&self, key: &str, version: Option<&str>, opts: DeleteOptions) -> BoxFuture<'_, ()>;
}

/// A success-biased no-op implementation for wiring tests and standalone
/// runs.
///
/// Probes report every object as already present, so a run against this
/// store treats the whole difference list as already replicated and never
/// transfers a byte.
#[derive(Clone)]
pub struct NoOpStore;

impl ObjectStore for NoOpStore {
    fn probe(
        &self,
        key: &str,
        version: Option<&str>,
        _opts: ProbeOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>> {
        let key = key.to_string();
        let version_id = version.map(str::to_string);
        Box::pin(async move {
            tracing::debug!(key = %key, "NoOp: reporting object present");
            Ok(ObjectMeta {
                key,
                version_id,
                ..Default::default()
            })
        })
    }

    fn fetch(
        &self,
        key: &str,
        version: Option<&str>,
        _opts: FetchOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<FetchedObject>> + Send + '_>> {
        let key = key.to_string();
        let version_id = version.map(str::to_string);
        Box::pin(async move {
            tracing::debug!(key = %key, "NoOp: would fetch object");
            Ok(FetchedObject {
                meta: ObjectMeta {
                    key,
                    version_id,
                    ..Default::default()
                },
                body: Box::pin(tokio::io::empty()),
            })
        })
    }

    fn upload(
        &self,
        key: &str,
        _body: ObjectBody,
        size: i64,
        _opts: UploadOptions,
    ) -> Pin<Box<dyn Future<Output = StoreResult<ObjectMeta>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            tracing::debug!(key = %key, size, "NoOp: would upload object");
            Ok(ObjectMeta {
                key,
                size,
                ..Default::default()
            })
        })
    }

    fn delete(&self, key: &str, _version: Option<&str>, _opts: DeleteOptions) -> BoxFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            tracing::debug!(key = %key, "NoOp: would replicate delete marker");
            Ok(())
        })
    }
}
