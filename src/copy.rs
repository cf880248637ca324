//! Per-object copy decision.
//!
//! The heart of the engine: given one difference record and the two store
//! handles, decide what (if anything) must move and report how the attempt
//! ended. Workers call [`replicate_object`] once per record; there are no
//! retries at this layer.
//!
//! # Design
//!
//! ```text
//! DiffRecord ──▶ probe destination ──▶ present ──▶ AlreadyReplicated
//!                     │
//!                     ▼ absent
//!              delete marker? ──yes──▶ probe said "not allowed"
//!                     │                     │ yes ──▶ DeleteMarkerPresent
//!                     │ no                  │ no ──▶ delete w/ replica
//!                     ▼                     ▼         markers
//!              fetch source (ETag-pinned)
//!                     │
//!                     ▼
//!              upload w/ preserved metadata ──▶ Copied
//! ```
//!
use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::record::DiffRecord;
use crate::store::{
    DeleteOptions, FetchOptions, ObjectMeta, ObjectStore, ProbeOptions, ReplicationStatus,
    StoreResult, UploadOptions,
};

/// Tag rules enforced before carrying tags to the upload.
const MAX_OBJECT_TAGS: usize = 10;
const MAX_TAG_KEY_LEN: usize = 128;
const MAX_TAG_VALUE_LEN: usize = 256;

/// What the decision did for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyAction {
    /// Destination already holds the object version; nothing moved.
    AlreadyReplicated,
    /// Destination refuses delete-marker operations for this object,
    /// meaning an equivalent marker is already in place.
    DeleteMarkerPresent,
    /// A replicated delete marker was written to the destination.
    DeleteMarkerReplicated,
    /// The object was fetched from the source and uploaded.
    Copied { bytes: i64 },
    /// Dry run: a marker delete would have been issued.
    WouldReplicateDeleteMarker,
    /// Dry run: the fetch succeeded and an upload would have followed.
    WouldCopy { bytes: i64 },
}

/// Decide and perform the copy for one record.
///
/// Destination-first: probe for the object, then either accept the record
/// as already replicated, replicate a delete marker, or fetch from the
/// source and upload with preserved metadata. An `Err` here fails the one
/// record, never the run.
///
/// With `dry_run` set the destination is never mutated: the probe (and for
/// regular objects the fetch) still run, delete and upload are skipped.
#[instrument(skip_all, fields(key = %record.key))]
pub async fn replicate_object<S, D>(
    source: &S,
    destination: &D,
    record: &DiffRecord,
    dry_run: bool,
) -> StoreResult<CopyAction>
where
    S: ObjectStore + ?Sized,
    D: ObjectStore + ?Sized,
{
    // The probe must observe the destination's own state, not a view
    // proxied back to the source.
    let probe = destination
        .probe(
            &record.key,
            record.version(),
            ProbeOptions {
                replication_proxy: false,
            },
        )
        .await;

    let probe_err = match probe {
        Ok(_) => {
            debug!(version = record.version().unwrap_or(""), "Already replicated");
            return Ok(CopyAction::AlreadyReplicated);
        }
        Err(e) => e,
    };

    if record.is_delete_marker {
        if probe_err.is_method_not_allowed() {
            debug!("Delete marker already present");
            return Ok(CopyAction::DeleteMarkerPresent);
        }
        if dry_run {
            debug!("Dry run: skipping delete marker replication");
            return Ok(CopyAction::WouldReplicateDeleteMarker);
        }
        destination
            .delete(&record.key, record.version(), delete_marker_options(record))
            .await?;
        debug!(version = record.version().unwrap_or(""), "Replicated delete marker");
        return Ok(CopyAction::DeleteMarkerReplicated);
    }

    let fetched = source
        .fetch(
            &record.key,
            record.version(),
            FetchOptions {
                match_etag: etag_constraint(record),
                replication_proxy: true,
            },
        )
        .await?;

    let size = fetched.meta.size;
    if dry_run {
        debug!(size, "Dry run: skipping upload");
        return Ok(CopyAction::WouldCopy { bytes: size });
    }

    destination
        .upload(
            &record.key,
            fetched.body,
            size,
            upload_options_from(&fetched.meta),
        )
        .await?;
    debug!(size, "Copied object");

    Ok(CopyAction::Copied { bytes: size })
}

/// ETag constraint for the source fetch. Records without an ETag fetch
/// unconstrained rather than failing an un-pinnable match.
fn etag_constraint(record: &DiffRecord) -> Option<String> {
    if record.etag.is_empty() {
        None
    } else {
        Some(record.etag.clone())
    }
}

/// Options for replicating a delete marker, stamped so the destination can
/// tell this apart from a user-initiated delete.
fn delete_marker_options(record: &DiffRecord) -> DeleteOptions {
    DeleteOptions {
        replication_delete_marker: true,
        replication_mtime: record.last_modified,
        replication_status: Some(ReplicationStatus::Replica),
        replication_request: true,
    }
}

/// Build upload options that preserve the fetched object's metadata and
/// stamp the internal replication markers.
pub fn upload_options_from(meta: &ObjectMeta) -> UploadOptions {
    UploadOptions {
        user_metadata: meta.user_metadata.clone(),
        content_type: meta.content_type.clone(),
        content_encoding: content_encoding_of(&meta.headers),
        storage_class: meta.storage_class.clone(),
        user_tags: encode_user_tags(&meta.user_tags),
        source_version_id: meta.version_id.clone(),
        replication_status: Some(ReplicationStatus::Replica),
        source_mtime: meta.last_modified,
        source_etag: if meta.etag.is_empty() {
            None
        } else {
            Some(meta.etag.clone())
        },
        replication_request: true,
    }
}

/// Content-encoding values for the upload, joined with ",".
///
/// Looks for the canonical `Content-Encoding` spelling first, then falls
/// back to a case-insensitive scan, since stores differ in how they
/// normalize header names.
pub fn content_encoding_of(headers: &BTreeMap<String, Vec<String>>) -> Option<String> {
    let values = headers.get("Content-Encoding").or_else(|| {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-encoding"))
            .map(|(_, values)| values)
    })?;
    if values.is_empty() {
        return None;
    }
    Some(values.join(","))
}

/// Validate a source tag map for carrying to the upload.
///
/// Returns `None` when the source has no tags or the set breaks tag rules
/// (too many tags, empty or oversize keys, oversize values); the upload
/// then carries no tags at all, the same way stores reject an invalid set
/// wholesale.
pub fn encode_user_tags(tags: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    if tags.is_empty() || tags.len() > MAX_OBJECT_TAGS {
        return None;
    }
    for (key, value) in tags {
        if key.is_empty() || key.chars().count() > MAX_TAG_KEY_LEN {
            return None;
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return None;
        }
    }
    Some(tags.clone())
}
