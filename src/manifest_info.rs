//! Manifest provenance tracking
//!
//! [`ManifestInfoTracker`] keeps the tag and the digests of the manifests being
//! pushed or pulled through a repository, and copies them onto every outgoing
//! request as `Docker-Manifest-Tag` / `Docker-Manifest-Digest` headers.
//!
//! Multiple digests are collected when resolving a manifest list: every time a
//! more specific manifest is resolved its digest is appended. Index 0 is the
//! first requested manifest, the last index is the last resolved one.

use crate::error::Result;
use crate::reference::{Digest, Reference};
use crate::transport::RequestModifier;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{trace, warn};

/// Header carrying the current manifest tag
pub const MANIFEST_TAG_HEADER: &str = "Docker-Manifest-Tag";
/// Header carrying one tracked manifest digest per value
pub const MANIFEST_DIGEST_HEADER: &str = "Docker-Manifest-Digest";

const TAG_HEADER: HeaderName = HeaderName::from_static("docker-manifest-tag");
const DIGEST_HEADER: HeaderName = HeaderName::from_static("docker-manifest-digest");

/// Tag and ordered digest history of the manifest being transferred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestInfo {
    tag: Option<String>,
    digests: Vec<String>,
}

impl ManifestInfo {
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    /// Digests in resolution order, oldest first
    pub fn digests(&self) -> &[String] {
        &self.digests
    }

    pub fn is_empty(&self) -> bool {
        self.tag().is_none() && self.digests.is_empty()
    }
}

/// A restore point taken with [`ManifestInfoTracker::checkpoint`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfoCheckpoint {
    info: ManifestInfo,
}

impl ManifestInfoCheckpoint {
    /// The state this checkpoint restores to
    pub fn info(&self) -> &ManifestInfo {
        &self.info
    }
}

/// Thread-safe holder of the [`ManifestInfo`] for one repository session
#[derive(Debug, Default)]
pub struct ManifestInfoTracker {
    info: RwLock<ManifestInfo>,
}

impl ManifestInfoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the value whole, so a poisoned lock still
    // guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, ManifestInfo> {
        self.info.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManifestInfo> {
        self.info.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ManifestInfo {
        self.read().clone()
    }

    /// Record a resolved reference.
    ///
    /// A tag on the reference replaces the tracked tag. A digest on the
    /// reference replaces the digest list with that single digest, unless
    /// `digests` is non-empty, in which case the list is rebuilt from
    /// `digests` (empty values skipped). A reference with neither tag nor
    /// digest leaves the corresponding state untouched.
    pub fn update(&self, reference: &Reference, digests: &[Digest]) {
        let mut info = self.write();

        if let Some(tag) = reference.tag() {
            info.tag = Some(tag.to_string());
            trace!(tag = %tag, reference = %reference, "Updated manifest tag");
        }

        if let Some(digest) = reference.digest().filter(|d| !d.is_empty()) {
            info.digests = vec![digest.to_string()];
            trace!(digests = ?info.digests, reference = %reference, "Updated manifest digests from reference");
        }

        if !digests.is_empty() {
            info.digests = digests
                .iter()
                .filter(|d| !d.is_empty())
                .map(Digest::to_string)
                .collect();
            trace!(digests = ?info.digests, "Updated manifest digests");
        }
    }

    /// Append a digest as the most recently resolved manifest
    pub fn add_digest(&self, digest: &Digest) {
        if digest.is_empty() {
            return;
        }
        let mut info = self.write();
        info.digests.push(digest.to_string());
        trace!(digests = ?info.digests, added = %digest, "Appended manifest digest");
    }

    /// Capture the current state so it can be restored later
    pub fn checkpoint(&self) -> ManifestInfoCheckpoint {
        ManifestInfoCheckpoint {
            info: self.snapshot(),
        }
    }

    /// Reset to a previously captured checkpoint. Restoring the same
    /// checkpoint repeatedly always yields the same state.
    pub fn restore(&self, checkpoint: &ManifestInfoCheckpoint) {
        let mut info = self.write();
        *info = checkpoint.info.clone();
        trace!(info = ?*info, "Restored manifest info");
    }

    /// Copy the tracked tag and digests into `headers`.
    ///
    /// The tag header is set (replacing any existing value); digest headers are
    /// appended one per digest, oldest first.
    pub fn annotate_headers(&self, headers: &mut HeaderMap) {
        let info = self.read();

        if let Some(tag) = info.tag() {
            match HeaderValue::from_str(tag) {
                Ok(value) => {
                    trace!(tag = %tag, "Adding {} header", MANIFEST_TAG_HEADER);
                    headers.insert(TAG_HEADER, value);
                }
                Err(_) => warn!(tag = %tag, "Manifest tag is not a valid header value, skipping"),
            }
        }

        if !info.digests.is_empty() {
            trace!(digests = ?info.digests, "Adding {} headers", MANIFEST_DIGEST_HEADER);
            for digest in &info.digests {
                match HeaderValue::from_str(digest) {
                    Ok(value) => {
                        headers.append(DIGEST_HEADER, value);
                    }
                    Err(_) => warn!(digest = %digest, "Manifest digest is not a valid header value, skipping"),
                }
            }
        }
    }

    /// Annotate an outgoing request. Never fails; the `Result` is part of the
    /// [`RequestModifier`] contract.
    pub fn annotate(&self, request: &mut reqwest::Request) -> Result<()> {
        trace!(method = %request.method(), url = %request.url(), "Annotating request with manifest info");
        self.annotate_headers(request.headers_mut());
        Ok(())
    }
}

impl RequestModifier for ManifestInfoTracker {
    fn modify_request(&self, request: &mut reqwest::Request) -> Result<()> {
        self.annotate(request)
    }
}
