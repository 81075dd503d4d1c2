//! Registry repository that tracks the manifests it transfers
//!
//! [`TrackedRepository`] talks to the Docker Registry HTTP API v2 manifest
//! endpoints. Each manifest resolution feeds its [`ManifestInfoTracker`], which
//! is registered as a request modifier on the transport so every request the
//! repository sends carries the current manifest provenance headers.

use crate::error::{RegistryError, Result};
use crate::manifest_info::ManifestInfoTracker;
use crate::reference::{Digest, Reference};
use crate::tracking::SupportsManifestTracking;
use crate::transport::ModifyingTransport;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const CONTENT_DIGEST_HEADER: &str = "docker-content-digest";

/// Manifest media types accepted on pull
pub const MANIFEST_ACCEPT_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.oci.image.index.v1+json",
];

/// Manifest payload as returned by the registry
#[derive(Debug)]
pub struct ManifestResponse {
    pub data: Vec<u8>,
    pub content_type: String,
    pub digest: Option<Digest>,
}

pub struct TrackedRepository {
    registry_url: Url,
    name: String,
    transport: ModifyingTransport,
    tracker: Arc<ManifestInfoTracker>,
    token: Option<String>,
}

impl TrackedRepository {
    /// Wrap `transport` for repository `name`, registering a fresh tracker as
    /// one of its request modifiers
    pub fn new(registry_url: Url, name: impl Into<String>, transport: ModifyingTransport) -> Self {
        let tracker = Arc::new(ManifestInfoTracker::new());
        let transport = transport.with_modifier(tracker.clone());
        Self {
            registry_url,
            name: name.into(),
            transport,
            tracker,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracker(&self) -> &Arc<ManifestInfoTracker> {
        &self.tracker
    }

    fn manifest_url(&self, reference: &str) -> Result<Url> {
        Ok(self
            .registry_url
            .join(&format!("/v2/{}/manifests/{}", self.name, reference))?)
    }

    fn manifest_path<'a>(&self, reference: &'a Reference) -> Result<&'a str> {
        reference.manifest_reference().ok_or_else(|| {
            RegistryError::Validation(format!(
                "Reference {} has neither tag nor digest",
                reference
            ))
        })
    }

    fn build_get(&self, manifest_reference: &str) -> Result<Request> {
        let mut builder = self
            .transport
            .client()
            .get(self.manifest_url(manifest_reference)?)
            .header(ACCEPT, MANIFEST_ACCEPT_TYPES.join(", "));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        self.transport.prepare(builder)
    }

    /// Record `reference` and build the annotated GET request for it without
    /// sending it
    pub fn prepare_get_manifest(&self, reference: &Reference) -> Result<Request> {
        let path = self.manifest_path(reference)?;
        self.tracker.update(reference, &[]);
        self.build_get(path)
    }

    /// Pull the manifest named by `reference`. The digest reported by the
    /// registry becomes the tracked digest.
    pub async fn get_manifest(&self, reference: &Reference) -> Result<ManifestResponse> {
        let request = self.prepare_get_manifest(reference)?;
        debug!(reference = %reference, "Fetching manifest");
        let response = self.transport.execute(request).await?;
        let manifest = Self::read_manifest(response, &reference.to_string()).await?;

        // Record what the registry resolved the reference to
        if let Some(digest) = &manifest.digest {
            self.tracker.update(reference, std::slice::from_ref(digest));
        }
        Ok(manifest)
    }

    /// Pull a platform-specific manifest resolved from a previously fetched
    /// manifest list. Its digest is appended to the tracked chain; if the pull
    /// fails the chain is rolled back.
    pub async fn get_child_manifest(&self, digest: &Digest) -> Result<ManifestResponse> {
        let checkpoint = self.tracker.checkpoint();
        self.tracker.add_digest(digest);

        let result = self.fetch_by_digest(digest).await;

        if result.is_err() {
            debug!(digest = %digest, "Child manifest pull failed, restoring manifest info");
            self.tracker.restore(&checkpoint);
        }
        result
    }

    async fn fetch_by_digest(&self, digest: &Digest) -> Result<ManifestResponse> {
        let request = self.build_get(digest.as_str())?;
        let response = self.transport.execute(request).await?;
        Self::read_manifest(response, digest.as_str()).await
    }

    /// Push a manifest under `reference`, returning its content digest
    pub async fn put_manifest(
        &self,
        reference: &Reference,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<Digest> {
        let path = self.manifest_path(reference)?;
        let digest = Digest::from_content(&data);
        self.tracker.update(reference, std::slice::from_ref(&digest));

        let mut builder = self
            .transport
            .client()
            .put(self.manifest_url(path)?)
            .header(CONTENT_TYPE, content_type)
            .body(data);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = self.transport.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            info!(reference = %reference, digest = %digest, "Manifest uploaded");
            Ok(digest)
        } else {
            Err(Self::status_error("put manifest", &reference.to_string(), response).await)
        }
    }

    async fn read_manifest(response: Response, what: &str) -> Result<ManifestResponse> {
        if !response.status().is_success() {
            return Err(Self::status_error("get manifest", what, response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let digest = response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(Digest::from);
        let data = response.bytes().await?.to_vec();

        debug!(manifest = %what, size = data.len(), %content_type, "Fetched manifest");
        Ok(ManifestResponse {
            data,
            content_type,
            digest,
        })
    }

    async fn status_error(action: &str, what: &str, response: Response) -> RegistryError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return RegistryError::NotFound(format!("manifest {}", what));
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        RegistryError::Registry(format!(
            "Failed to {} {}: HTTP {} - {}",
            action, what, status, error_text
        ))
    }
}

impl SupportsManifestTracking for TrackedRepository {
    fn manifest_tracker(&self) -> Option<&ManifestInfoTracker> {
        Some(self.tracker.as_ref())
    }
}
