//! Docker Manifest Headers Library
//!
//! Tracks which image manifest (tag and resolved digests) a registry client is
//! pushing or pulling, and stamps that provenance onto every outgoing request as
//! `Docker-Manifest-Tag` and `Docker-Manifest-Digest` headers.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest_info;
pub mod reference;
pub mod repository;
pub mod tracking;
pub mod transport;

pub use config::{ImageTarget, TransportConfig};
pub use error::{RegistryError, Result};
pub use manifest_info::{
    MANIFEST_DIGEST_HEADER, MANIFEST_TAG_HEADER, ManifestInfo, ManifestInfoCheckpoint,
    ManifestInfoTracker,
};
pub use reference::{Digest, Reference};
pub use repository::{ManifestResponse, TrackedRepository};
pub use tracking::{
    SupportsManifestTracking, Untracked, add_manifest_digest, checkpoint_manifest_info,
    restore_manifest_info, update_manifest_info,
};
pub use transport::{ModifyingTransport, RequestModifier};
