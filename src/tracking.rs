//! Manifest tracking as an optional repository capability
//!
//! Calling code holds any collaborator implementing
//! [`SupportsManifestTracking`] and uses the free functions below. Collaborators
//! that do not track manifests keep the default `None` and every helper turns
//! into a no-op for them.

use crate::manifest_info::{ManifestInfoCheckpoint, ManifestInfoTracker};
use crate::reference::{Digest, Reference};
use std::sync::Arc;

pub trait SupportsManifestTracking {
    /// The tracker fed by this collaborator, if it tracks manifests at all
    fn manifest_tracker(&self) -> Option<&ManifestInfoTracker> {
        None
    }
}

impl SupportsManifestTracking for ManifestInfoTracker {
    fn manifest_tracker(&self) -> Option<&ManifestInfoTracker> {
        Some(self)
    }
}

impl<T: SupportsManifestTracking + ?Sized> SupportsManifestTracking for Arc<T> {
    fn manifest_tracker(&self) -> Option<&ManifestInfoTracker> {
        (**self).manifest_tracker()
    }
}

/// Collaborator that does not track manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct Untracked;

impl SupportsManifestTracking for Untracked {}

pub fn update_manifest_info<R>(repo: &R, reference: &Reference, digests: &[Digest])
where
    R: SupportsManifestTracking + ?Sized,
{
    if let Some(tracker) = repo.manifest_tracker() {
        tracker.update(reference, digests);
    }
}

pub fn add_manifest_digest<R>(repo: &R, digest: &Digest)
where
    R: SupportsManifestTracking + ?Sized,
{
    if let Some(tracker) = repo.manifest_tracker() {
        tracker.add_digest(digest);
    }
}

/// Checkpoint of the collaborator's tracker, or an empty checkpoint when it
/// does not track manifests.
pub fn checkpoint_manifest_info<R>(repo: &R) -> ManifestInfoCheckpoint
where
    R: SupportsManifestTracking + ?Sized,
{
    repo.manifest_tracker()
        .map(ManifestInfoTracker::checkpoint)
        .unwrap_or_default()
}

pub fn restore_manifest_info<R>(repo: &R, checkpoint: &ManifestInfoCheckpoint)
where
    R: SupportsManifestTracking + ?Sized,
{
    if let Some(tracker) = repo.manifest_tracker() {
        tracker.restore(checkpoint);
    }
}
