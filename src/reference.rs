//! Named references and digests as handed to the tracker
//!
//! Both types are opaque carriers: tag and digest syntax is assumed to have
//! been validated by whoever built the reference.

use sha2::{Digest as _, Sha256};
use std::fmt;

/// Content digest of a manifest, e.g. `sha256:<hex>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Compute the `sha256:` digest of raw manifest bytes
    pub fn from_content(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Digest {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Digest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A repository name that may carry a tag, a digest, or both
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    name: String,
    tag: Option<String>,
    digest: Option<Digest>,
}

impl Reference {
    /// Bare repository name with neither tag nor digest
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            digest: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_digest(mut self, digest: impl Into<Digest>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    /// Path segment for the `/manifests/` endpoint; a digest wins over a tag
    pub fn manifest_reference(&self) -> Option<&str> {
        self.digest
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(Digest::as_str)
            .or(self.tag.as_deref())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_from_content() {
        let digest = Digest::from_content(b"");
        assert_eq!(
            digest.as_str(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_manifest_reference_prefers_digest() {
        let reference = Reference::named("foo")
            .with_tag("1.0")
            .with_digest("sha256:1234");
        assert_eq!(reference.manifest_reference(), Some("sha256:1234"));
        assert_eq!(reference.to_string(), "foo:1.0@sha256:1234");
    }

    #[test]
    fn test_manifest_reference_falls_back_to_tag() {
        let reference = Reference::named("foo").with_tag("1.0").with_digest("");
        assert_eq!(reference.manifest_reference(), Some("1.0"));
        assert_eq!(Reference::named("foo").manifest_reference(), None);
    }
}
