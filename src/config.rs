//! Configuration for the registry transport and image targets

use crate::error::{RegistryError, Result};
use crate::reference::Reference;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_secs: u64,
    pub skip_tls: bool,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            skip_tls: false,
            user_agent: concat!("docker-manifest-headers/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportConfig {
    /// Defaults overridden by `MANIFEST_HEADERS_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(timeout) = env::var("MANIFEST_HEADERS_TIMEOUT") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                RegistryError::Config(format!("Invalid MANIFEST_HEADERS_TIMEOUT: {}", timeout))
            })?;
        }
        if let Ok(skip_tls) = env::var("MANIFEST_HEADERS_SKIP_TLS") {
            config.skip_tls = skip_tls == "true" || skip_tls == "1";
        }
        if let Ok(user_agent) = env::var("MANIFEST_HEADERS_USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone());
        if self.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        Ok(builder.build()?)
    }
}

/// Registry, repository and reference split out of a target URL such as
/// `https://registry.example.com/project/app:1.0`
#[derive(Debug, Clone)]
pub struct ImageTarget {
    pub registry_url: Url,
    pub reference: Reference,
}

impl ImageTarget {
    pub fn parse(target: &str) -> Result<Self> {
        let (protocol, remaining) = match target.find("://") {
            Some(pos) => (&target[..pos + 3], &target[pos + 3..]),
            None => ("https://", target),
        };

        let (host, path) = remaining.split_once('/').ok_or_else(|| {
            RegistryError::Validation(
                "Invalid target format. Expected: https://registry/repository:tag".to_string(),
            )
        })?;

        let registry_url = Url::parse(&format!("{}{}", protocol, host))?;

        let (path, digest) = match path.split_once('@') {
            Some((path, digest)) => (path, Some(digest)),
            None => (path, None),
        };

        // A colon after the last slash separates the tag; earlier ones belong
        // to the path.
        let last_segment = path.rfind('/').map_or(0, |pos| pos + 1);
        let (name, tag) = match path[last_segment..].rfind(':') {
            Some(pos) => (&path[..last_segment + pos], Some(&path[last_segment + pos + 1..])),
            None => (path, None),
        };

        if name.is_empty() {
            return Err(RegistryError::Validation("Repository name cannot be empty".to_string()));
        }

        let mut reference = Reference::named(name);
        match (tag, digest) {
            (Some(tag), _) => reference = reference.with_tag(tag),
            (None, None) => reference = reference.with_tag("latest"),
            (None, Some(_)) => {}
        }
        if let Some(digest) = digest {
            reference = reference.with_digest(digest);
        }

        Ok(Self {
            registry_url,
            reference,
        })
    }
}
