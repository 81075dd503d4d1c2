//! Runner executing the parsed command

use crate::cli::args::{Args, Command};
use crate::config::{ImageTarget, TransportConfig};
use crate::error::Result;
use crate::manifest_info::ManifestInfoTracker;
use crate::reference::Digest;
use crate::repository::TrackedRepository;
use crate::transport::ModifyingTransport;
use reqwest::header::HeaderMap;
use tracing::info;

pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    fn transport_config(&self) -> Result<TransportConfig> {
        let mut config = TransportConfig::from_env()?;
        if self.args.skip_tls {
            config.skip_tls = true;
        }
        if let Some(timeout) = self.args.timeout {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }

    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Command::Headers { target, digests } => self.print_headers(target, digests),
            Command::Fetch {
                target,
                platform_digest,
                token,
            } => {
                self.fetch(target, platform_digest.as_deref(), token.clone())
                    .await
            }
        }
    }

    fn print_headers(&self, target: &str, digests: &[String]) -> Result<()> {
        let target = ImageTarget::parse(target)?;
        let digests: Vec<Digest> = digests.iter().map(|d| Digest::from(d.as_str())).collect();

        let tracker = ManifestInfoTracker::new();
        tracker.update(&target.reference, &digests);

        let mut headers = HeaderMap::new();
        tracker.annotate_headers(&mut headers);
        if headers.is_empty() {
            println!("(no manifest headers)");
        }
        for (name, value) in &headers {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        Ok(())
    }

    async fn fetch(
        &self,
        target: &str,
        platform_digest: Option<&str>,
        token: Option<String>,
    ) -> Result<()> {
        let target = ImageTarget::parse(target)?;
        let transport = ModifyingTransport::from_config(&self.transport_config()?)?;
        let repo = TrackedRepository::new(
            target.registry_url.clone(),
            target.reference.name(),
            transport,
        )
        .with_token(token);

        let manifest = repo.get_manifest(&target.reference).await?;
        info!(
            reference = %target.reference,
            content_type = %manifest.content_type,
            size = manifest.data.len(),
            "Fetched manifest"
        );

        if let Some(digest) = platform_digest {
            let child = repo.get_child_manifest(&Digest::from(digest)).await?;
            info!(
                digest = %digest,
                content_type = %child.content_type,
                size = child.data.len(),
                "Fetched platform manifest"
            );
        }

        println!("{}", serde_json::to_string_pretty(&repo.tracker().snapshot())?);
        Ok(())
    }
}
