//! Command-line argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "manifest-headers")]
#[command(about = "Show and send the manifest provenance headers for registry requests")]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for network operations
    #[arg(long = "timeout", short = 't', global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the headers a request for the target would carry, without sending it
    Headers {
        /// Target such as https://registry/project/app:tag
        target: String,

        /// Explicit digests, in resolution order
        #[arg(long = "digest", short = 'd')]
        digests: Vec<String>,
    },
    /// Fetch the target manifest and print the tracked manifest info
    Fetch {
        /// Target such as https://registry/project/app:tag
        target: String,

        /// Platform-specific manifest to fetch after a manifest list
        #[arg(long = "platform-digest")]
        platform_digest: Option<String>,

        /// Bearer token for the registry
        #[arg(long = "token", env = "REGISTRY_TOKEN")]
        token: Option<String>,
    },
}
