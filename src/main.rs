use clap::Parser;
use docker_manifest_headers::cli::{Args, Runner};
use docker_manifest_headers::logging::init_tracing;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("❌ ERROR: {}", e);
    }

    if let Err(e) = Runner::new(args).run().await {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}
