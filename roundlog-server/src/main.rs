//! Realtime inspection-log server backed by an embedded roundlog store.
//!
//! Starts the record generator on a background thread and serves the store
//! over HTTP. Readers poll `/cambrian001/inspection-log/realtime` with the
//! last `inspectionID` (round) and `recordID` (slot) they have seen.

mod api;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use roundlog::{CircularStore, Generator, GeneratorConfig, StoreConfig};
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;

/// roundlog-server: realtime record feed over HTTP.
#[derive(Parser)]
#[command(name = "roundlog-server", version, about)]
struct Cli {
    /// Port for the HTTP API.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Number of slots per round.
    #[arg(long, default_value = "100")]
    capacity: usize,

    /// Generator tick interval in milliseconds.
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Size of the per-tick image draw space.
    #[arg(long, default_value = "20")]
    image_draws: u32,

    /// Number of draws that attach an image.
    #[arg(long, default_value = "10")]
    image_candidates: u32,

    /// Public base URL used when linking generated images.
    /// Defaults to `http://localhost:<port>`.
    #[arg(long)]
    public_url: Option<String>,

    /// Directory served under `/cambrian001/static`.
    #[arg(long, default_value = "./assets")]
    assets_dir: PathBuf,

    /// Directory holding the `index.html` viewer page.
    #[arg(long, default_value = "./web/views")]
    views_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("server failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(CircularStore::new(StoreConfig::new(cli.capacity)?)?);

    let generator_config = GeneratorConfig {
        interval: Duration::from_millis(cli.tick_ms),
        image_draws: cli.image_draws,
        image_candidates: cli.image_candidates,
        image_base_url: image_base_url(cli.public_url.as_deref(), cli.port),
        ..GeneratorConfig::default()
    };
    let generator = Generator::from_os_rng(Arc::clone(&store), generator_config)?.spawn()?;

    let state = Arc::new(ApiState::new(store, cli.assets_dir, cli.views_dir));
    let served = api::run_api_server(state, cli.port);

    generator.shutdown();
    served?;

    tracing::info!("server exited cleanly");
    Ok(())
}

/// Base URL for generated image links, under the static assets route.
fn image_base_url(public_url: Option<&str>, port: u16) -> String {
    let origin = public_url.map_or_else(|| format!("http://localhost:{port}"), str::to_string);
    format!(
        "{}{}",
        origin.trim_end_matches('/'),
        api::STATIC_PREFIX.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_base_url_follows_port() {
        assert_eq!(
            image_base_url(None, 9000),
            "http://localhost:9000/cambrian001/static"
        );

        let cli = Cli::parse_from(["roundlog-server", "--port", "9001"]);
        assert_eq!(
            image_base_url(cli.public_url.as_deref(), cli.port),
            "http://localhost:9001/cambrian001/static"
        );
    }

    #[test]
    fn test_image_base_url_prefers_public_url() {
        assert_eq!(
            image_base_url(Some("https://inspect.example.com/"), 9000),
            "https://inspect.example.com/cambrian001/static"
        );
    }
}
