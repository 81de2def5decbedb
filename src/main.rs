//! Binary entry point: load configuration, install tracing, serve.

use media_gallery_server::{init_tracing, run, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default()?;
    init_tracing(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting media gallery server"
    );

    run(config).await
}
