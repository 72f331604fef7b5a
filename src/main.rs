use clap::Parser;

use lantern::config::{Cli, Config};
use lantern::server::Listener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cli.log_level)
        .init();

    let cfg = Config::load(&cli)?;
    let listener = Listener::bind(&cfg).await?;

    listener
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await
}
