use anyhow::Result;
use liquid_silk::integration::SilkConfig;
use liquid_silk::sync::{SyncHub, SyncServer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liquid_silk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut sync = SilkConfig::from_env()?.sync;
    if let Ok(port) = std::env::var("PORT") {
        match port.parse::<u16>() {
            Ok(port) => sync = sync.with_port(port),
            Err(_) => warn!("Ignoring invalid PORT {:?}", port),
        }
    }

    info!("Election policy: {:?}", sync.election);
    let server = SyncServer::bind(&sync.bind_addr, SyncHub::new(sync.election)).await?;
    server.run().await?;
    Ok(())
}
