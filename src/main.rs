use anyhow::Result;
use liquid_silk::integration::{
    LoggingSink, Orchestrator, OrchestratorEvent, SilkConfig,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liquid_silk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = SilkConfig::from_env()?;
    if args.iter().any(|a| a == "--standalone") {
        config = config.standalone();
    }
    if args.iter().any(|a| a == "--master") {
        config.sync = config.sync.claiming_master();
    }

    info!(
        "Starting Liquid Silk ({})",
        if config.sync.enabled {
            config.sync.server_url.as_str()
        } else {
            "standalone"
        }
    );

    let (orchestrator, handle) = Orchestrator::new(config, LoggingSink::default())?;
    let workers = orchestrator.start()?;

    for event in handle.event_receiver().iter() {
        match event {
            OrchestratorEvent::Shutdown => break,
            OrchestratorEvent::GestureChanged(label) => info!("Gesture: {}", label),
            OrchestratorEvent::RoleChanged(role) => info!("Role: {}", role),
            OrchestratorEvent::HandAcquired => info!("Hand acquired"),
            OrchestratorEvent::HandLost => info!("Hand lost"),
        }
    }

    drop(handle);
    for worker in workers {
        let _ = worker.join();
    }
    Ok(())
}
