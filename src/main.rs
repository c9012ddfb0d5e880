// src/main.rs
use crossover_futures::{AppConfig, BinanceFuturesClient, TradingEngine};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Stdout plus a daily-rolling file. The guard must outlive the engine.
fn init_tracing() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "crossover_futures.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guard = init_tracing();

    // 1. Load Configuration (fatal on error)
    let config = AppConfig::new()?;

    info!("========================================");
    info!("     CROSSOVER FUTURES - v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");

    // 2. Initialize Components
    let client = BinanceFuturesClient::from_config(&config)?;
    let mut engine = TradingEngine::bootstrap(config, Box::new(client)).await?;

    // 3. Run until Ctrl+C
    tokio::select! {
        _ = engine.run() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received. Exiting.");
        }
    }

    info!(operations = engine.journal().len(), "Engine stopped");
    Ok(())
}
