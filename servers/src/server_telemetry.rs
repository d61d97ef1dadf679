use anyhow::Result;
use tokio::signal;

mod telemetry_logic;
use telemetry_logic::{config, logger, watch};

use lib_telemetry::{ApiClient, SyncEngine};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    log::info!(
        "Polling backend at {} every {:?}",
        config.base_url,
        config.poll_interval
    );
    let client = ApiClient::new(&config.base_url)?;
    let engine = SyncEngine::new(client, config.poll_interval);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let depot_handle = tokio::spawn(watch::run_depot_watch(
        engine.clone(),
        config.report_interval,
        shutdown_tx.subscribe(),
    ));

    let storage_handle = tokio::spawn(watch::run_storage_watch(
        engine,
        config.report_interval,
        shutdown_tx.subscribe(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut term_signal = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    // Wait for components to shut down
    let _ = tokio::try_join!(depot_handle, storage_handle);

    log::info!("Shutdown complete.");
    Ok(())
}
