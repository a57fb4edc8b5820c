//! Default command: copy standard input to every destination.

use anyhow::Result;
use fanout::CancellationToken;
use tracing::{info, warn};

use super::resolve_config;
use crate::cli::Cli;
use crate::pipeline::Pipeline;

/// Execute a normal run
pub async fn run_pipeline(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;

    info!(
        destinations = config.destinations.len(),
        buffer_size = config.buffer_size,
        "Configuration loaded"
    );

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            setup_shutdown_signal().await;
            warn!("Received shutdown signal, stopping...");
            cancel.cancel();
        }
    });

    let pipeline = Pipeline::new(config, cancel).with_metrics_export(cli.metrics_port != 0);
    let result = pipeline.run(tokio::io::stdin()).await;
    signal_task.abort();

    let stats = result?;
    stats.log_summary();
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
