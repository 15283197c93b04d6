// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! armada-worker binary: load config from the environment and run the
//! worker service until SIGINT/SIGTERM.

use armada_worker::{WorkerConfig, WorkerService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let mut service = match WorkerService::new(config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("client setup error: {err}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    if let Err(err) = service.run(cancel).await {
        tracing::error!(error = %err, "worker service failed");
        std::process::exit(1);
    }
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(signal) => signal,
                Err(err) => {
                    tracing::error!(error = %err, "cannot install SIGTERM handler");
                    let _ = ctrl_c.await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });
}
