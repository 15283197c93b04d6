// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! armadad binary: the cluster primary.

use armada_primary::{env, lifecycle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match env::state_dir() {
        Ok(state_dir) if std::fs::create_dir_all(&state_dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(state_dir, "armadad.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer =
                tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer);
            tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry().with(filter).with(stderr_layer).init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let _guard = init_tracing();

    let engine = match lifecycle::build_engine() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("startup error: {err}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                cancel.cancel();
            }
        });
    }

    if let Err(err) = lifecycle::run(engine, cancel).await {
        tracing::error!(error = %err, "daemon failed");
        std::process::exit(1);
    }
}
