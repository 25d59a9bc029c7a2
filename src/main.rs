//! carpark - run named commands over gRPC and broadcast their output live
//!
//! This is the binary entry point. Server logic lives in `carpark-server`.

mod cli;
mod client;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use carpark_core::logging;
use carpark_server::config::{self, Config};

use crate::cli::{Args, Command, ServeArgs};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    match args.command.unwrap_or_default() {
        Command::Serve(serve) => run_server(args.config.as_deref(), serve),
        Command::Run { command, endpoint } => {
            logging::init(Some("warn"), None)?;
            client_runtime()?.block_on(client::run_command(endpoint, command))
        }
        Command::Logs { endpoint, json } => {
            logging::init(Some("warn"), None)?;
            client_runtime()?.block_on(client::follow_logs(endpoint, json))
        }
        Command::InitConfig { path } => {
            config::write_default_config(&path)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_server(config_path: Option<&std::path::Path>, serve: ServeArgs) -> Result<()> {
    let mut config = config::load_config(config_path)?;
    apply_overrides(&mut config, &serve);
    config::validate(&config)?;

    let log_dir = if config.logging.to_file {
        Some(
            config
                .logging
                .directory
                .clone()
                .unwrap_or_else(logging::default_log_directory),
        )
    } else {
        None
    };
    logging::init(config.logging.filter.as_deref(), log_dir.as_deref())?;

    info!("═══════════════════════════════════════════════════════");
    info!("carpark starting");
    info!("Listen address: {}", config.server.listen);
    info!("Worker threads: {}", config.server.worker_threads);
    info!("═══════════════════════════════════════════════════════");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .thread_name("carpark-worker")
        .enable_all()
        .build()
        .wrap_err("failed to start the async runtime")?;

    runtime.block_on(async {
        let rpc = carpark_server::build_rpc(&config)?;
        let listener = carpark_server::bind(config.server.listen).await?;
        carpark_server::serve(listener, rpc, &config.server, shutdown_signal()).await?;
        Ok::<(), color_eyre::eyre::Report>(())
    })
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut Config, serve: &ServeArgs) {
    if let Some(listen) = serve.listen {
        config.server.listen = listen;
    }
    if let Some(workers) = serve.workers {
        config.server.worker_threads = workers;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn client_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to start the async runtime")
}
