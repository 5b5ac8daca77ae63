use anyhow::{Context, Result};
use clap::Parser;
use ferroftp::constants::CONFIG_FILE;
use ferroftp::core_cli::ServerArgs;
use ferroftp::core_network::network;
use ferroftp::helpers::public_root;
use ferroftp::{AccountStore, Config};
use log::info;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    // All startup failures exit with a diagnostic before a socket opens.
    let config = Config::load(Path::new(CONFIG_FILE))
        .with_context(|| format!("Failed to load configuration file: {}", CONFIG_FILE))?;
    let accounts = AccountStore::load(&config.username_file).with_context(|| {
        format!(
            "Failed to load accounts file: {}",
            config.username_file.display()
        )
    })?;
    ferroftp::core_log::init(
        &config.log_directory.join(&args.logfile),
        config.num_log_files,
    )
    .context("Failed to open log file")?;

    info!("{} account records loaded.", accounts.len());

    let root = public_root().context("Failed to create the Public root directory")?;
    info!("Serving root directory {:?}", root);

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Server start FAIL on port {}", args.port))?;
    info!("Starting server on port {}....", args.port);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down.");
            let _ = shutdown_tx.send(true);
        }
    });

    network::start_server(
        listener,
        Arc::new(config),
        Arc::new(accounts),
        root,
        shutdown_rx,
    )
    .await
}
