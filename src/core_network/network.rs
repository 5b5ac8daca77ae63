//! The session supervisor: accept loop, per-session isolation, shutdown.

use crate::config::Config;
use crate::core_auth::AccountStore;
use crate::core_codec::{read_line, LineError};
use crate::core_ftpcommand::{dispatch, CommandOutcome};
use crate::helpers::send_response;
use crate::session::Session;
use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Runs the accept loop until `shutdown` fires, spawning one isolated
/// task per control connection. Per-session failures are logged and never
/// stop the loop; on shutdown every session observes the same signal and
/// the supervisor joins them all.
pub async fn start_server(
    listener: TcpListener,
    config: Arc<Config>,
    accounts: Arc<AccountStore>,
    root: PathBuf,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!("Server listening on {}", listener.local_addr()?);
    let mut sessions = JoinSet::new();
    let mut accept_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => {
                    info!("Client from {} {} accepted", addr.ip(), addr.port());
                    let config = Arc::clone(&config);
                    let accounts = Arc::clone(&accounts);
                    let root = root.clone();
                    let shutdown = shutdown.clone();
                    sessions.spawn(async move {
                        if let Err(e) = handle_connection(socket, config, accounts, root, shutdown).await {
                            warn!("Session error for {} {}: {:#}", addr.ip(), addr.port(), e);
                        }
                        info!("Disconnected: {} {}", addr.ip(), addr.port());
                    });
                }
                Err(e) => warn!("Accept failed: {}", e),
            },
            _ = accept_shutdown.changed() => break,
        }
    }

    info!("Stopping server...");
    while sessions.join_next().await.is_some() {}
    info!("All clients disconnected. Server stopped.");
    Ok(())
}

/// One session: greet, then read-dispatch until QUIT, peer close,
/// brute-force 421, an oversized line, or server shutdown. The session
/// owns its control socket and any pending data channel; both close when
/// this function returns, on every exit path.
async fn handle_connection(
    socket: TcpStream,
    config: Arc<Config>,
    accounts: Arc<AccountStore>,
    root: PathBuf,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let peer_addr = socket.peer_addr()?;
    let local_addr = socket.local_addr()?;
    let (read_half, mut writer) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(peer_addr, local_addr, root);

    send_response(&mut writer, "220 ferroftp service ready.").await?;

    loop {
        let line = tokio::select! {
            line = read_line(&mut reader) => line,
            _ = shutdown.changed() => {
                let _ = send_response(
                    &mut writer,
                    "421 Service not available, closing control connection.",
                )
                .await;
                break;
            }
        };
        match line {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                info!("Received from {}: {}", session.peer_name(), line);
                match dispatch(&mut writer, &config, &accounts, &mut session, line).await? {
                    CommandOutcome::Continue => {}
                    CommandOutcome::Disconnect => break,
                }
            }
            Ok(None) => break,
            Err(LineError::TooLong) => {
                warn!("Oversized command line from {}", session.peer_name());
                let _ = send_response(&mut writer, "500 Line too long.").await;
                break;
            }
            Err(LineError::Io(e)) => return Err(e.into()),
        }
    }
    Ok(())
}
