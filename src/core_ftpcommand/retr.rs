use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_ftpcommand::list::NO_DATA_CHANNEL;
use crate::core_ftpcommand::utils::{resolve_virtual, virtual_to_real};
use crate::helpers::send_response;
use crate::session::Session;
use log::{error, info, warn};
use std::io;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Handles RETR: streams the resolved file, byte-exact, over the
/// negotiated data channel.
pub async fn handle_retr_command<W>(
    writer: &mut W,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if session.data_channel.is_none() {
        send_response(writer, NO_DATA_CHANNEL).await?;
        return Ok(CommandOutcome::Continue);
    }

    let filename = arg.trim();
    if filename.is_empty() {
        session.data_channel.reset();
        send_response(writer, "501 Syntax error in parameters or arguments.").await?;
        return Ok(CommandOutcome::Continue);
    }

    let real_path = resolve_virtual(&session.cur_dir, filename)
        .map(|virtual_path| virtual_to_real(&session.root, &virtual_path))
        .filter(|real_path| real_path.starts_with(&session.root) && real_path.is_file());
    let Some(real_path) = real_path else {
        warn!(
            "RETR from {}: no such file {:?}",
            session.peer_name(),
            filename
        );
        session.data_channel.reset();
        send_response(writer, "501 File Not found.").await?;
        return Ok(CommandOutcome::Continue);
    };

    send_response(writer, "150 Opening ASCII mode data connection.").await?;

    let channel = session.data_channel.take();
    let mode = channel.mode_name();
    let sent = match channel.open().await {
        Ok(mut stream) => send_file(&real_path, &mut stream).await,
        Err(e) => Err(e),
    };

    match sent {
        Ok(bytes) => {
            info!(
                "Sent {:?} ({} bytes) via data connection to {}",
                real_path,
                bytes,
                session.peer_name()
            );
            send_response(writer, "226 Transfer complete.").await?;
        }
        Err(e) => {
            error!(
                "{} mode for {} failed with error: {}",
                mode,
                session.peer_name(),
                e
            );
            send_response(writer, &format!("421 {} mode failed", mode)).await?;
        }
    }
    Ok(CommandOutcome::Continue)
}

/// Copies the file onto the data socket in binary, then fully closes it:
/// the close tells the peer the transfer is done.
async fn send_file<S>(path: &std::path::Path, stream: &mut S) -> io::Result<u64>
where
    S: AsyncWrite + Unpin,
{
    let mut file = File::open(path).await?;
    let mut buffer = vec![0u8; 8192];
    let mut total: u64 = 0;
    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&buffer[..n]).await?;
        total += n as u64;
    }
    stream.shutdown().await?;
    Ok(total)
}
