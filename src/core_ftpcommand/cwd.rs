use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_ftpcommand::utils::{resolve_virtual, virtual_to_real};
use crate::helpers::send_response;
use crate::session::Session;
use log::warn;
use std::io;
use tokio::io::AsyncWrite;

/// Handles CWD. The operand resolves lexically against the session's
/// virtual directory; anything that escapes the root or is not a real
/// directory is refused with 550.
pub async fn handle_cwd_command<W>(
    writer: &mut W,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if arg.trim().is_empty() {
        send_response(writer, "501 Syntax error in parameters or arguments.").await?;
        return Ok(CommandOutcome::Continue);
    }
    let refused = format!("550 {}: No such file or directory.", arg);

    let Some(virtual_path) = resolve_virtual(&session.cur_dir, arg) else {
        warn!(
            "CWD escape attempt from {}: {:?}",
            session.peer_name(),
            arg
        );
        send_response(writer, &refused).await?;
        return Ok(CommandOutcome::Continue);
    };
    let real_path = virtual_to_real(&session.root, &virtual_path);
    if !real_path.starts_with(&session.root) || !real_path.is_dir() {
        send_response(writer, &refused).await?;
        return Ok(CommandOutcome::Continue);
    }

    session.cur_dir = virtual_path;
    let reply = format!("250 Directory changed to \"{}\"", session.cur_dir);
    send_response(writer, &reply).await?;
    Ok(CommandOutcome::Continue)
}
