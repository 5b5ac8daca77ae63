use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_ftpcommand::utils::parent_virtual;
use crate::helpers::send_response;
use crate::session::Session;
use std::io;
use tokio::io::AsyncWrite;

/// Handles CDUP; moving up from `/` clamps at `/` rather than failing.
pub async fn handle_cdup_command<W>(
    writer: &mut W,
    session: &mut Session,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    session.cur_dir = parent_virtual(&session.cur_dir);
    let reply = format!("250 Directory changed to \"{}\"", session.cur_dir);
    send_response(writer, &reply).await?;
    Ok(CommandOutcome::Continue)
}
