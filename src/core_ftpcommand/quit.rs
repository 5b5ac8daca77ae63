use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::helpers::send_response;
use std::io;
use tokio::io::AsyncWrite;

pub async fn handle_quit_command<W>(writer: &mut W) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    send_response(writer, "221 Goodbye, closing session.").await?;
    Ok(CommandOutcome::Disconnect)
}
