use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::io;
use tokio::io::AsyncWrite;

pub async fn handle_pwd_command<W>(
    writer: &mut W,
    session: &mut Session,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    let reply = format!("257 \"{}\" is the current directory.", session.cur_dir);
    send_response(writer, &reply).await?;
    Ok(CommandOutcome::Continue)
}
