use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::helpers::send_response;
use std::io;
use tokio::io::AsyncWrite;

pub async fn handle_help_command<W>(writer: &mut W) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    send_response(
        writer,
        "214-The following commands are recognized:\r\n USER PASS QUIT HELP PWD CWD CDUP PASV EPSV PORT EPRT LIST RETR\r\n214 End",
    )
    .await?;
    Ok(CommandOutcome::Continue)
}
