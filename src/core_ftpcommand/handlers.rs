//! The per-session command dispatch.

use crate::config::Config;
use crate::core_auth::AccountStore;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{cdup, cwd, help, list, pass, pwd, quit, retr, user};
use crate::core_network::{pasv, port};
use crate::helpers::{send_response, split_command};
use crate::session::Session;
use std::io;
use tokio::io::AsyncWrite;

/// What the session loop should do after a command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Disconnect,
}

/// Runs one command to completion, including any data transfer, and
/// writes its replies. Only control-connection failures surface as
/// errors; everything else becomes a status reply.
pub async fn dispatch<W>(
    writer: &mut W,
    config: &Config,
    accounts: &AccountStore,
    session: &mut Session,
    line: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    let (verb, arg) = split_command(line);
    let Some(command) = FtpCommand::from_str(verb) else {
        send_response(writer, "202 Not implemented").await?;
        return Ok(CommandOutcome::Continue);
    };

    match command {
        FtpCommand::USER => user::handle_user_command(writer, accounts, session, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(writer, accounts, session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(writer).await,
        FtpCommand::HELP => help::handle_help_command(writer).await,
        _ if !session.is_authenticated() => {
            send_response(writer, "530 Authentication required.").await?;
            Ok(CommandOutcome::Continue)
        }
        FtpCommand::PWD => pwd::handle_pwd_command(writer, session).await,
        FtpCommand::CWD => cwd::handle_cwd_command(writer, session, arg).await,
        FtpCommand::CDUP => cdup::handle_cdup_command(writer, session).await,
        FtpCommand::PASV => pasv::handle_pasv_command(writer, config, session).await,
        FtpCommand::EPSV => pasv::handle_epsv_command(writer, config, session).await,
        FtpCommand::PORT => port::handle_port_command(writer, config, session, arg).await,
        FtpCommand::EPRT => port::handle_eprt_command(writer, config, session, arg).await,
        FtpCommand::LIST => list::handle_list_command(writer, session, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(writer, session, arg).await,
    }
}
