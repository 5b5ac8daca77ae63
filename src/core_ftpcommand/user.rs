use crate::core_auth::AccountStore;
use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::helpers::send_response;
use crate::session::{AuthState, Session};
use log::warn;
use std::io;
use tokio::io::AsyncWrite;

/// Handles USER. Any USER restarts the handshake; proposing a different
/// name also restarts the wrong-password counter.
pub async fn handle_user_command<W>(
    writer: &mut W,
    accounts: &AccountStore,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    session.auth = AuthState::Unknown;
    let username = arg.trim();
    if username.is_empty() {
        send_response(writer, "530 Invalid user name.").await?;
        return Ok(CommandOutcome::Continue);
    }
    session.note_proposed_user(username);
    if !accounts.contains(username) {
        warn!(
            "Rejected unknown user {:?} from {}",
            username,
            session.peer_name()
        );
        send_response(writer, "530 Invalid user name.").await?;
        return Ok(CommandOutcome::Continue);
    }
    session.auth = AuthState::UserProposed(username.to_string());
    send_response(writer, "331 User name okay, need password.").await?;
    Ok(CommandOutcome::Continue)
}
