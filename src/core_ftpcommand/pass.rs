use crate::constants::MAX_BAD_PASSWORDS;
use crate::core_auth::{AccountStore, AuthOutcome};
use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::helpers::send_response;
use crate::session::{AuthState, Session};
use log::{info, warn};
use std::io;
use tokio::io::AsyncWrite;

/// Handles PASS, including the brute-force guard: the third wrong
/// password for the same proposed username ends the session with 421.
pub async fn handle_pass_command<W>(
    writer: &mut W,
    accounts: &AccountStore,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    let username = match &session.auth {
        AuthState::Authenticated(_) => {
            send_response(writer, "503 Bad sequence of commands.").await?;
            return Ok(CommandOutcome::Continue);
        }
        AuthState::Unknown => {
            send_response(writer, "530 Username not specified.").await?;
            return Ok(CommandOutcome::Continue);
        }
        AuthState::UserProposed(name) => name.clone(),
    };

    let password = arg.trim();
    if password.is_empty() {
        session.auth = AuthState::Unknown;
        send_response(writer, "530 Not logged in.").await?;
        return Ok(CommandOutcome::Continue);
    }

    match accounts.authenticate(&username, password) {
        AuthOutcome::Accepted => {
            session.clear_bad_passwords();
            session.auth = AuthState::Authenticated(username.clone());
            info!("User {} logged in from {}", username, session.peer_name());
            send_response(writer, "230 User logged in, proceed.").await?;
            Ok(CommandOutcome::Continue)
        }
        AuthOutcome::UnknownUser | AuthOutcome::BadPassword => {
            // The proposed username survives a wrong password, so repeated
            // PASS attempts keep feeding the same counter.
            let strikes = session.record_bad_password();
            if strikes >= MAX_BAD_PASSWORDS {
                warn!("Brute-force detected: {}", session.peer_name());
                send_response(
                    writer,
                    "421 Service not available, closing control connection. (Brute-force detection)",
                )
                .await?;
                return Ok(CommandOutcome::Disconnect);
            }
            send_response(writer, "530 Bad password.").await?;
            Ok(CommandOutcome::Continue)
        }
    }
}
