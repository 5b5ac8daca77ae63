//! PORT / EPRT: active-mode negotiation.
//!
//! Both commands only validate and store the advertised endpoint; the
//! outbound connection is made when a LIST/RETR consumes the channel.

use crate::config::Config;
use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_network::data::{
    endpoint_allowed, parse_eprt_argument, parse_port_argument, DataChannel, ProtocolFamily,
};
use crate::helpers::send_response;
use crate::session::Session;
use log::{info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWrite;

const PORT_DISABLED: &str = "500 PORT/EPRT (Active Mode/Extended Active Mode) is not \
     supported. Use PASV/EPSV instead.";
const SYNTAX_ERROR: &str = "501 Syntax error in parameters or arguments.";
const BOUNCE_REJECTED: &str = "504 Command not implemented for that parameter";

/// Handles PORT (`h1,h2,h3,h4,p1,p2`).
pub async fn handle_port_command<W>(
    writer: &mut W,
    config: &Config,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if !config.port_mode {
        send_response(writer, PORT_DISABLED).await?;
        return Ok(CommandOutcome::Continue);
    }
    session.data_channel.reset();

    let Some(endpoint) = parse_port_argument(arg) else {
        send_response(writer, SYNTAX_ERROR).await?;
        return Ok(CommandOutcome::Continue);
    };
    if !check_endpoint(writer, session, endpoint).await? {
        return Ok(CommandOutcome::Continue);
    }

    session.data_channel = DataChannel::Active {
        peer: endpoint,
        family: ProtocolFamily::V4,
    };
    info!(
        "Stored active endpoint {} for {}",
        endpoint,
        session.peer_name()
    );
    send_response(writer, "200 PORT command successful.").await?;
    Ok(CommandOutcome::Continue)
}

/// Handles EPRT (`|ver|host|port|`, ver 1 = IPv4, 2 = IPv6).
pub async fn handle_eprt_command<W>(
    writer: &mut W,
    config: &Config,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if !config.port_mode {
        send_response(writer, PORT_DISABLED).await?;
        return Ok(CommandOutcome::Continue);
    }
    session.data_channel.reset();

    let Some((endpoint, family)) = parse_eprt_argument(arg) else {
        send_response(writer, SYNTAX_ERROR).await?;
        return Ok(CommandOutcome::Continue);
    };
    if !check_endpoint(writer, session, endpoint).await? {
        return Ok(CommandOutcome::Continue);
    }

    session.data_channel = DataChannel::Active {
        peer: endpoint,
        family,
    };
    info!(
        "Stored active endpoint {} for {}",
        endpoint,
        session.peer_name()
    );
    send_response(writer, "200 EPRT command successful.").await?;
    Ok(CommandOutcome::Continue)
}

/// RFC 2577 gate; replies 504 and returns false for a bounce attempt.
async fn check_endpoint<W>(
    writer: &mut W,
    session: &Session,
    endpoint: SocketAddr,
) -> io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    if endpoint_allowed(endpoint, session.peer_addr.ip()) {
        return Ok(true);
    }
    warn!(
        "Bounce-attack detected: {}, control_host={} data_endpoint={}",
        session.peer_name(),
        session.peer_addr.ip(),
        endpoint
    );
    send_response(writer, BOUNCE_REJECTED).await?;
    Ok(false)
}
