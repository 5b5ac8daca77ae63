//! PASV / EPSV: passive-mode negotiation.

use crate::config::Config;
use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_network::data::{
    epsv_advertisement, open_passive_listener, pasv_advertisement, DataChannel, ProtocolFamily,
};
use crate::helpers::send_response;
use crate::session::Session;
use log::{debug, error};
use std::io;
use std::net::IpAddr;
use tokio::io::AsyncWrite;

const PASV_DISABLED: &str = "500 PASV/EPSV (Passive Mode/Extended Passive Mode) is not \
     supported. Use PORT/EPRT instead.";

/// Handles PASV: listens on the control connection's local IPv4 address
/// and advertises `h1,h2,h3,h4,p1,p2`.
pub async fn handle_pasv_command<W>(
    writer: &mut W,
    config: &Config,
    session: &mut Session,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if !config.pasv_mode {
        send_response(writer, PASV_DISABLED).await?;
        return Ok(CommandOutcome::Continue);
    }
    // Renegotiation closes whatever channel was pending.
    session.data_channel.reset();

    let IpAddr::V4(local_ip) = session.local_addr.ip() else {
        send_response(
            writer,
            "500 PASV requires an IPv4 control connection. Use EPSV.",
        )
        .await?;
        return Ok(CommandOutcome::Continue);
    };

    match open_passive_listener(IpAddr::V4(local_ip)).await {
        Ok((listener, port)) => {
            debug!("PASV listener for {} on port {}", session.peer_name(), port);
            session.data_channel = DataChannel::Passive {
                listener,
                family: ProtocolFamily::V4,
            };
            send_response(writer, &pasv_advertisement(local_ip, port)).await?;
        }
        Err(e) => {
            error!(
                "Entering passive mode for {} failed: {}",
                session.peer_name(),
                e
            );
            send_response(writer, "421 Passive mode failed").await?;
        }
    }
    Ok(CommandOutcome::Continue)
}

/// Handles EPSV: as PASV for either address family, advertising only the
/// port; the client reuses the control-connection peer address.
pub async fn handle_epsv_command<W>(
    writer: &mut W,
    config: &Config,
    session: &mut Session,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if !config.pasv_mode {
        send_response(writer, PASV_DISABLED).await?;
        return Ok(CommandOutcome::Continue);
    }
    session.data_channel.reset();

    let local_ip = session.local_addr.ip();
    let family = match local_ip {
        IpAddr::V4(_) => ProtocolFamily::V4,
        IpAddr::V6(_) => ProtocolFamily::V6,
    };

    match open_passive_listener(local_ip).await {
        Ok((listener, port)) => {
            debug!("EPSV listener for {} on port {}", session.peer_name(), port);
            session.data_channel = DataChannel::Passive { listener, family };
            send_response(writer, &epsv_advertisement(port)).await?;
        }
        Err(e) => {
            error!(
                "Entering extended passive mode for {} failed: {}",
                session.peer_name(),
                e
            );
            send_response(writer, "421 Extended passive mode failed").await?;
        }
    }
    Ok(CommandOutcome::Continue)
}
