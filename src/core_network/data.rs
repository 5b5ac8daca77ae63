//! The per-session data channel: negotiation state, endpoint parsing and
//! validation, and the transfer-time open.
//!
//! A session holds at most one `DataChannel`. PASV/EPSV put a listener in
//! the slot, PORT/EPRT store a validated peer endpoint (no connection is
//! made until the transfer), and exactly one LIST or RETR consumes it.

use crate::constants::DATA_TIMEOUT;
use log::debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    V4,
    V6,
}

#[derive(Debug)]
pub enum DataChannel {
    /// Nothing negotiated; LIST/RETR must fail with 426.
    None,
    /// Server listens, client connects in.
    Passive {
        listener: TcpListener,
        family: ProtocolFamily,
    },
    /// Server will connect out to the stored endpoint.
    Active {
        peer: SocketAddr,
        family: ProtocolFamily,
    },
}

impl DataChannel {
    pub fn is_none(&self) -> bool {
        matches!(self, DataChannel::None)
    }

    /// Empties the slot; any listener in it is closed by the drop.
    pub fn reset(&mut self) {
        *self = DataChannel::None;
    }

    /// Takes the negotiated channel out of the slot, leaving `None`.
    pub fn take(&mut self) -> DataChannel {
        std::mem::replace(self, DataChannel::None)
    }

    /// `"Active"` / `"Passive"`, for 421 replies and log lines.
    pub fn mode_name(&self) -> &'static str {
        match self {
            DataChannel::None => "None",
            DataChannel::Passive { .. } => "Passive",
            DataChannel::Active { .. } => "Active",
        }
    }

    /// Opens the data stream for one transfer, consuming the channel:
    /// accept the inbound connection (passive) or connect out (active),
    /// either within [`DATA_TIMEOUT`].
    pub async fn open(self) -> io::Result<TcpStream> {
        match self {
            DataChannel::None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no data channel negotiated",
            )),
            DataChannel::Passive { listener, family } => {
                let (stream, addr) = timeout(DATA_TIMEOUT, listener.accept())
                    .await
                    .map_err(|_| {
                        io::Error::new(io::ErrorKind::TimedOut, "data connection accept timed out")
                    })??;
                debug!("Accepted {:?} data connection from {}", family, addr);
                Ok(stream)
            }
            DataChannel::Active { peer, family } => {
                let stream = timeout(DATA_TIMEOUT, TcpStream::connect(peer))
                    .await
                    .map_err(|_| {
                        io::Error::new(io::ErrorKind::TimedOut, "data connection connect timed out")
                    })??;
                debug!("Opened {:?} data connection to {}", family, peer);
                Ok(stream)
            }
        }
    }
}

/// Binds a passive-mode listener on `local_ip` with an OS-assigned port
/// and a backlog of one: each listener accepts exactly one transfer.
pub async fn open_passive_listener(local_ip: IpAddr) -> io::Result<(TcpListener, u16)> {
    let socket = match local_ip {
        IpAddr::V4(_) => TcpSocket::new_v4()?,
        IpAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.bind(SocketAddr::new(local_ip, 0))?;
    let listener = socket.listen(1)?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// `227` text advertising `h1,h2,h3,h4,p1,p2` with port = p1 * 256 + p2.
pub fn pasv_advertisement(ip: Ipv4Addr, port: u16) -> String {
    let octets = ip.octets();
    format!(
        "227 Entering Passive Mode {},{},{},{},{},{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

/// `229` text; the client reuses the control-connection peer address.
pub fn epsv_advertisement(port: u16) -> String {
    format!("229 Entering Extended Passive Mode (|||{}|)", port)
}

/// Parses a `PORT h1,h2,h3,h4,p1,p2` argument.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let fields: Vec<&str> = arg.trim().split(',').collect();
    if fields.len() != 6 {
        return None;
    }
    let numbers: Vec<u8> = fields
        .iter()
        .map(|f| f.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let ip = Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3]);
    let port = u16::from(numbers[4]) * 256 + u16::from(numbers[5]);
    Some(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Parses an `EPRT |ver|host|port|` argument, `ver` 1 (IPv4) or 2 (IPv6).
pub fn parse_eprt_argument(arg: &str) -> Option<(SocketAddr, ProtocolFamily)> {
    let trimmed = arg.trim();
    let fields: Vec<&str> = trimmed.split('|').collect();
    // "|1|host|port|" splits into ["", "1", "host", "port", ""].
    if fields.len() != 5 || !fields[0].is_empty() || !fields[4].is_empty() {
        return None;
    }
    let port = fields[3].parse::<u16>().ok()?;
    match fields[1] {
        "1" => {
            let ip = fields[2].parse::<Ipv4Addr>().ok()?;
            Some((
                SocketAddr::new(IpAddr::V4(ip), port),
                ProtocolFamily::V4,
            ))
        }
        "2" => {
            let ip = fields[2].parse::<Ipv6Addr>().ok()?;
            Some((
                SocketAddr::new(IpAddr::V6(ip), port),
                ProtocolFamily::V6,
            ))
        }
        _ => None,
    }
}

/// RFC 2577 bounce defense: the advertised endpoint must be the control
/// peer itself, on a non-well-known port.
pub fn endpoint_allowed(endpoint: SocketAddr, control_peer: IpAddr) -> bool {
    endpoint.port() >= 1024 && endpoint.ip() == control_peer
}
