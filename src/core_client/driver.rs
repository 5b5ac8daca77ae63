//! The client driver: one control connection, free-form commands in,
//! replies and data transfers out.
//!
//! The driver stays deliberately thin. It does not second-guess command
//! semantics; it only prepares local listeners for PORT/EPRT, opens the
//! data connection when the server announces a transfer (150/125), routes
//! RETR bytes into a local file and logs LIST output.

use crate::constants::{CLIENT_CONNECT_TIMEOUT, CLIENT_DATA_CONNECT_TIMEOUT, DATA_TIMEOUT};
use crate::core_codec::{read_reply, write_line, LineError, Reply};
use crate::helpers::split_command;
use log::{info, warn};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("cannot resolve host {0}")]
    Resolve(String),

    #[error("unable to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("received bad greeting (code {0})")]
    BadGreeting(u16),

    #[error("server did not accept username {0}")]
    UserRejected(String),

    #[error("server did not accept the username/password pair for {0}")]
    LoginRejected(String),

    #[error("PORT needs an IPv4 local address; use eprt")]
    PortNeedsIpv4,

    #[error(transparent)]
    Line(#[from] LineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How the next transfer's data connection will be made.
#[derive(Debug)]
enum ClientDataMode {
    Inactive,
    /// Server listens; we connect out to the parsed endpoint.
    Passive(SocketAddr),
    /// We listen; the server connects in.
    Active(TcpListener),
}

pub struct FtpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    remote_ip: IpAddr,
    local_ip: IpAddr,
    data: ClientDataMode,
    download_dir: PathBuf,
}

impl FtpClient {
    /// Connects the control channel and consumes the `220` greeting.
    pub async fn connect(host: &str, port: u16) -> Result<Self, FtpError> {
        let addr = lookup_host((host, port))
            .await
            .map_err(|_| FtpError::Resolve(host.to_string()))?
            .next()
            .ok_or_else(|| FtpError::Resolve(host.to_string()))?;
        info!("Connecting to {} ({})", host, addr);
        let stream = timeout(CLIENT_CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| FtpError::Connect {
                addr,
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| FtpError::Connect { addr, source })?;

        let local_ip = stream.local_addr()?.ip();
        let (read_half, writer) = stream.into_split();
        let mut client = FtpClient {
            reader: BufReader::new(read_half),
            writer,
            remote_ip: addr.ip(),
            local_ip,
            data: ClientDataMode::Inactive,
            download_dir: PathBuf::from("."),
        };

        let greeting = client.read_logged_reply().await?;
        if greeting.code != 220 {
            return Err(FtpError::BadGreeting(greeting.code));
        }
        Ok(client)
    }

    /// Where RETR downloads land; defaults to the working directory.
    pub fn set_download_dir(&mut self, dir: impl Into<PathBuf>) {
        self.download_dir = dir.into();
    }

    /// USER/PASS handshake.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), FtpError> {
        info!("Login: {}", username);
        self.send_line(&format!("USER {}", username)).await?;
        let reply = self.read_logged_reply().await?;
        if reply.code != 331 && reply.code != 220 {
            return Err(FtpError::UserRejected(username.to_string()));
        }
        self.send_line(&format!("PASS {}", password)).await?;
        let reply = self.read_logged_reply().await?;
        if reply.code != 230 && reply.code != 220 {
            return Err(FtpError::LoginRejected(username.to_string()));
        }
        Ok(())
    }

    /// Sends one user command and drives it to completion: negotiation
    /// replies update the data mode, transfer replies (150/125) run the
    /// transfer. Returns the final reply for the command.
    pub async fn execute(&mut self, input: &str) -> Result<Reply, FtpError> {
        let input = input.trim();
        let (verb, arg) = split_command(input);
        let verb = verb.to_ascii_lowercase();

        match verb.as_str() {
            "port" => self.send_active_request(false).await?,
            "eprt" => self.send_active_request(true).await?,
            _ => self.send_line(input).await?,
        }

        // In passive mode the server sends 150 and then blocks in accept,
        // so the data connection must be dialed before reading the reply.
        let mut data_stream: Option<TcpStream> = None;
        if verb == "list" || verb == "retr" {
            if let ClientDataMode::Passive(addr) = &self.data {
                let addr = *addr;
                match timeout(CLIENT_DATA_CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
                    Ok(Ok(stream)) => {
                        info!("Data connection to {} established.", addr);
                        data_stream = Some(stream);
                    }
                    Ok(Err(e)) => warn!("Unable to open data connection: {}", e),
                    Err(_) => warn!("Unable to open data connection: timed out"),
                }
            }
        }

        let reply = self.read_logged_reply().await?;
        self.process_reply(&verb, arg, reply, data_stream).await
    }

    async fn process_reply(
        &mut self,
        verb: &str,
        arg: &str,
        reply: Reply,
        data_stream: Option<TcpStream>,
    ) -> Result<Reply, FtpError> {
        match verb {
            "pasv" => {
                self.data = match parse_pasv_reply(&reply.message) {
                    Some(addr) if reply.code == 227 => ClientDataMode::Passive(addr),
                    _ => ClientDataMode::Inactive,
                };
            }
            "epsv" => {
                self.data = match parse_epsv_reply(&reply.message) {
                    Some(port) if reply.code == 229 => {
                        ClientDataMode::Passive(SocketAddr::new(self.remote_ip, port))
                    }
                    _ => ClientDataMode::Inactive,
                };
            }
            "port" | "eprt" => {
                if reply.code != 200 {
                    // Drop the prepared listener.
                    self.data = ClientDataMode::Inactive;
                }
            }
            "list" | "retr" if reply.code == 150 || reply.code == 125 => {
                return self.finish_transfer(verb, arg, data_stream).await;
            }
            _ => {}
        }
        Ok(reply)
    }

    /// Runs the data phase after a 150/125 and returns the server's
    /// closing reply (226 on success, 421 on a server-side failure).
    async fn finish_transfer(
        &mut self,
        verb: &str,
        arg: &str,
        data_stream: Option<TcpStream>,
    ) -> Result<Reply, FtpError> {
        let stream = match std::mem::replace(&mut self.data, ClientDataMode::Inactive) {
            ClientDataMode::Active(listener) => match timeout(DATA_TIMEOUT, listener.accept()).await
            {
                Ok(Ok((stream, addr))) => {
                    info!("Accepted data connection from {}", addr);
                    Some(stream)
                }
                Ok(Err(e)) => {
                    warn!("Active mode fail: {}", e);
                    None
                }
                Err(_) => {
                    warn!("Active mode fail: accept timed out");
                    None
                }
            },
            ClientDataMode::Passive(_) | ClientDataMode::Inactive => data_stream,
        };

        if let Some(mut stream) = stream {
            // The server's close delimits the payload; read to EOF.
            let mut payload = Vec::new();
            match stream.read_to_end(&mut payload).await {
                Ok(_) => match verb {
                    "retr" => self.save_download(arg, &payload).await?,
                    _ => info!(
                        "Received {} bytes:\n{}",
                        payload.len(),
                        String::from_utf8_lossy(&payload)
                    ),
                },
                Err(e) => warn!("Data connection read failed: {}", e),
            }
        }

        self.read_logged_reply().await
    }

    async fn save_download(&self, arg: &str, payload: &[u8]) -> Result<(), FtpError> {
        let name = Path::new(arg.trim())
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("download"));
        let target = self.download_dir.join(name);
        tokio::fs::write(&target, payload).await?;
        info!(
            "Received file \"{}\" ({} bytes)",
            target.display(),
            payload.len()
        );
        Ok(())
    }

    /// Binds a fresh local listener and sends the matching PORT/EPRT line.
    async fn send_active_request(&mut self, extended: bool) -> Result<(), FtpError> {
        self.data = ClientDataMode::Inactive;
        let listener = TcpListener::bind(SocketAddr::new(self.local_ip, 0)).await?;
        let port = listener.local_addr()?.port();

        let line = if extended {
            let version = if self.local_ip.is_ipv4() { 1 } else { 2 };
            format!("EPRT |{}|{}|{}|", version, self.local_ip, port)
        } else {
            let IpAddr::V4(ip) = self.local_ip else {
                return Err(FtpError::PortNeedsIpv4);
            };
            let octets = ip.octets();
            format!(
                "PORT {},{},{},{},{},{}",
                octets[0],
                octets[1],
                octets[2],
                octets[3],
                port / 256,
                port % 256
            )
        };
        self.data = ClientDataMode::Active(listener);
        self.send_line(&line).await
    }

    async fn send_line(&mut self, line: &str) -> Result<(), FtpError> {
        info!("Sent: {}", line);
        write_line(&mut self.writer, line).await?;
        Ok(())
    }

    async fn read_logged_reply(&mut self) -> Result<Reply, FtpError> {
        let reply = read_reply(&mut self.reader).await?;
        info!("Received: {}", reply.message);
        Ok(reply)
    }
}

/// Pulls `h1,h2,h3,h4,p1,p2` out of a 227 text: scan for the first comma
/// and take six comma-separated integers around it.
fn parse_pasv_reply(message: &str) -> Option<SocketAddr> {
    const JUNK: &[char] = &[' ', '(', ')', '\r', '\n', '*', '.', ';', '|'];
    let comma = message.find(',')?;
    let tail = &message[comma.saturating_sub(3)..];
    let fields: Vec<u8> = tail
        .split(',')
        .take(6)
        .map(|field| field.trim_matches(JUNK).parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() != 6 {
        return None;
    }
    let ip = std::net::Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
    let port = u16::from(fields[4]) * 256 + u16::from(fields[5]);
    Some(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Pulls the port out of a 229 `(|||port|)` text.
fn parse_epsv_reply(message: &str) -> Option<u16> {
    const JUNK: &[char] = &[' ', '(', ')', '\r', '\n', '*', '.', ';'];
    let bar = message.find('|')?;
    message[bar..]
        .trim_matches(JUNK)
        .trim_matches('|')
        .parse::<u16>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pasv_reply_with_parentheses() {
        let addr = parse_pasv_reply("227 Entering Passive Mode (127,0,0,1,4,1).").unwrap();
        assert_eq!(addr, "127.0.0.1:1025".parse().unwrap());
    }

    #[test]
    fn parses_bare_pasv_reply() {
        let addr = parse_pasv_reply("227 Entering Passive Mode 10,0,0,5,8,0").unwrap();
        assert_eq!(addr, "10.0.0.5:2048".parse().unwrap());
    }

    #[test]
    fn pasv_reply_without_numbers_is_rejected() {
        assert!(parse_pasv_reply("227 Entering Passive Mode").is_none());
        assert!(parse_pasv_reply("227 nonsense (a,b,c,d,e,f)").is_none());
    }

    #[test]
    fn parses_epsv_reply() {
        assert_eq!(
            parse_epsv_reply("229 Entering Extended Passive Mode (|||2048|)"),
            Some(2048)
        );
    }

    #[test]
    fn epsv_reply_without_port_is_rejected() {
        assert!(parse_epsv_reply("229 Entering Extended Passive Mode").is_none());
        assert!(parse_epsv_reply("229 (|||way too big 99999999|)").is_none());
    }
}
