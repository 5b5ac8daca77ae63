//! Command-line arguments for the two binaries.

use crate::constants::DEFAULT_PORT;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ftpserverd", about = "An FTP server serving a chrooted Public tree.")]
pub struct ServerArgs {
    /// Log file name, created under the configured log directory
    pub logfile: String,

    /// TCP port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
}

#[derive(Parser, Debug)]
#[command(name = "ftpclient", about = "An interactive FTP client.")]
pub struct ClientArgs {
    /// Server host name or IP address
    pub host: String,

    /// Log file path
    pub logfile: String,

    /// Server control port
    #[arg(default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
}
