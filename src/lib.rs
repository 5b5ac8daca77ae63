//! An FTP server/client pair: RFC 959 core commands, RFC 2428 extended
//! passive/active modes (EPSV/EPRT) and RFC 2577 bounce-attack defenses.
//!
//! The server serves a chrooted `Public` tree to concurrent sessions
//! authenticated against a flat account file; the client drives a control
//! connection and downloads files and listings over per-transfer data
//! connections.

pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_client;
pub mod core_codec;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod helpers;
pub mod session;

pub use config::Config;
pub use core_auth::AccountStore;
