//! Per-connection session state.

use crate::core_network::data::DataChannel;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where a session stands in the USER/PASS handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    UserProposed(String),
    Authenticated(String),
}

/// One accepted control connection. The session owns its control socket
/// (held by the connection loop) and any pending data channel; both close
/// when the session ends, on any exit path.
#[derive(Debug)]
pub struct Session {
    /// Remote end of the control connection. PORT/EPRT endpoints must
    /// match this address (bounce defense).
    pub peer_addr: SocketAddr,
    /// Local end of the control connection. PASV/EPSV listeners bind here.
    pub local_addr: SocketAddr,
    pub auth: AuthState,
    /// Virtual working directory: absolute, forward slashes, rooted at `/`.
    pub cur_dir: String,
    /// Real directory all virtual paths resolve under.
    pub root: PathBuf,
    /// The single data-channel slot consumed by the next LIST/RETR.
    pub data_channel: DataChannel,
    /// Username the wrong-password counter is keyed to.
    guarded_user: Option<String>,
    bad_passwords: u32,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr, root: PathBuf) -> Self {
        Session {
            peer_addr,
            local_addr,
            auth: AuthState::Unknown,
            cur_dir: String::from("/"),
            root,
            data_channel: DataChannel::None,
            guarded_user: None,
            bad_passwords: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    /// `ip port`, the session's name in log lines.
    pub fn peer_name(&self) -> String {
        format!("{} {}", self.peer_addr.ip(), self.peer_addr.port())
    }

    /// Tracks the username for the brute-force guard. Proposing a
    /// different name restarts its counter.
    pub fn note_proposed_user(&mut self, username: &str) {
        if self.guarded_user.as_deref() != Some(username) {
            self.guarded_user = Some(username.to_string());
            self.bad_passwords = 0;
        }
    }

    /// Records a wrong password for the guarded username and returns the
    /// running count.
    pub fn record_bad_password(&mut self) -> u32 {
        self.bad_passwords += 1;
        self.bad_passwords
    }

    pub fn clear_bad_passwords(&mut self) {
        self.bad_passwords = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "10.0.0.5:50000".parse().unwrap(),
            "10.0.0.1:21".parse().unwrap(),
            PathBuf::from("/srv/Public"),
        )
    }

    #[test]
    fn starts_unknown_at_root() {
        let session = session();
        assert_eq!(session.auth, AuthState::Unknown);
        assert_eq!(session.cur_dir, "/");
        assert!(session.data_channel.is_none());
    }

    #[test]
    fn bad_password_counter_accumulates_per_user() {
        let mut session = session();
        session.note_proposed_user("alice");
        assert_eq!(session.record_bad_password(), 1);
        assert_eq!(session.record_bad_password(), 2);
        // Same name again keeps the count.
        session.note_proposed_user("alice");
        assert_eq!(session.record_bad_password(), 3);
    }

    #[test]
    fn different_user_resets_counter() {
        let mut session = session();
        session.note_proposed_user("alice");
        session.record_bad_password();
        session.record_bad_password();
        session.note_proposed_user("bob");
        assert_eq!(session.record_bad_password(), 1);
    }
}
