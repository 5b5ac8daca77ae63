//! Small helpers shared by the server handlers and both binaries.

use crate::constants::ROOT_FOLDER;
use crate::core_codec::write_line;
use log::debug;
use std::io;
use std::path::PathBuf;
use tokio::io::AsyncWrite;

/// Sends one reply line (CRLF appended) on the control connection.
pub async fn send_response<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    debug!("Sent: {}", line);
    write_line(writer, line).await
}

/// Splits a command line into its verb and the remainder. The remainder
/// keeps internal spaces (CWD arguments may contain them).
pub fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    }
}

/// Real root every session is chrooted to: a `Public` directory alongside
/// the server executable, created if missing.
pub fn public_root() -> io::Result<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let root = exe_dir.join(ROOT_FOLDER);
    std::fs::create_dir_all(&root)?;
    root.canonicalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_spaces_in_argument() {
        assert_eq!(split_command("CWD some dir"), ("CWD", "some dir"));
        assert_eq!(split_command("QUIT"), ("QUIT", ""));
        assert_eq!(split_command("USER alice "), ("USER", "alice"));
    }
}
