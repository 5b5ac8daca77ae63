//! Server reply parsing for the client side of the control connection.

use super::line::{read_line, LineError};
use tokio::io::AsyncRead;

/// One complete server reply: the 3-digit status code of the final line and
/// every raw reply line, joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

impl Reply {
    /// Re-serializes the reply exactly as it appeared on the wire.
    pub fn to_wire(&self) -> String {
        let mut wire = self.message.replace('\n', "\r\n");
        wire.push_str("\r\n");
        wire
    }
}

/// A line of the form `NNN text` ends a reply; `NNN-text` continues it.
fn is_terminal_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 4
        && bytes[..3].iter().all(u8::is_ascii_digit)
        && bytes[3] == b' '
}

/// Reads one (possibly multiline) reply from the control connection.
///
/// Collects lines until the RFC 959 terminal form `NNN text`. A line
/// beginning with `500` also stops the read, so a malformed server cannot
/// deadlock us waiting for a well-formed final line.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply, LineError>
where
    R: AsyncRead + Unpin,
{
    let mut lines: Vec<String> = Vec::new();
    loop {
        let line = read_line(reader).await?.ok_or_else(|| {
            LineError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "control connection closed mid-reply",
            ))
        })?;
        let done = is_terminal_line(&line) || line.starts_with("500");
        lines.push(line);
        if done {
            break;
        }
    }
    let last = lines.last().expect("at least one reply line");
    let code = last
        .get(..3)
        .and_then(|digits| digits.parse::<u16>().ok())
        .unwrap_or(500);
    Ok(Reply {
        code,
        message: lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn parse(wire: &str) -> Reply {
        let mut input = Cursor::new(wire.as_bytes().to_vec());
        read_reply(&mut input).await.unwrap()
    }

    #[tokio::test]
    async fn single_line_reply() {
        let reply = parse("220 Service ready.\r\n").await;
        assert_eq!(reply.code, 220);
        assert_eq!(reply.message, "220 Service ready.");
    }

    #[tokio::test]
    async fn multiline_reply_collects_all_lines() {
        let reply = parse("214-The following commands are recognized:\r\nUSER PASS QUIT\r\n214 End\r\n").await;
        assert_eq!(reply.code, 214);
        assert_eq!(
            reply.message,
            "214-The following commands are recognized:\nUSER PASS QUIT\n214 End"
        );
    }

    #[tokio::test]
    async fn leading_500_terminates_early() {
        // No `NNN ` line at all: the 500 escape stops the read.
        let reply = parse("500\r\nnever read\r\n").await;
        assert_eq!(reply.code, 500);
        assert_eq!(reply.message, "500");
    }

    #[tokio::test]
    async fn dash_continuation_is_not_terminal() {
        let reply = parse("227-almost\r\n227 Entering Passive Mode 127,0,0,1,4,1\r\n").await;
        assert_eq!(reply.code, 227);
    }

    #[tokio::test]
    async fn truncated_reply_is_an_error() {
        let mut input = Cursor::new(b"220-hello\r\n".to_vec());
        assert!(read_reply(&mut input).await.is_err());
    }

    #[tokio::test]
    async fn wire_round_trip() {
        for wire in [
            "220 Service ready.\r\n",
            "227 Entering Passive Mode 127,0,0,1,4,1\r\n",
            "214-Commands:\r\nUSER PASS\r\n214 End\r\n",
        ] {
            let reply = parse(wire).await;
            assert_eq!(reply.to_wire(), wire);
            let again = parse(&reply.to_wire()).await;
            assert_eq!(again, reply);
        }
    }
}
