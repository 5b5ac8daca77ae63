use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_ftpcommand::utils::{resolve_virtual, virtual_to_real};
use crate::helpers::send_response;
use crate::session::Session;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const NO_DATA_CHANNEL: &str = "426 Data connection not specified. A PORT/EPRT or PASV/EPSV \
     command must be issued before executing this operation.";

/// Handles LIST: sends the formatted listing of the resolved directory
/// over the negotiated data channel.
pub async fn handle_list_command<W>(
    writer: &mut W,
    session: &mut Session,
    arg: &str,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    if session.data_channel.is_none() {
        send_response(writer, NO_DATA_CHANNEL).await?;
        return Ok(CommandOutcome::Continue);
    }

    let arg = arg.trim();
    let label = if arg.is_empty() {
        session.cur_dir.as_str()
    } else {
        arg
    };
    let refused = format!("550 {}: No such file or directory.", label);
    let virtual_path = if arg.is_empty() {
        Some(session.cur_dir.clone())
    } else {
        resolve_virtual(&session.cur_dir, arg)
    };
    let listing = match virtual_path {
        Some(virtual_path) => {
            let real_path = virtual_to_real(&session.root, &virtual_path);
            if real_path.starts_with(&session.root) {
                format_listing(&real_path)
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "outside root"))
            }
        }
        None => Err(io::Error::new(io::ErrorKind::NotFound, "outside root")),
    };
    let listing = match listing {
        Ok(listing) => listing,
        Err(_) => {
            session.data_channel.reset();
            send_response(writer, &refused).await?;
            return Ok(CommandOutcome::Continue);
        }
    };

    send_response(writer, "150 Opening ASCII mode data connection.").await?;

    let channel = session.data_channel.take();
    let mode = channel.mode_name();
    let sent = match channel.open().await {
        Ok(mut stream) => {
            // The terminating empty line: an empty directory sends bare CRLF.
            let mut payload = listing.into_bytes();
            payload.extend_from_slice(b"\r\n");
            async {
                stream.write_all(&payload).await?;
                // Full close of the data socket is the end-of-data signal.
                stream.shutdown().await
            }
            .await
            .map(|()| payload.len())
        }
        Err(e) => Err(e),
    };

    match sent {
        Ok(bytes) => {
            info!(
                "Sent {} listing bytes via data connection to {}",
                bytes,
                session.peer_name()
            );
            send_response(writer, "226 Transfer complete.").await?;
        }
        Err(e) => {
            error!(
                "{} mode for {} failed with error: {}",
                mode,
                session.peer_name(),
                e
            );
            send_response(writer, &format!("421 {} mode failed", mode)).await?;
        }
    }
    Ok(CommandOutcome::Continue)
}

/// Formats one directory as CRLF-terminated listing lines, sorted by name.
pub fn format_listing(dir: &Path) -> io::Result<String> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    let mut listing = String::new();
    for entry in entries {
        let metadata = entry.metadata()?;
        listing.push_str(&format_entry(
            &metadata,
            &entry.file_name().to_string_lossy(),
        ));
        listing.push_str("\r\n");
    }
    Ok(listing)
}

/// `drwxr-xr-x   1 user       group            4096 Aug 02 2026 name`;
/// owner and group are best-effort placeholders, mtime is UTC.
fn format_entry(metadata: &Metadata, name: &str) -> String {
    let mtime = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let date = DateTime::<Utc>::from(mtime).format("%b %d %Y");
    format!(
        "{}   1 {:<10} {:<10} {:>10} {} {}",
        permissions_string(metadata),
        "user",
        "group",
        metadata.len(),
        date,
        name
    )
}

/// Mode bits as `<type><rwx><rwx><rwx>`; directories render their execute
/// bits as `-`.
fn permissions_string(metadata: &Metadata) -> String {
    let is_dir = metadata.is_dir();
    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode()
    };
    #[cfg(not(unix))]
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };

    let mut rendered = String::with_capacity(10);
    rendered.push(if is_dir { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        rendered.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        rendered.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        rendered.push(if !is_dir && bits & 0o1 != 0 { 'x' } else { '-' });
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_formats_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(format_listing(dir.path()).unwrap(), "");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(format_listing(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn entries_are_sorted_and_crlf_terminated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"22").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"1").unwrap();
        let listing = format_listing(dir.path()).unwrap();
        let lines: Vec<&str> = listing.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a.txt"));
        assert!(lines[1].ends_with(" b.txt"));
        assert!(listing.ends_with("\r\n"));
    }

    #[cfg(unix)]
    #[test]
    fn directory_entry_renders_type_and_no_execute() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o755)).unwrap();
        let metadata = std::fs::metadata(&sub).unwrap();
        // Execute bits are masked out for directories.
        assert_eq!(permissions_string(&metadata), "drw-r--r--");
    }

    #[cfg(unix)]
    #[test]
    fn file_entry_renders_mode_bits() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, b"#!").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o754)).unwrap();
        let metadata = std::fs::metadata(&file).unwrap();
        assert_eq!(permissions_string(&metadata), "-rwxr-xr--");
    }

    #[test]
    fn entry_columns_line_up() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, vec![0u8; 1234]).unwrap();
        let metadata = std::fs::metadata(&file).unwrap();
        let line = format_entry(&metadata, "data.bin");
        assert!(line.contains("   1 user       group      "));
        assert!(line.contains("      1234 "));
        assert!(line.ends_with(" data.bin"));
    }
}
