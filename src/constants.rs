use std::time::Duration;

/// Default FTP control port.
pub const DEFAULT_PORT: u16 = 21;

/// Server configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "ftpserverd.conf";

/// Name of the shared root directory, created next to the server binary.
pub const ROOT_FOLDER: &str = "Public";

/// Hard cap on a single control-connection line, CRLF included.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Wrong passwords tolerated for one username before 421 + disconnect.
pub const MAX_BAD_PASSWORDS: u32 = 3;

/// Server-side data-channel connect/accept deadline.
pub const DATA_TIMEOUT: Duration = Duration::from_secs(15);

/// Client-side deadline when connecting out to a passive endpoint.
pub const CLIENT_DATA_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-side control-connection connect deadline.
pub const CLIENT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
