pub mod driver;

pub use driver::{FtpClient, FtpError};
