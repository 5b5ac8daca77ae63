pub mod logger;

pub use logger::{init, rotate_logs};
