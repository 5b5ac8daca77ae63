//! Console + file log sink behind the `log` facade.
//!
//! Every record becomes one `MM/DD/YYYY HH:MM:SS.micros LEVEL message`
//! line, appended to stdout and the log file under a single mutex so
//! concurrent sessions never interleave partial lines.

use chrono::Local;
use log::{LevelFilter, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

struct FtpLogger {
    file: Mutex<File>,
}

impl log::Log for FtpLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%m/%d/%Y %H:%M:%S%.6f");
        let line = format!("{} {} {}", timestamp, record.level(), record.args());
        let mut file = self.file.lock().expect("log sink poisoned");
        println!("{}", line);
        let _ = writeln!(file, "{}", line);
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Installs the global logger writing to `log_path` (append mode). When
/// `max_log_files` is set, the existing file is rotated away first.
pub fn init(log_path: &Path, max_log_files: Option<usize>) -> anyhow::Result<()> {
    if let Some(max) = max_log_files {
        rotate_logs(log_path, max)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    log::set_boxed_logger(Box::new(FtpLogger {
        file: Mutex::new(file),
    }))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

/// N-deep rotation: an existing `<name>` becomes `<name>.NNN` (zero padded,
/// one past the highest existing number). Once the window is full the
/// oldest (`.000`) is removed, every survivor shifts down one slot, and
/// the live file takes the top slot.
pub fn rotate_logs(log_path: &Path, max_log_files: usize) -> std::io::Result<()> {
    if !log_path.is_file() {
        return Ok(());
    }
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let prefix = format!("{}.", name);
    let mut highest: Option<usize> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(suffix) = file_name.strip_prefix(&prefix) {
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                let number: usize = suffix.parse().unwrap_or(0);
                highest = Some(highest.map_or(number, |h| h.max(number)));
            }
        }
    }

    let next = highest.map_or(0, |h| h + 1);
    if next < max_log_files {
        std::fs::rename(log_path, dir.join(format!("{}.{:03}", name, next)))?;
    } else {
        let oldest = dir.join(format!("{}.000", name));
        if oldest.is_file() {
            std::fs::remove_file(&oldest)?;
        }
        for number in 1..next {
            let old = dir.join(format!("{}.{:03}", name, number));
            if !old.is_file() {
                continue;
            }
            std::fs::rename(&old, dir.join(format!("{}.{:03}", name, number - 1)))?;
        }
        std::fs::rename(log_path, dir.join(format!("{}.{:03}", name, next - 1)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn first_rotation_creates_000() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("server.log");
        touch(&log, "old");
        rotate_logs(&log, 3).unwrap();
        assert!(!log.exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("server.log.000")).unwrap(),
            "old"
        );
    }

    #[test]
    fn missing_log_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        rotate_logs(&dir.path().join("server.log"), 3).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rotation_fills_the_window_then_shifts() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("server.log");

        touch(&log, "gen0");
        rotate_logs(&log, 2).unwrap(); // -> .000
        touch(&log, "gen1");
        rotate_logs(&log, 2).unwrap(); // -> .001, window full
        touch(&log, "gen2");
        rotate_logs(&log, 2).unwrap(); // drop .000, shift, live -> .001

        assert!(!log.exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("server.log.000")).unwrap(),
            "gen1"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("server.log.001")).unwrap(),
            "gen2"
        );
        assert!(!dir.path().join("server.log.002").exists());
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("server.log");
        touch(&log, "live");
        touch(&dir.path().join("server.log.notanumber"), "x");
        touch(&dir.path().join("other.log.003"), "x");
        rotate_logs(&log, 3).unwrap();
        assert!(dir.path().join("server.log.000").exists());
    }
}
