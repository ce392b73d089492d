//! Session logger — a `log` backend that writes to one file per session.
//!
//! The file is **truncated at each launch**, so it only ever holds output from
//! the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\PaintLite\paintlite.log`
//!   Linux:    `~/.local/share/PaintLite/paintlite.log`
//!   macOS:    `~/Library/Application Support/PaintLite/paintlite.log`
//!
//! Use the regular `log::info!` / `log::warn!` / `log::error!` macros.
//! Warnings and errors are mirrored to stderr.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct SessionLogger {
    file: Option<Mutex<File>>,
    level: LevelFilter,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), &record.args().to_string());
        if record.level() <= Level::Warn {
            eprintln!("{line}");
        }
        // I/O errors are ignored so that logging never takes the app down.
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}

fn format_line(level: Level, msg: &str) -> String {
    format!("[{}] [{}] {}", timestamp(), level, msg)
}

/// Install the session logger, writing to the default log location.
/// Returns the log file path, if one could be opened.
pub fn init(level: LevelFilter) -> Option<PathBuf> {
    init_at(&log_file_path(), level)
}

/// Install the session logger writing to `path`.
///
/// * Creates (or truncates) the log file. Failure to do so is not fatal;
///   records then only reach stderr.
/// * Installs a panic hook that records the panic before the default handler runs.
pub fn init_at(path: &Path, level: LevelFilter) -> Option<PathBuf> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            None
        }
    };
    let opened = file.is_some();

    if let Some(mut f) = file.as_ref() {
        let _ = writeln!(f, "=== PaintLite session started {} ===", human_timestamp());
        let _ = writeln!(f, "Log file: {}", path.display());
    }

    let logger = SessionLogger { file: file.map(Mutex::new), level };
    if log::set_boxed_logger(Box::new(logger)).is_err() {
        // Already installed (e.g. a second init in tests); keep the first one.
        return opened.then(|| path.to_path_buf());
    }
    log::set_max_level(level);

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC: {}", info);
        log::logger().flush();
        prev(info);
    }));

    opened.then(|| path.to_path_buf())
}

fn log_file_path() -> PathBuf {
    data_dir().join("PaintLite").join("paintlite.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// HH:MM:SS (UTC) within the current day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            format!("{:02}:{:02}:{:02}", (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}
