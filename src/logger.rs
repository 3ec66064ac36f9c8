use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

const LEVEL_ENV: &str = "FIXTUREGEN_LOG";

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LEVEL: OnceLock<LogLevel> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn parse(value: &str) -> LogLevel {
        match value.to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    fn from_env() -> LogLevel {
        LogLevel::parse(&std::env::var(LEVEL_ENV).unwrap_or_default())
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Mirror log lines into `log_path` in addition to stdout.
pub fn init(log_path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let path = log_path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    let _ = LEVEL.set(LogLevel::from_env());
    debug(&format!("logging initialized: {}", path.display()));
    Ok(path.to_path_buf())
}

fn now_ts() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Trace => 0,
        LogLevel::Debug => 1,
        LogLevel::Info => 2,
        LogLevel::Warn => 3,
        LogLevel::Error => 4,
    }
}

fn enabled(level: LogLevel) -> bool {
    let min = *LEVEL.get_or_init(LogLevel::from_env);
    rank(level) >= rank(min)
}

fn format_line(level: LogLevel, msg: &str) -> String {
    format!("{} [{}] {}", now_ts(), level.label(), msg)
}

fn write_line(level: LogLevel, msg: &str) {
    if !enabled(level) {
        return;
    }
    let line = format_line(level, msg);
    println!("{line}");
    if let Some(m) = LOG_FILE.get() {
        if let Ok(mut f) = m.lock() {
            let _ = writeln!(f, "{line}");
            let _ = f.flush();
        }
    }
}

pub fn error(msg: &str) {
    write_line(LogLevel::Error, msg);
}
pub fn warn(msg: &str) {
    write_line(LogLevel::Warn, msg);
}
pub fn info(msg: &str) {
    write_line(LogLevel::Info, msg);
}
pub fn debug(msg: &str) {
    write_line(LogLevel::Debug, msg);
}
pub fn trace(msg: &str) {
    write_line(LogLevel::Trace, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_info() {
        assert_eq!(LogLevel::parse("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse(""), LogLevel::Info);
        assert_eq!(LogLevel::parse("loud"), LogLevel::Info);
    }

    #[test]
    fn errors_outrank_debug() {
        assert!(rank(LogLevel::Error) > rank(LogLevel::Debug));
        assert!(rank(LogLevel::Trace) < rank(LogLevel::Info));
    }

    #[test]
    fn line_carries_level_label() {
        let line = format_line(LogLevel::Warn, "tmp file kept");
        assert!(line.ends_with("[WARN] tmp file kept"));
    }
}
