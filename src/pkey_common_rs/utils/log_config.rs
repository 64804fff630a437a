use crate::pkey_common_rs::key::core::exceptions::{PKeyError, PKeyResult};
use chrono::{DateTime, Local};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => LogLevel::Trace,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Error => LogLevel::Error,
        }
    }
}

/// `[時刻] [LEVEL] [module] message` 形式の1行を組み立てる
pub fn format_line(
    timestamp: Option<DateTime<Local>>,
    level: LogLevel,
    module: &str,
    message: &str,
) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(ts) = timestamp {
        parts.push(format!("[{}]", ts.format("%Y-%m-%d %H:%M:%S%.3f")));
    }
    parts.push(format!("[{}]", level.as_str()));
    parts.push(format!("[{}]", module));
    parts.push(message.to_string());
    parts.join(" ")
}

/// env_logger を統一フォーマットで初期化する
///
/// Args:
///     level: "trace" / "debug" / "info" / "warn" / "error"
///     timestamps: 行頭に時刻を付けるか
///
/// `RUST_LOG` が設定されていればそちらのフィルタを優先する。
pub fn init_logging(level: &str, timestamps: bool) -> PKeyResult<()> {
    let level = LogLevel::from_str(level).map_err(PKeyError::Config)?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_filter());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(move |buf, record| {
        let ts = if timestamps { Some(Local::now()) } else { None };
        let line = format_line(
            ts,
            record.level().into(),
            record.module_path().unwrap_or("pkey"),
            &record.args().to_string(),
        );
        writeln!(buf, "{}", line)
    });

    builder
        .try_init()
        .map_err(|e| PKeyError::Config(format!("Failed to initialize logger: {}", e)))
}
