//! Rolling Logger
//!
//! `log` backend that keeps the most recent records in a circular buffer
//! and forwards each record to a sink (console, stderr, ...).

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// One captured log line
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// `HH:MM:SS.mmm LEVEL [app] target: message`
    pub fn format(&self, app_name: &str) -> String {
        format!(
            "{} {:<5} [{}] {}: {}",
            self.at.format("%H:%M:%S%.3f"),
            self.level,
            app_name,
            self.target,
            self.message
        )
    }
}

pub type Sink = Box<dyn Fn(&LogEntry, &str) + Send + Sync>;

pub struct RollingLogger {
    app_name: String,
    capacity: usize,
    level: LevelFilter,
    entries: Mutex<VecDeque<LogEntry>>,
    sink: Option<Sink>,
}

impl RollingLogger {
    pub fn new(app_name: &str, capacity: usize, level: LevelFilter, sink: Option<Sink>) -> Self {
        Self {
            app_name: app_name.to_string(),
            capacity: capacity.max(1),
            level,
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            sink,
        }
    }

    fn push(&self, entry: LogEntry) {
        if let Some(sink) = &self.sink {
            sink(&entry, &self.app_name);
        }
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of buffered entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Log for RollingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.push(LogEntry {
            at: Utc::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<RollingLogger> = OnceLock::new();

/// Install the global logger. Fails if a logger is already set.
pub fn init_logger(
    app_name: &str,
    capacity: usize,
    level: LevelFilter,
    sink: Option<Sink>,
) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| RollingLogger::new(app_name, capacity, level, sink));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Recent entries of the global logger (empty before `init_logger`)
pub fn recent() -> Vec<LogEntry> {
    LOGGER.get().map(|l| l.entries()).unwrap_or_default()
}

/// Drop the global logger's buffered entries
pub fn clear_recent() {
    if let Some(logger) = LOGGER.get() {
        logger.clear();
    }
}
