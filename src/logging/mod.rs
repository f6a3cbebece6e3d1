//! Structured JSON logging for layout passes.
//!
//! Events are plain serde structures; sinks decide where the JSON lines go.
//! Logging never fails a layout pass: callers drop `LoggingResult` errors.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub type LogFields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub ts_ms: u128,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "LogFields::is_empty", default)]
    pub fields: LogFields,
}

impl LogEvent {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ts_ms: current_ms(),
            level,
            target: target.into(),
            message: message.into(),
            fields: LogFields::new(),
        }
    }

    pub fn with_fields(
        level: LogLevel,
        target: impl Into<String>,
        message: impl Into<String>,
        fields: LogFields,
    ) -> Self {
        Self {
            fields,
            ..Self::new(level, target, message)
        }
    }
}

fn current_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub type LoggingResult<T> = std::result::Result<T, LoggingError>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait LogSink: Send + Sync {
    fn log(&self, event: &LogEvent) -> LoggingResult<()>;
}

/// Cloneable logger handle. Events below `min_level` are discarded before
/// they reach the sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new<S>(sink: S) -> Self
    where
        S: LogSink + 'static,
    {
        Self::from_shared(Arc::new(sink))
    }

    /// Wrap a sink the caller keeps a handle to, e.g. a [`MemorySink`].
    pub fn from_shared(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_level: LogLevel::Trace,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, target: &str, message: &str) -> LoggingResult<()> {
        self.log_event(LogEvent::new(level, target, message))
    }

    pub fn log_with_fields(
        &self,
        level: LogLevel,
        target: &str,
        message: &str,
        fields: LogFields,
    ) -> LoggingResult<()> {
        self.log_event(LogEvent::with_fields(level, target, message, fields))
    }

    pub fn log_event(&self, event: LogEvent) -> LoggingResult<()> {
        if !self.enabled(event.level) {
            return Ok(());
        }
        self.sink.log(&event)
    }
}

/// JSON-lines file sink. The file is truncated once it would grow past
/// `max_bytes`; zero disables the limit.
pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, max_bytes: u64) -> LoggingResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            max_bytes,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_line(&self, mut line: String) -> LoggingResult<()> {
        line.push('\n');
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        if self.should_rotate(guard.get_ref(), line.len() as u64)? {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            *guard = BufWriter::new(file);
        }

        guard.write_all(line.as_bytes())?;
        guard.flush()?;
        Ok(())
    }

    fn should_rotate(&self, file: &File, incoming_len: u64) -> std::io::Result<bool> {
        if self.max_bytes == 0 {
            return Ok(false);
        }
        let current = file.metadata()?.len();
        Ok(current + incoming_len > self.max_bytes)
    }
}

impl LogSink for FileSink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        let line = serde_json::to_string(event)?;
        self.write_line(line)
    }
}

/// In-memory sink keeping every event.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of the recorded events, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.message).collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        // Same serialization contract as the file sink.
        serde_json::to_string(event)?;
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

pub fn event_with_fields(
    level: LogLevel,
    target: &str,
    message: &str,
    fields: impl IntoIterator<Item = (String, Value)>,
) -> LogEvent {
    let map: LogFields = fields.into_iter().collect();
    LogEvent::with_fields(level, target, message, map)
}

pub fn json_kv(key: &str, value: impl Into<Value>) -> (String, Value) {
    (key.to_string(), value.into())
}

pub fn json_str(key: &str, value: impl Into<String>) -> (String, Value) {
    (key.to_string(), json!(value.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_level_filters_events() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::from_shared(sink.clone()).with_min_level(LogLevel::Info);

        logger
            .log(LogLevel::Debug, "slotbox::test", "hidden")
            .unwrap();
        logger
            .log(LogLevel::Warn, "slotbox::test", "shown")
            .unwrap();
        assert_eq!(sink.messages(), vec!["shown".to_string()]);
    }

    #[test]
    fn events_serialize_with_fields() {
        let event = event_with_fields(
            LogLevel::Info,
            "slotbox::test",
            "pass",
            [json_kv("width", 120), json_str("axis", "horizontal")],
        );
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"level\":\"info\""));
        assert!(line.contains("\"width\":120"));
        assert!(line.contains("\"axis\":\"horizontal\""));

        let bare = serde_json::to_string(&LogEvent::new(LogLevel::Trace, "t", "m")).unwrap();
        assert!(!bare.contains("fields"));
    }

    #[test]
    fn file_sink_truncates_past_limit() {
        let dir = std::env::temp_dir().join(format!("slotbox-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("layout.log");
        let _ = std::fs::remove_file(&path);

        let sink = FileSink::new(&path, 200).unwrap();
        let event = LogEvent::new(LogLevel::Info, "slotbox::test", "x".repeat(60));
        for _ in 0..5 {
            sink.log(&event).unwrap();
        }
        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len <= 200);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
