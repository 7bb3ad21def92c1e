//! Door event log - append-only record of toggles and position changes
//!
//! Lines are written as:
//! `[2024-10-27 10:00:00] - ACTION: State Change - STATE: Open`

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const ACTION_STARTUP: &str = "System Startup";
pub const ACTION_STATE_CHANGE: &str = "State Change";
pub const ACTION_USER_TOGGLE: &str = "User Toggle";

/// Destination for door events. Implementations keep call order.
pub trait EventSink: Send + Sync {
    fn record(&self, action: &str, state: &str);
}

/// A recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorEvent {
    pub action: String,
    pub state: String,
}

impl DoorEvent {
    pub fn new(action: &str, state: &str) -> Self {
        Self { action: action.to_string(), state: state.to_string() }
    }
}

/// Event log file
pub struct FileEventSink {
    file_path: PathBuf,
    /// Serializes appends so concurrent recorders cannot interleave
    write_lock: Mutex<()>,
}

impl FileEventSink {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        info!(file_path = %file_path.display(), "event_log_initialized");
        Self { file_path, write_lock: Mutex::new(()) }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn format_line(action: &str, state: &str) -> String {
        format!(
            "[{}] - ACTION: {} - STATE: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            action,
            state
        )
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path.display(), bytes = %line.len(), "event_log_written");
        Ok(())
    }

    /// Last `limit` lines, newest first. A missing file reads as empty.
    pub fn recent(&self, limit: usize) -> std::io::Result<Vec<String>> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content.lines().rev().take(limit).map(str::to_string).collect())
    }
}

impl EventSink for FileEventSink {
    fn record(&self, action: &str, state: &str) {
        let line = Self::format_line(action, state);
        info!(action = %action, state = %state, "door_event");
        if let Err(e) = self.append_line(&line) {
            error!(file = %self.file_path.display(), error = %e, "event_log_write_failed");
        }
    }
}

/// Event sink that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<DoorEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DoorEvent> {
        self.events.lock().clone()
    }

    /// Events with the given action, in emission order
    pub fn with_action(&self, action: &str) -> Vec<DoorEvent> {
        self.events.lock().iter().filter(|e| e.action == action).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, action: &str, state: &str) {
        self.events.lock().push(DoorEvent::new(action, state));
    }
}
