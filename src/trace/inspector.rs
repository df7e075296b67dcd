//! Devtools-style inspector that exports transitions as text lines.
//!
//! Records are serialized on the dispatching thread and handed to a bounded
//! channel. A dedicated writer thread formats them and writes to stderr,
//! a file, or both. When the channel is full the record is dropped, so a
//! slow destination never stalls a dispatch.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{DevtoolsConfig, TraceFormat};
use crate::mvi::StoreState;
use crate::store::Action;

use super::{TraceError, TraceSink, Transition};

const TRACE_CHANNEL_SIZE: usize = 512;

/// Owned record crossing the channel to the writer thread.
#[derive(Debug, Clone)]
enum InspectorEvent {
    Init {
        timestamp: SystemTime,
        store: String,
        state: Value,
    },
    Action {
        timestamp: SystemTime,
        store: String,
        sequence: u64,
        action: Action,
        previous: Value,
        next: Value,
    },
    Untraced {
        timestamp: SystemTime,
        store: String,
        sequence: u64,
    },
}

pub struct InspectorSink {
    config: Arc<RwLock<DevtoolsConfig>>,
    sender: Option<SyncSender<InspectorEvent>>,
    writer: Option<JoinHandle<()>>,
    dropped: AtomicU64,
}

impl InspectorSink {
    pub fn new(config: DevtoolsConfig) -> Self {
        let config = Arc::new(RwLock::new(config));
        let (sender, receiver) = sync_channel(TRACE_CHANNEL_SIZE);
        let config_clone = config.clone();
        let writer = match std::thread::Builder::new()
            .name("flowstore-inspector".to_string())
            .spawn(move || writer_loop(receiver, config_clone))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start inspector writer thread");
                None
            }
        };

        Self {
            config,
            sender: Some(sender),
            writer,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> DevtoolsConfig {
        self.config.read().clone()
    }

    /// Applies to records written after the call, including queued ones.
    pub fn set_config(&self, config: DevtoolsConfig) {
        *self.config.write() = config;
    }

    /// Number of records dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, event: InspectorEvent) -> Result<(), TraceError> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(TraceError::Rejected("inspector is shut down".to_string()));
        };
        match sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(TraceError::Rejected(
                "inspector writer thread is not running".to_string(),
            )),
        }
    }
}

impl<S> TraceSink<S> for InspectorSink
where
    S: StoreState + Serialize,
{
    fn init(&self, store: &str, state: &S) -> Result<(), TraceError> {
        self.send(InspectorEvent::Init {
            timestamp: SystemTime::now(),
            store: store.to_string(),
            state: serde_json::to_value(state)?,
        })
    }

    fn transition(&self, record: &Transition<'_, S>) -> Result<(), TraceError> {
        self.send(InspectorEvent::Action {
            timestamp: SystemTime::now(),
            store: record.store.to_string(),
            sequence: record.sequence,
            action: record.action.clone(),
            previous: serde_json::to_value(record.previous)?,
            next: serde_json::to_value(record.next)?,
        })
    }

    fn untraced(&self, store: &str, sequence: u64) -> Result<(), TraceError> {
        self.send(InspectorEvent::Untraced {
            timestamp: SystemTime::now(),
            store: store.to_string(),
            sequence,
        })
    }
}

impl Drop for InspectorSink {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain what is queued and exit.
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

impl std::fmt::Debug for InspectorSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorSink")
            .field("config", &*self.config.read())
            .field("dropped", &self.dropped())
            .finish()
    }
}

fn writer_loop(receiver: Receiver<InspectorEvent>, config: Arc<RwLock<DevtoolsConfig>>) {
    let mut stderr = io::stderr();
    let mut file_writer: Option<(PathBuf, File)> = None;

    while let Ok(event) = receiver.recv() {
        let config_snapshot = config.read().clone();
        if !config_snapshot.enabled {
            continue;
        }

        let use_color = stderr.is_terminal() && config_snapshot.format == TraceFormat::Console;

        let (line_console, line_file) = match config_snapshot.format {
            TraceFormat::Console => (
                format_console(&event, use_color),
                format_console(&event, false),
            ),
            TraceFormat::Json => {
                let line = format_json(&event);
                (line.clone(), line)
            }
        };

        if config_snapshot.destination.writes_stderr() {
            let _ = writeln!(stderr, "{}", line_console);
        }

        if config_snapshot.destination.writes_file() {
            file_writer = ensure_file_writer(file_writer, &config_snapshot.file_path);
            if let Some((_, file)) = file_writer.as_mut() {
                let _ = writeln!(file, "{}", line_file);
            }
        }
    }

    if let Some((_, mut file)) = file_writer {
        let _ = file.flush();
    }
}

fn ensure_file_writer(current: Option<(PathBuf, File)>, path: &str) -> Option<(PathBuf, File)> {
    let path = expand_tilde(Path::new(path));
    if let Some((current_path, file)) = current {
        if current_path == path {
            return Some((current_path, file));
        }
    }

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open trace file");
            None
        }
    }
}

fn format_console(event: &InspectorEvent, use_color: bool) -> String {
    match event {
        InspectorEvent::Init {
            timestamp,
            store,
            state,
        } => format!("{} [{}] @init {}", format_timestamp(*timestamp), store, state),
        InspectorEvent::Action {
            timestamp,
            store,
            sequence,
            action,
            previous,
            next,
        } => {
            let name = if use_color {
                format!("\x1b[1;33m{}\x1b[0m", action.name())
            } else {
                action.name().to_string()
            };
            let mut line = format!(
                "{} [{}] #{} {} {} -> {}",
                format_timestamp(*timestamp),
                store,
                sequence,
                name,
                previous,
                next
            );
            if let Some(payload) = &action.payload {
                line.push_str(&format!(" payload={}", payload));
            }
            line
        }
        InspectorEvent::Untraced {
            timestamp,
            store,
            sequence,
        } => format!(
            "{} [{}] #{} (untraced)",
            format_timestamp(*timestamp),
            store,
            sequence
        ),
    }
}

fn format_json(event: &InspectorEvent) -> String {
    let value = match event {
        InspectorEvent::Init {
            timestamp,
            store,
            state,
        } => json!({
            "ts": format_timestamp(*timestamp),
            "store": store,
            "type": "init",
            "state": state,
        }),
        InspectorEvent::Action {
            timestamp,
            store,
            sequence,
            action,
            previous,
            next,
        } => json!({
            "ts": format_timestamp(*timestamp),
            "store": store,
            "type": "action",
            "seq": sequence,
            "action": action,
            "previous": previous,
            "next": next,
        }),
        InspectorEvent::Untraced {
            timestamp,
            store,
            sequence,
        } => json!({
            "ts": format_timestamp(*timestamp),
            "store": store,
            "type": "untraced",
            "seq": sequence,
        }),
    };
    value.to_string()
}

fn format_timestamp(timestamp: SystemTime) -> String {
    let duration = timestamp.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64, millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis)
    }

    fn increment_event() -> InspectorEvent {
        InspectorEvent::Action {
            timestamp: at(10, 5),
            store: "counter".to_string(),
            sequence: 1,
            action: Action::new("counter/increment"),
            previous: json!({ "count": 0 }),
            next: json!({ "count": 1 }),
        }
    }

    #[test]
    fn console_line_shows_transition() {
        let line = format_console(&increment_event(), false);
        assert_eq!(
            line,
            r#"10.005 [counter] #1 counter/increment {"count":0} -> {"count":1}"#
        );
    }

    #[test]
    fn console_line_appends_payload() {
        let event = InspectorEvent::Action {
            timestamp: at(1, 0),
            store: "s".to_string(),
            sequence: 2,
            action: Action::new("counter/add").with_payload(json!(5)),
            previous: json!(1),
            next: json!(6),
        };
        assert!(format_console(&event, false).ends_with("1 -> 6 payload=5"));
    }

    #[test]
    fn colored_console_wraps_action_name() {
        let line = format_console(&increment_event(), true);
        assert!(line.contains("\x1b[1;33mcounter/increment\x1b[0m"));
    }

    #[test]
    fn json_line_fields() {
        let value: Value = serde_json::from_str(&format_json(&increment_event())).unwrap();
        assert_eq!(value["type"], "action");
        assert_eq!(value["seq"], 1);
        assert_eq!(value["action"]["name"], "counter/increment");
        assert_eq!(value["previous"]["count"], 0);
        assert_eq!(value["next"]["count"], 1);
    }

    #[test]
    fn untraced_json_has_no_state() {
        let event = InspectorEvent::Untraced {
            timestamp: at(3, 0),
            store: "counter".to_string(),
            sequence: 7,
        };
        let value: Value = serde_json::from_str(&format_json(&event)).unwrap();
        assert_eq!(value["type"], "untraced");
        assert!(value.get("next").is_none());
        assert!(value.get("previous").is_none());
        assert_eq!(format_console(&event, false), "3.000 [counter] #7 (untraced)");
    }

    #[test]
    fn init_console_line() {
        let event = InspectorEvent::Init {
            timestamp: at(0, 250),
            store: "counter".to_string(),
            state: json!({ "count": 0 }),
        };
        assert_eq!(format_console(&event, false), r#"0.250 [counter] @init {"count":0}"#);
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde(Path::new("/tmp/trace.log")), PathBuf::from("/tmp/trace.log"));
    }
}
