use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::events::domain::event_sink::EventSink;
use crate::events::recognition_event::RecognitionEvent;

/// Appends events as JSON lines to a local file.
///
/// Downstream tooling tails the file; every line is one self-contained
/// event record.
pub struct JsonlEventSink {
    file: File,
}

impl JsonlEventSink {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl EventSink for JsonlEventSink {
    fn record(&mut self, event: &RecognitionEvent) -> Result<(), Box<dyn std::error::Error>> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}
