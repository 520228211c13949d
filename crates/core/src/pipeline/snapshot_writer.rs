use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;

/// Persists per-event snapshot images under a notifications directory.
///
/// File names are `{camera}_{timestamp}.jpg`, with an `_NA` suffix for
/// unknown subjects; the returned name is the event's `image_reference`.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(
        &self,
        frame: &Frame,
        camera_id: u32,
        timestamp_ms: u64,
        known: bool,
    ) -> Result<String, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;

        let suffix = if known { "" } else { "_NA" };
        let name = format!("{camera_id}_{timestamp_ms}{suffix}.jpg");

        let img =
            image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                .ok_or("frame buffer does not match its dimensions")?;
        img.save(self.dir.join(&name))?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![80u8; 32 * 32 * 3], 32, 32, 0)
    }

    #[test]
    fn test_write_creates_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        let name = writer.write(&frame(), 3, 1_700_000_000_000, true).unwrap();
        assert_eq!(name, "3_1700000000000.jpg");
        assert!(dir.path().join(&name).exists());
    }

    #[test]
    fn test_unknown_snapshot_gets_na_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        let name = writer.write(&frame(), 3, 42, false).unwrap();
        assert_eq!(name, "3_42_NA.jpg");
    }

    #[test]
    fn test_write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("notifications"));

        let name = writer.write(&frame(), 1, 1, true).unwrap();
        assert!(dir.path().join("notifications").join(name).exists());
    }
}
