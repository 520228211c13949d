use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read camera registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed camera registry: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no camera with id {0}")]
    UnknownCamera(u32),
}

/// What kind of source URI a camera entry carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Local capture device (e.g. `/dev/video0`).
    Device,
    /// Network stream (RTSP and friends) or a file path.
    Stream,
}

/// One monitored location's camera record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraConfig {
    pub id: u32,
    pub source_uri: String,
    pub kind: SourceKind,
    pub location: String,
}

/// Camera lookup backed by a JSON file.
///
/// An unresolvable camera id is fatal at startup; every other failure
/// class in the pipeline is survivable.
#[derive(Debug, Deserialize)]
pub struct CameraRegistry {
    cameras: Vec<CameraConfig>,
}

impl CameraRegistry {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn resolve(&self, camera_id: u32) -> Result<&CameraConfig, ConfigError> {
        self.cameras
            .iter()
            .find(|c| c.id == camera_id)
            .ok_or(ConfigError::UnknownCamera(camera_id))
    }
}
