use std::path::PathBuf;

use facewatch_core::recognition::domain::identity::Identity;
use facewatch_core::recognition::domain::reference_source::ReferenceSource;

/// Reference identities from a JSON file.
///
/// The file is re-read on every load, so edits land on the pipeline's
/// next reload tick without a restart. Expected shape:
/// `[{"person_key": 1, "display_code": "EMP001", "embedding": [..]}, ..]`
pub struct JsonReferenceSource {
    path: PathBuf,
}

impl JsonReferenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReferenceSource for JsonReferenceSource {
    fn load(&mut self) -> Result<Vec<Identity>, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("cannot read {}: {e}", self.path.display()))?;
        let identities: Vec<Identity> = serde_json::from_str(&contents)?;
        Ok(identities)
    }
}
