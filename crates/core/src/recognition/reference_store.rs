use std::sync::{Arc, Mutex, RwLock};

use crate::recognition::domain::identity::Identity;
use crate::recognition::domain::reference_source::ReferenceSource;

/// An immutable, versioned view of the reference set.
///
/// Published wholesale; a reader holding an `Arc` to one snapshot is
/// never affected by a concurrent reload.
#[derive(Debug)]
pub struct ReferenceSnapshot {
    pub version: u64,
    pub identities: Vec<Identity>,
}

/// Owns the published snapshot and the source it is refreshed from.
///
/// `current()` is cheap (one read lock + Arc clone); `reload()` swaps the
/// published pointer atomically, so resolvers see either the fully-old or
/// the fully-new set, never a mixture.
pub struct ReferenceStore {
    source: Mutex<Box<dyn ReferenceSource>>,
    current: RwLock<Arc<ReferenceSnapshot>>,
}

impl ReferenceStore {
    /// Performs the initial load. Failure here is fatal to the pipeline:
    /// there is no previous snapshot to fall back on.
    pub fn open(mut source: Box<dyn ReferenceSource>) -> Result<Self, Box<dyn std::error::Error>> {
        let identities = source.load()?;
        log::info!("Loaded reference set: {} identities", identities.len());
        Ok(Self {
            source: Mutex::new(source),
            current: RwLock::new(Arc::new(ReferenceSnapshot {
                version: 1,
                identities,
            })),
        })
    }

    pub fn current(&self) -> Arc<ReferenceSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Reloads from the source and publishes the result.
    ///
    /// On failure the previous snapshot stays active and the error is
    /// returned for logging; the caller retries on its next period.
    pub fn reload(&self) -> Result<Arc<ReferenceSnapshot>, Box<dyn std::error::Error>> {
        let identities = {
            let mut source = self
                .source
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            source.load()?
        };

        let mut slot = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let snapshot = Arc::new(ReferenceSnapshot {
            version: slot.version + 1,
            identities,
        });
        *slot = snapshot.clone();
        Ok(snapshot)
    }
}
