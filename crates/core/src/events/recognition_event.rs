use serde::Serialize;

use crate::recognition::domain::identity::IdentityKey;

/// One de-duplicated sighting, ready for the external sink.
///
/// Immutable once created. `image_reference` names the snapshot image
/// persisted alongside the event; `timestamp_ms` is unix milliseconds.
#[derive(Clone, Debug, Serialize)]
pub struct RecognitionEvent {
    pub identity_key: IdentityKey,
    pub display_code: String,
    pub location: String,
    pub timestamp_ms: u64,
    pub image_reference: String,
    pub match_score: f64,
}
