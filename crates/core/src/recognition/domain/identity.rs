use serde::{Deserialize, Serialize};

/// One known subject in the reference set.
///
/// Immutable once loaded into a snapshot; the embedding is L2-normalized
/// by whatever produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub person_key: u64,
    pub display_code: String,
    pub embedding: Vec<f32>,
}

/// Identity state carried by a track across frames.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackIdentity {
    /// Matched against the reference set at or above the threshold.
    Confirmed {
        person_key: u64,
        display_code: String,
        score: f64,
    },
    /// Sighted but unmatched; `ephemeral` is unique per pipeline instance.
    Unknown { ephemeral: u64 },
    /// Placeholder during track construction only.
    Pending,
}

impl TrackIdentity {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TrackIdentity::Confirmed { .. })
    }

    /// The cooldown key this identity emits events under, if any.
    pub fn key(&self) -> Option<IdentityKey> {
        match self {
            TrackIdentity::Confirmed { person_key, .. } => Some(IdentityKey::Person(*person_key)),
            TrackIdentity::Unknown { ephemeral } => Some(IdentityKey::Ephemeral(*ephemeral)),
            TrackIdentity::Pending => None,
        }
    }
}

/// Key the event gate rate-limits on.
///
/// Unknown sightings cool down per ephemeral id, so distinct strangers
/// never suppress each other.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    Person(u64),
    Ephemeral(u64),
}
