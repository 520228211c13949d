use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::recognition::domain::identity::IdentityKey;

/// Per-identity cooldown preventing event storms.
///
/// State is local to one pipeline instance. Entries are stamped forward
/// on every admitted event and expire purely by the time comparison;
/// nothing deletes them.
pub struct EventGate {
    cooldown: Duration,
    last_emitted: HashMap<IdentityKey, Instant>,
}

impl EventGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emitted: HashMap::new(),
        }
    }

    /// Whether an event for `key` should be emitted at `now`.
    ///
    /// Admits when the key has never emitted or the cooldown has fully
    /// elapsed — an event at exactly the cooldown boundary is admitted —
    /// and restamps the key on every admission.
    pub fn admit(&mut self, key: &IdentityKey, now: Instant) -> bool {
        let expired = self
            .last_emitted
            .get(key)
            .map_or(true, |&last| now.duration_since(last) >= self.cooldown);
        if expired {
            self.last_emitted.insert(key.clone(), now);
        }
        expired
    }
}
