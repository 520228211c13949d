use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::publish::domain::frame_publisher::FramePublisher;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// In-process topic hub over bounded crossbeam channels.
///
/// Each subscriber gets its own bounded queue; `publish` try-sends to
/// every live subscriber and drops the payload for full queues, so a
/// slow viewer can never stall frame processing. Disconnected
/// subscribers are pruned on the next publish.
pub struct BroadcastPublisher {
    capacity: usize,
    topics: Mutex<HashMap<String, Vec<Sender<Arc<Vec<u8>>>>>>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a subscriber on `channel_id` and returns its queue.
    pub fn subscribe(&self, channel_id: &str) -> Receiver<Arc<Vec<u8>>> {
        let (tx, rx) = crossbeam_channel::bounded(self.capacity);
        self.topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(channel_id.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePublisher for BroadcastPublisher {
    fn publish(&self, channel_id: &str, payload: Arc<Vec<u8>>) -> bool {
        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(senders) = topics.get_mut(channel_id) else {
            return false;
        };

        let mut delivered = false;
        senders.retain(|tx| match tx.try_send(payload.clone()) {
            Ok(()) => {
                delivered = true;
                true
            }
            Err(TrySendError::Full(_)) => true, // dropped for this subscriber
            Err(TrySendError::Disconnected(_)) => false,
        });
        delivered
    }
}
