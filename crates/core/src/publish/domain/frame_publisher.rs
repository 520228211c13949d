use std::sync::Arc;

/// Topic-tagged broadcast of encoded display frames.
///
/// Strictly best-effort: implementations must never block the pipeline
/// loop. Returns false when the payload was dropped (no subscribers or
/// backpressure), which callers may count but not act on.
pub trait FramePublisher: Send {
    fn publish(&self, channel_id: &str, payload: Arc<Vec<u8>>) -> bool;
}
