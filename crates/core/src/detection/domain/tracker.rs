use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Short-horizon single-object visual tracker.
///
/// One handle is owned by exactly one track for that track's lifetime;
/// handles are never shared or re-targeted.
pub trait TrackerHandle: Send {
    /// Locks the tracker onto `bbox` in `frame`.
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), Box<dyn std::error::Error>>;

    /// Advances the tracker by one frame.
    ///
    /// `None` means the target was lost; the owning track is removed and
    /// never resurrected.
    fn update(&mut self, frame: &Frame) -> Option<BoundingBox>;
}

/// Mints a fresh, uninitialized tracker handle per new track.
pub trait TrackerFactory: Send {
    fn create(&self) -> Box<dyn TrackerHandle>;
}
