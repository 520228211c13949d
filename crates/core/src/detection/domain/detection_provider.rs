use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// One raw detector hit, in original-frame coordinates.
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// Capability interface for full-frame face detection.
///
/// Implementations may be stateful (e.g., lazily sized to the input),
/// hence `&mut self`. The pipeline only runs this on full-detection
/// cycles; tracker advance covers the frames in between.
pub trait DetectionProvider: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
