use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Capability interface for face embedding extraction.
///
/// Implementations align/crop the face under `bbox` and return a fixed-
/// length, L2-normalized feature vector. An unreadable crop is an error;
/// the caller drops that detection for the cycle.
pub trait FeatureExtractor: Send {
    fn align_and_extract(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
