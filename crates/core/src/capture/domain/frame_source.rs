use crate::shared::frame::Frame;

/// Geometry and rate of an opened source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Continuous frame supply for one camera.
///
/// `read` failures are transient by contract: the pipeline sleeps a
/// bounded backoff and retries, it never tears down the instance.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<SourceInfo, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is available or the read fails.
    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases the capture handle. Idempotent.
    fn close(&mut self);
}
