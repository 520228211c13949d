use crate::detection::domain::tracker::TrackerHandle;
use crate::recognition::domain::identity::TrackIdentity;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// A live hypothesis that a sequence of boxes belongs to one subject.
///
/// Exclusively owns its tracker handle; the handle dies with the track.
pub struct Track {
    id: u32,
    pub bbox: BoundingBox,
    pub identity: TrackIdentity,
    handle: Box<dyn TrackerHandle>,
    pub last_update: usize,
}

impl Track {
    pub(crate) fn new(
        id: u32,
        bbox: BoundingBox,
        identity: TrackIdentity,
        handle: Box<dyn TrackerHandle>,
        frame_index: usize,
    ) -> Self {
        Self {
            id,
            bbox,
            identity,
            handle,
            last_update: frame_index,
        }
    }

    /// Unique within the pipeline instance for its lifetime; never reused.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Advances the owned tracker by one frame.
    ///
    /// Returns false when the tracker lost the target; the caller removes
    /// the track and it is never resurrected.
    pub(crate) fn advance(&mut self, frame: &Frame) -> bool {
        match self.handle.update(frame) {
            Some(bbox) => {
                self.bbox = bbox;
                self.last_update = frame.index();
                true
            }
            None => false,
        }
    }
}
