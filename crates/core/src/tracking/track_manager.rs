use crate::detection::domain::detection_provider::Detection;
use crate::detection::domain::tracker::TrackerFactory;
use crate::recognition::domain::identity::TrackIdentity;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::track::Track;

/// A detection folded into an existing confirmed track.
#[derive(Clone, Debug)]
pub struct ContinuedDetection {
    pub track_id: u32,
    pub bbox: BoundingBox,
    pub identity: TrackIdentity,
}

/// A detection that must go through identity resolution.
///
/// `prior_unknown` carries the ephemeral key of the best-overlapping
/// unknown track, if any, so a subject that stays unknown keeps one
/// cooldown identity across detection cycles.
#[derive(Clone, Debug)]
pub struct NovelDetection {
    pub detection: Detection,
    pub prior_unknown: Option<u64>,
}

/// Partition of one detection cycle's output.
#[derive(Debug, Default)]
pub struct Association {
    pub continued: Vec<ContinuedDetection>,
    pub novel: Vec<NovelDetection>,
}

/// Owns the live track set for one pipeline instance.
pub struct TrackManager {
    factory: Box<dyn TrackerFactory>,
    tracks: Vec<Track>,
    next_track_id: u32,
}

impl TrackManager {
    pub fn new(factory: Box<dyn TrackerFactory>) -> Self {
        Self {
            factory,
            tracks: Vec::new(),
            next_track_id: 1,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Advances every live track via its owned tracker handle.
    ///
    /// Tracks whose update fails are removed permanently.
    pub fn advance(&mut self, frame: &Frame) -> &[Track] {
        self.tracks.retain_mut(|track| {
            let alive = track.advance(frame);
            if !alive {
                log::debug!("Track {} lost by tracker, removing", track.id());
            }
            alive
        });
        &self.tracks
    }

    /// Partitions detections against the live track set.
    ///
    /// A detection is folded into the first confirmed track, in detection
    /// order, whose IoU exceeds `iou_threshold`; each track is consumed at
    /// most once so ids stay unique after the rebuild. Detections
    /// overlapping only unknown tracks stay novel: an unknown sighting
    /// keeps attempting to earn a confirmed identity every cycle.
    /// Detections below `confidence_threshold` are discarded outright.
    pub fn associate(
        &self,
        detections: &[Detection],
        confidence_threshold: f64,
        iou_threshold: f64,
    ) -> Association {
        let mut result = Association::default();
        let mut consumed = vec![false; self.tracks.len()];

        for detection in detections {
            if detection.confidence < confidence_threshold {
                continue;
            }

            let matched = self.tracks.iter().enumerate().find(|(i, track)| {
                !consumed[*i]
                    && track.identity.is_confirmed()
                    && track.bbox.iou(&detection.bbox) > iou_threshold
            });

            if let Some((i, track)) = matched {
                consumed[i] = true;
                result.continued.push(ContinuedDetection {
                    track_id: track.id(),
                    bbox: detection.bbox,
                    identity: track.identity.clone(),
                });
            } else {
                result.novel.push(NovelDetection {
                    detection: detection.clone(),
                    prior_unknown: self.best_unknown_overlap(&detection.bbox, iou_threshold),
                });
            }
        }
        result
    }

    /// Ephemeral key of the unknown track overlapping `bbox` the most,
    /// provided the overlap clears the association threshold.
    fn best_unknown_overlap(&self, bbox: &BoundingBox, iou_threshold: f64) -> Option<u64> {
        self.tracks
            .iter()
            .filter_map(|track| match track.identity {
                TrackIdentity::Unknown { ephemeral } => {
                    let iou = track.bbox.iou(bbox);
                    (iou > iou_threshold).then_some((ephemeral, iou))
                }
                _ => None,
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(ephemeral, _)| ephemeral)
    }

    /// Instantiates one track with a fresh tracker handle locked onto the
    /// current frame.
    pub fn create(
        &mut self,
        frame: &Frame,
        bbox: BoundingBox,
        identity: TrackIdentity,
    ) -> Result<u32, Box<dyn std::error::Error>> {
        let mut handle = self.factory.create();
        handle.init(frame, bbox)?;

        let id = self.next_track_id;
        self.next_track_id += 1;
        self.tracks
            .push(Track::new(id, bbox, identity, handle, frame.index()));
        Ok(id)
    }

    /// Replaces the live set after a full-detection cycle.
    ///
    /// Continued entries keep their track id and identity on a freshly
    /// initialized handle; fresh entries get new ids. Tracks not renewed
    /// by either list die here. A handle that fails to initialize drops
    /// only its own entry.
    pub fn rebuild(
        &mut self,
        frame: &Frame,
        continued: Vec<ContinuedDetection>,
        fresh: Vec<(BoundingBox, TrackIdentity)>,
    ) {
        self.tracks.clear();

        for entry in continued {
            let mut handle = self.factory.create();
            match handle.init(frame, entry.bbox) {
                Ok(()) => self.tracks.push(Track::new(
                    entry.track_id,
                    entry.bbox,
                    entry.identity,
                    handle,
                    frame.index(),
                )),
                Err(e) => log::warn!("Dropping continued track {}: {e}", entry.track_id),
            }
        }

        for (bbox, identity) in fresh {
            if let Err(e) = self.create(frame, bbox, identity) {
                log::warn!("Dropping new track at {bbox:?}: {e}");
            }
        }
    }
}
