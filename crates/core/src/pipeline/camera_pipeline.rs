use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::detection_provider::DetectionProvider;
use crate::events::domain::event_sink::EventSink;
use crate::events::event_gate::EventGate;
use crate::events::recognition_event::RecognitionEvent;
use crate::pipeline::overlay;
use crate::pipeline::snapshot_writer::SnapshotWriter;
use crate::pipeline::stats::PipelineStats;
use crate::publish::domain::frame_publisher::FramePublisher;
use crate::publish::jpeg::encode_jpeg;
use crate::recognition::domain::identity::TrackIdentity;
use crate::recognition::identity_resolver::IdentityResolver;
use crate::recognition::reference_store::ReferenceStore;
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::{
    DEFAULT_CAPTURE_BACKOFF_MS, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DETECT_INTERVAL,
    DEFAULT_IOU_THRESHOLD, DEFAULT_JPEG_QUALITY, DEFAULT_RELOAD_SECS, FRAME_TOPIC,
};
use crate::shared::frame::Frame;
use crate::tracking::track_manager::TrackManager;

/// Tuning knobs for one camera instance.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub camera_id: u32,
    pub location: String,
    pub channel_id: String,
    /// Run full detection every Nth frame (1 = every frame).
    pub detect_interval: usize,
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
    pub capture_backoff: Duration,
    pub reload_period: Duration,
    pub jpeg_quality: u8,
}

impl PipelineConfig {
    pub fn for_camera(camera_id: u32, location: impl Into<String>) -> Self {
        Self {
            camera_id,
            location: location.into(),
            channel_id: FRAME_TOPIC.to_string(),
            detect_interval: DEFAULT_DETECT_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            capture_backoff: Duration::from_millis(DEFAULT_CAPTURE_BACKOFF_MS),
            reload_period: Duration::from_secs(DEFAULT_RELOAD_SECS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopping,
    Stopped,
}

/// One camera's detection-tracking-resolution loop.
///
/// Single-threaded and cooperative: the six per-iteration steps run
/// strictly in sequence, and cancellation is checked once per iteration,
/// never mid-frame. No steady-state failure terminates the loop.
pub struct CameraPipeline {
    config: PipelineConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn DetectionProvider>,
    tracks: TrackManager,
    resolver: IdentityResolver,
    gate: EventGate,
    sink: Box<dyn EventSink>,
    publisher: Box<dyn FramePublisher>,
    store: Arc<ReferenceStore>,
    snapshots: SnapshotWriter,
    stats: PipelineStats,
    cancelled: Arc<AtomicBool>,
    state: PipelineState,
    frame_count: usize,
    last_reload: Instant,
}

impl CameraPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn DetectionProvider>,
        tracks: TrackManager,
        resolver: IdentityResolver,
        gate: EventGate,
        sink: Box<dyn EventSink>,
        publisher: Box<dyn FramePublisher>,
        store: Arc<ReferenceStore>,
        snapshots: SnapshotWriter,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            config,
            source,
            detector,
            tracks,
            resolver,
            gate,
            sink,
            publisher,
            store,
            snapshots,
            stats: PipelineStats::default(),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            state: PipelineState::Stopped,
            frame_count: 0,
            last_reload: Instant::now(),
        }
    }

    /// Flag that requests a cooperative shutdown when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs until cancelled. Capture, detection, resolution, sink, and
    /// reload failures are all handled per iteration; nothing in steady
    /// state returns an error.
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.state = PipelineState::Running;
        log::info!(
            "Pipeline running for camera {} at {}",
            self.config.camera_id,
            self.config.location
        );

        // A camera that cannot be opened is a dead camera, not a dead
        // pipeline: retry with the capture backoff until cancelled.
        while !self.cancelled.load(Ordering::Relaxed) {
            match self.source.open() {
                Ok(info) => {
                    log::info!(
                        "Capture open: {}x{} @ {:.1} fps",
                        info.width,
                        info.height,
                        info.fps
                    );
                    break;
                }
                Err(e) => {
                    log::error!("Failed to open capture source: {e}");
                    std::thread::sleep(self.config.capture_backoff);
                }
            }
        }

        while !self.cancelled.load(Ordering::Relaxed) {
            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Frame read failed: {e}");
                    self.stats.capture_failure();
                    std::thread::sleep(self.config.capture_backoff);
                    continue;
                }
            };
            self.frame_count += 1;
            self.process_frame(frame);
        }

        self.state = PipelineState::Stopping;
        self.source.close();
        self.stats.log_summary();
        self.state = PipelineState::Stopped;
        Ok(())
    }

    fn process_frame(&mut self, frame: Frame) {
        self.tracks.advance(&frame);

        if self.frame_count % self.config.detect_interval == 0 {
            self.run_detection_cycle(&frame);
        }

        let mut display = frame.clone();
        overlay::annotate_tracks(&mut display, self.tracks.tracks());
        match encode_jpeg(&display, self.config.jpeg_quality) {
            Ok(payload) => {
                if !self
                    .publisher
                    .publish(&self.config.channel_id, Arc::new(payload))
                {
                    self.stats.publish_drop();
                }
            }
            Err(e) => {
                log::warn!("Frame encode failed, skipping publish: {e}");
                self.stats.publish_drop();
            }
        }

        if self.last_reload.elapsed() >= self.config.reload_period {
            self.last_reload = Instant::now();
            match self.store.reload() {
                Ok(snapshot) => log::debug!(
                    "Reference set reloaded: version {}, {} identities",
                    snapshot.version,
                    snapshot.identities.len()
                ),
                // Previous snapshot stays active; retried next period.
                Err(e) => log::error!("Reference reload failed: {e}"),
            }
        }

        self.stats.frame();
    }

    /// Step 3 of the iteration: detect, associate, resolve, emit, rebuild.
    fn run_detection_cycle(&mut self, frame: &Frame) {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                // Keep the advanced tracks; try again next cycle.
                log::warn!("Detection failed: {e}");
                return;
            }
        };

        let association = self.tracks.associate(
            &detections,
            self.config.confidence_threshold,
            self.config.iou_threshold,
        );

        let mut fresh: Vec<(BoundingBox, TrackIdentity)> = Vec::new();
        for novel in &association.novel {
            let resolved = match self.resolver.resolve(frame, &novel.detection.bbox) {
                Ok(resolved) => resolved,
                Err(e) => {
                    log::warn!("Resolution failed, dropping detection: {e}");
                    continue;
                }
            };

            // A sighting that stays unknown keeps the ephemeral key of the
            // unknown track it overlapped, so one loitering subject holds
            // one cooldown identity.
            let identity = match (resolved, novel.prior_unknown) {
                (TrackIdentity::Unknown { .. }, Some(prior)) => {
                    TrackIdentity::Unknown { ephemeral: prior }
                }
                (other, _) => other,
            };

            self.emit_event(frame, &novel.detection.bbox, &identity);
            fresh.push((novel.detection.bbox, identity));
        }

        self.tracks.rebuild(frame, association.continued, fresh);
        self.stats.detection_cycle();
    }

    /// Gate, snapshot, sink — in that order. The cooldown stamp advances
    /// as soon as the gate admits: a failed snapshot or sink write counts
    /// as an attempted event and is not retried until the next window.
    fn emit_event(&mut self, frame: &Frame, bbox: &BoundingBox, identity: &TrackIdentity) {
        let Some(key) = identity.key() else {
            return;
        };
        if !self.gate.admit(&key, Instant::now()) {
            log::debug!("Event for {key:?} suppressed by cooldown");
            return;
        }

        let (display_code, match_score) = match identity {
            TrackIdentity::Confirmed {
                display_code,
                score,
                ..
            } => (display_code.clone(), *score),
            _ => ("NA".to_string(), 0.0),
        };

        let timestamp_ms = unix_millis();
        let mut snapshot = frame.clone();
        overlay::draw_box(&mut snapshot, bbox, overlay::color_for(identity));
        let image_reference = match self.snapshots.write(
            &snapshot,
            self.config.camera_id,
            timestamp_ms,
            identity.is_confirmed(),
        ) {
            Ok(name) => name,
            Err(e) => {
                log::error!("Failed to save event image: {e}");
                return;
            }
        };

        let event = RecognitionEvent {
            identity_key: key,
            display_code,
            location: self.config.location.clone(),
            timestamp_ms,
            image_reference,
            match_score,
        };
        log::info!(
            "Recognition event: {} at {} (score {:.2})",
            event.display_code,
            event.location,
            event.match_score
        );
        if let Err(e) = self.sink.record(&event) {
            log::error!("Event sink failed (cooldown still advanced): {e}");
        }
        self.stats.event();
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
