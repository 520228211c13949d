mod reference_file;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use facewatch_core::capture::infrastructure::ffmpeg_source::FfmpegSource;
use facewatch_core::config::camera_registry::{CameraConfig, CameraRegistry};
use facewatch_core::detection::infrastructure::ncc_tracker::NccTrackerFactory;
use facewatch_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use facewatch_core::events::event_gate::EventGate;
use facewatch_core::events::infrastructure::jsonl_event_sink::JsonlEventSink;
use facewatch_core::pipeline::camera_pipeline::{CameraPipeline, PipelineConfig};
use facewatch_core::pipeline::snapshot_writer::SnapshotWriter;
use facewatch_core::publish::infrastructure::broadcast_publisher::BroadcastPublisher;
use facewatch_core::recognition::identity_resolver::IdentityResolver;
use facewatch_core::recognition::infrastructure::onnx_feature_extractor::OnnxFeatureExtractor;
use facewatch_core::recognition::reference_store::ReferenceStore;
use facewatch_core::shared::constants::{
    DEFAULT_CAPTURE_BACKOFF_MS, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_COOLDOWN_SECS,
    DEFAULT_DETECT_INTERVAL, DEFAULT_IOU_THRESHOLD, DEFAULT_JPEG_QUALITY, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_RELOAD_SECS, DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, EMBEDDING_MODEL_NAME,
    EMBEDDING_MODEL_URL,
};
use facewatch_core::shared::model_resolver;
use facewatch_core::tracking::track_manager::TrackManager;

use reference_file::JsonReferenceSource;

/// Face recognition pipeline for one monitored camera.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Camera id to run; must exist in the camera registry.
    camera_id: u32,

    /// Camera registry file.
    #[arg(long, default_value = "cameras.json")]
    cameras: PathBuf,

    /// Reference identity file (person keys, codes, embeddings).
    #[arg(long, default_value = "references.json")]
    references: PathBuf,

    /// Event log output (JSON lines).
    #[arg(long, default_value = "events.jsonl")]
    events_out: PathBuf,

    /// Directory for per-event snapshot images.
    #[arg(long, default_value = "notifications")]
    snapshots: PathBuf,

    /// Directory with pre-downloaded model weights.
    #[arg(long)]
    weights_dir: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    confidence: f64,

    /// Similarity score needed for a confirmed match (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    match_threshold: f64,

    /// IoU above which a detection continues an existing track.
    #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
    iou_threshold: f64,

    /// Run full detection every Nth frame (1 = every frame).
    #[arg(long, default_value_t = DEFAULT_DETECT_INTERVAL)]
    detect_interval: usize,

    /// Minimum seconds between events for the same identity.
    #[arg(long, default_value_t = DEFAULT_COOLDOWN_SECS)]
    cooldown_secs: u64,

    /// Seconds between reference set reloads.
    #[arg(long, default_value_t = DEFAULT_RELOAD_SECS)]
    reload_secs: u64,

    /// Sleep after a failed capture read, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_BACKOFF_MS)]
    capture_backoff_ms: u64,

    /// JPEG quality for broadcast frames (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u8,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    // Camera resolution is the only fatal lookup: a pipeline with no
    // camera record has nothing to do.
    let registry = CameraRegistry::from_file(&cli.cameras)?;
    let camera = registry.resolve(cli.camera_id)?.clone();
    log::info!(
        "Camera {}: {} ({:?}) at {}",
        camera.id,
        camera.source_uri,
        camera.kind,
        camera.location
    );

    let source = JsonReferenceSource::new(&cli.references);
    let store = Arc::new(ReferenceStore::open(Box::new(source))?);
    let mut pipeline = build_pipeline(&cli, &camera, store)?;

    let cancel = pipeline.cancel_handle();
    ctrlc::set_handler(move || {
        log::info!("Shutdown requested");
        cancel.store(true, Ordering::Relaxed);
    })?;

    pipeline.run()
}

fn build_pipeline(
    cli: &Cli,
    camera: &CameraConfig,
    store: Arc<ReferenceStore>,
) -> Result<CameraPipeline, Box<dyn std::error::Error>> {
    let detector_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        cli.weights_dir.as_deref(),
    )?;
    let embedder_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        cli.weights_dir.as_deref(),
    )?;

    let detector = OnnxFaceDetector::new(&detector_path)?;
    let extractor = OnnxFeatureExtractor::new(&embedder_path)?;
    let resolver = IdentityResolver::new(Box::new(extractor), store.clone(), cli.match_threshold);

    let mut config = PipelineConfig::for_camera(camera.id, camera.location.clone());
    config.detect_interval = cli.detect_interval;
    config.confidence_threshold = cli.confidence;
    config.iou_threshold = cli.iou_threshold;
    config.capture_backoff = Duration::from_millis(cli.capture_backoff_ms);
    config.reload_period = Duration::from_secs(cli.reload_secs);
    config.jpeg_quality = cli.jpeg_quality;

    Ok(CameraPipeline::new(
        config,
        Box::new(FfmpegSource::new(camera.source_uri.clone())),
        Box::new(detector),
        TrackManager::new(Box::new(NccTrackerFactory::default())),
        resolver,
        EventGate::new(Duration::from_secs(cli.cooldown_secs)),
        Box::new(JsonlEventSink::open(&cli.events_out)?),
        Box::new(BroadcastPublisher::new()),
        store,
        SnapshotWriter::new(&cli.snapshots),
        None,
    ))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.match_threshold) {
        return Err(format!(
            "Match threshold must be between 0.0 and 1.0, got {}",
            cli.match_threshold
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.iou_threshold) {
        return Err(format!(
            "IoU threshold must be between 0.0 and 1.0, got {}",
            cli.iou_threshold
        )
        .into());
    }
    if cli.detect_interval == 0 {
        return Err("Detect interval must be at least 1".into());
    }
    if cli.jpeg_quality == 0 || cli.jpeg_quality > 100 {
        return Err(format!(
            "JPEG quality must be between 1 and 100, got {}",
            cli.jpeg_quality
        )
        .into());
    }
    Ok(())
}
