pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Minimum detection confidence for a box to enter association.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// IoU above which a detection is folded into an existing confirmed track.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// Similarity score at or above which a face is a confirmed match.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;

/// Run full detection every Nth frame; tracker-only advance in between.
pub const DEFAULT_DETECT_INTERVAL: usize = 3;

/// Minimum seconds between two emitted events for the same identity key.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// Seconds between reference store reload attempts.
pub const DEFAULT_RELOAD_SECS: u64 = 10;

/// Backoff after a failed capture read, bounding spin on a dead camera.
pub const DEFAULT_CAPTURE_BACKOFF_MS: u64 = 1000;

/// JPEG quality for published display frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Topic under which annotated frames are broadcast.
pub const FRAME_TOPIC: &str = "newframe";
