/// Short-horizon template tracker over normalized cross-correlation.
///
/// Stores a grayscale sample grid of the target at init and, on each
/// update, searches a bounded window around the last position for the
/// best correlation peak. Loses the target (update → `None`) when the
/// peak drops below a floor, e.g. on occlusion or when the subject
/// leaves the window.
use crate::detection::domain::tracker::{TrackerFactory, TrackerHandle};
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Pixels searched in every direction around the last known position.
pub const DEFAULT_SEARCH_MARGIN: i32 = 24;

/// Correlation below this is a lost target.
pub const DEFAULT_MIN_SCORE: f32 = 0.35;

/// Sample grid resolution per axis; larger boxes are subsampled.
const GRID_SIZE: usize = 24;

pub struct NccTracker {
    search_margin: i32,
    min_score: f32,
    template: Vec<f32>,
    grid_w: usize,
    grid_h: usize,
    bbox: BoundingBox,
    initialized: bool,
}

impl NccTracker {
    pub fn new(search_margin: i32, min_score: f32) -> Self {
        Self {
            search_margin,
            min_score,
            template: Vec::new(),
            grid_w: 0,
            grid_h: 0,
            bbox: BoundingBox::new(0, 0, 0, 0),
            initialized: false,
        }
    }

    /// Samples the grid at `origin` and returns grayscale values.
    fn sample_patch(&self, frame: &Frame, origin_x: i32, origin_y: i32) -> Vec<f32> {
        let mut patch = Vec::with_capacity(self.grid_w * self.grid_h);
        for gy in 0..self.grid_h {
            let y = origin_y + grid_to_pixel(gy, self.grid_h, self.bbox.height);
            for gx in 0..self.grid_w {
                let x = origin_x + grid_to_pixel(gx, self.grid_w, self.bbox.width);
                patch.push(luma_at(frame, x, y));
            }
        }
        patch
    }
}

impl TrackerHandle for NccTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), Box<dyn std::error::Error>> {
        let clamped = bbox.clamped(frame.width(), frame.height());
        if clamped.is_degenerate() {
            return Err("tracker target has no visible area".into());
        }

        self.bbox = clamped;
        self.grid_w = (clamped.width as usize).min(GRID_SIZE);
        self.grid_h = (clamped.height as usize).min(GRID_SIZE);
        self.template = self.sample_patch(frame, clamped.x, clamped.y);
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        if !self.initialized {
            return None;
        }

        let mut best_score = f32::MIN;
        let mut best_offset = (0, 0);
        for dy in -self.search_margin..=self.search_margin {
            for dx in -self.search_margin..=self.search_margin {
                let patch = self.sample_patch(frame, self.bbox.x + dx, self.bbox.y + dy);
                let score = zncc(&self.template, &patch);
                if score > best_score {
                    best_score = score;
                    best_offset = (dx, dy);
                }
            }
        }

        if best_score < self.min_score {
            return None;
        }

        self.bbox = BoundingBox::new(
            self.bbox.x + best_offset.0,
            self.bbox.y + best_offset.1,
            self.bbox.width,
            self.bbox.height,
        );
        Some(self.bbox)
    }
}

pub struct NccTrackerFactory {
    search_margin: i32,
    min_score: f32,
}

impl NccTrackerFactory {
    pub fn new(search_margin: i32, min_score: f32) -> Self {
        Self {
            search_margin,
            min_score,
        }
    }
}

impl Default for NccTrackerFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_MARGIN, DEFAULT_MIN_SCORE)
    }
}

impl TrackerFactory for NccTrackerFactory {
    fn create(&self) -> Box<dyn TrackerHandle> {
        Box::new(NccTracker::new(self.search_margin, self.min_score))
    }
}

/// Maps grid index `g` of `n` samples onto a pixel offset within `extent`.
fn grid_to_pixel(g: usize, n: usize, extent: i32) -> i32 {
    if n <= 1 {
        return 0;
    }
    (g as i64 * (extent as i64 - 1) / (n as i64 - 1)) as i32
}

/// Grayscale value at (x, y), clamped to the frame edges.
fn luma_at(frame: &Frame, x: i32, y: i32) -> f32 {
    let x = x.clamp(0, frame.width() as i32 - 1) as usize;
    let y = y.clamp(0, frame.height() as i32 - 1) as usize;
    let offset = (y * frame.width() as usize + x) * 3;
    let px = &frame.data()[offset..offset + 3];
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

/// Zero-normalized cross-correlation of two equally sized patches.
///
/// Flat patches (zero variance) correlate to 0, never NaN.
fn zncc(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len() as f32;
    let mean_a: f32 = a.iter().sum::<f32>() / n;
    let mean_b: f32 = b.iter().sum::<f32>() / n;

    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        let da = va - mean_a;
        let db = vb - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Black frame with a white square at (x, y).
    fn frame_with_square(x: usize, y: usize, size: usize) -> Frame {
        let (w, h) = (120usize, 120usize);
        let mut data = vec![0u8; w * h * 3];
        for row in y..(y + size).min(h) {
            for col in x..(x + size).min(w) {
                let offset = (row * w + col) * 3;
                data[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        Frame::new(data, w as u32, h as u32, 0)
    }

    #[test]
    fn test_update_before_init_is_lost() {
        let mut tracker = NccTracker::new(10, 0.35);
        assert!(tracker.update(&frame_with_square(30, 30, 20)).is_none());
    }

    #[test]
    fn test_init_degenerate_bbox_errors() {
        let mut tracker = NccTracker::new(10, 0.35);
        let frame = frame_with_square(30, 30, 20);
        assert!(tracker
            .init(&frame, BoundingBox::new(200, 200, 10, 10))
            .is_err());
        assert!(tracker.init(&frame, BoundingBox::new(5, 5, 0, 10)).is_err());
    }

    #[test]
    fn test_stationary_target_keeps_position() {
        let frame = frame_with_square(30, 30, 20);
        let mut tracker = NccTracker::new(10, 0.35);
        tracker
            .init(&frame, BoundingBox::new(28, 28, 24, 24))
            .unwrap();

        let bbox = tracker.update(&frame).unwrap();
        assert_eq!((bbox.x, bbox.y), (28, 28));
    }

    #[test]
    fn test_follows_moving_target() {
        let mut tracker = NccTracker::new(10, 0.35);
        tracker
            .init(&frame_with_square(30, 30, 20), BoundingBox::new(28, 28, 24, 24))
            .unwrap();

        let bbox = tracker.update(&frame_with_square(35, 33, 20)).unwrap();
        assert_eq!((bbox.x, bbox.y), (33, 31));
        assert_eq!((bbox.width, bbox.height), (24, 24));

        // Keeps following on the next step.
        let bbox = tracker.update(&frame_with_square(40, 36, 20)).unwrap();
        assert_eq!((bbox.x, bbox.y), (38, 34));
    }

    #[test]
    fn test_loses_vanished_target() {
        let mut tracker = NccTracker::new(10, 0.35);
        tracker
            .init(&frame_with_square(30, 30, 20), BoundingBox::new(28, 28, 24, 24))
            .unwrap();

        // Target gone: nothing but flat background in the search window.
        let blank = Frame::new(vec![0u8; 120 * 120 * 3], 120, 120, 1);
        assert!(tracker.update(&blank).is_none());
    }

    #[test]
    fn test_loses_target_outside_search_window() {
        let mut tracker = NccTracker::new(6, 0.35);
        tracker
            .init(&frame_with_square(30, 30, 20), BoundingBox::new(28, 28, 24, 24))
            .unwrap();

        assert!(tracker.update(&frame_with_square(90, 90, 20)).is_none());
    }

    #[test]
    fn test_zncc_identical_patches() {
        let a = vec![1.0, 5.0, 3.0, 8.0];
        assert!((zncc(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zncc_inverted_patches() {
        let a = vec![0.0, 1.0, 0.0, 1.0];
        let b = vec![1.0, 0.0, 1.0, 0.0];
        assert!((zncc(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zncc_flat_patch_is_zero() {
        let a = vec![1.0, 2.0, 3.0];
        let flat = vec![5.0, 5.0, 5.0];
        assert_eq!(zncc(&a, &flat), 0.0);
    }

    #[test]
    fn test_factory_creates_fresh_handles() {
        let factory = NccTrackerFactory::default();
        let mut handle = factory.create();
        // Fresh handles are uninitialized and report lost.
        assert!(handle.update(&frame_with_square(0, 0, 10)).is_none());
    }
}
