/// An axis-aligned box in original-frame pixel coordinates.
///
/// Width/height may extend past the frame edge; consumers clamp before
/// touching pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0) as f64 * self.height.max(0) as f64
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection-over-union; non-overlapping or degenerate boxes yield 0.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Intersects the box with a `frame_width` x `frame_height` frame.
    ///
    /// The result may be degenerate when the box lies entirely outside.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let x1 = self.x.clamp(0, frame_width as i32);
        let y1 = self.y.clamp(0, frame_height as i32);
        let x2 = (self.x + self.width).clamp(0, frame_width as i32);
        let y2 = (self.y + self.height).clamp(0, frame_height as i32);
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Grows the box by `margin` pixels on every side.
    pub fn inflated(&self, margin: i32) -> BoundingBox {
        BoundingBox::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical_boxes() {
        let a = bbox(10, 10, 100, 100);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = bbox(0, 0, 50, 50);
        let b = bbox(100, 100, 50, 50);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // a: [0,0]-[100,100], b: [50,0]-[150,100]
        // intersection: 50*100 = 5000, union: 10000 + 10000 - 5000 = 15000
        let a = bbox(0, 0, 100, 100);
        let b = bbox(50, 0, 100, 100);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_contained() {
        let a = bbox(0, 0, 100, 100);
        let b = bbox(25, 25, 50, 50);
        assert_relative_eq!(a.iou(&b), 2500.0 / 10000.0);
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = bbox(0, 0, 50, 50);
        let b = bbox(50, 0, 50, 50);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[rstest]
    #[case::zero_width(bbox(0, 0, 0, 100), bbox(0, 0, 50, 50))]
    #[case::zero_height(bbox(0, 0, 100, 0), bbox(0, 0, 50, 50))]
    #[case::negative_width(bbox(0, 0, -10, 100), bbox(0, 0, 50, 50))]
    fn test_iou_degenerate(#[case] a: BoundingBox, #[case] b: BoundingBox) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamped_inside_is_unchanged() {
        let a = bbox(10, 10, 20, 20);
        assert_eq!(a.clamped(100, 100), a);
    }

    #[test]
    fn test_clamped_negative_origin() {
        let a = bbox(-10, -5, 30, 30);
        assert_eq!(a.clamped(100, 100), bbox(0, 0, 20, 25));
    }

    #[test]
    fn test_clamped_past_far_edge() {
        let a = bbox(90, 95, 30, 30);
        assert_eq!(a.clamped(100, 100), bbox(90, 95, 10, 5));
    }

    #[test]
    fn test_clamped_fully_outside_is_degenerate() {
        let a = bbox(200, 200, 30, 30);
        assert!(a.clamped(100, 100).is_degenerate());
    }

    // ── Inflate ──────────────────────────────────────────────────────

    #[test]
    fn test_inflated_grows_all_sides() {
        let a = bbox(10, 20, 30, 40).inflated(5);
        assert_eq!(a, bbox(5, 15, 40, 50));
    }

    #[test]
    fn test_area() {
        assert_relative_eq!(bbox(0, 0, 10, 20).area(), 200.0);
        assert_relative_eq!(bbox(0, 0, -10, 20).area(), 0.0);
    }
}
