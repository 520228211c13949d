use ndarray::ArrayView3;

use crate::shared::bbox::BoundingBox;

/// Number of channels in every frame the pipeline handles.
pub const FRAME_CHANNELS: usize = 3;

/// A single captured frame: contiguous RGB24 bytes in row-major order.
///
/// Format conversion happens at the capture boundary only; everything
/// downstream works on plain RGB bytes in original-frame coordinates.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * FRAME_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Monotonic capture index, assigned by the frame source.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, FRAME_CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Extracts the pixels under `bbox`, clamped to the frame.
    ///
    /// Returns `None` when the clamped box is degenerate (no visible area),
    /// which callers treat as an unreadable crop.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let clamped = bbox.clamped(self.width, self.height);
        if clamped.is_degenerate() {
            return None;
        }

        let (x, y) = (clamped.x as usize, clamped.y as usize);
        let (w, h) = (clamped.width as usize, clamped.height as usize);
        let stride = self.width as usize * FRAME_CHANNELS;

        let mut out = Vec::with_capacity(w * h * FRAME_CHANNELS);
        for row in y..y + h {
            let start = row * stride + x * FRAME_CHANNELS;
            out.extend_from_slice(&self.data[start..start + w * FRAME_CHANNELS]);
        }
        Some(Frame::new(out, w as u32, h as u32, self.index))
    }
}
