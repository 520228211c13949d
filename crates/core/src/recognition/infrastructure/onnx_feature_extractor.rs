/// ArcFace-style embedding extractor using ONNX Runtime.
///
/// Crops the detected face with a small margin (the landmark-free stand-in
/// for alignment), resizes to the model's 112x112 input, and returns an
/// L2-normalized embedding.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::feature_extractor::FeatureExtractor;
use crate::recognition::similarity::l2_normalize;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Fraction of the box size added around the crop before resizing.
const CROP_MARGIN: f64 = 0.15;

pub struct OnnxFeatureExtractor {
    session: Mutex<ort::session::Session>,
}

impl OnnxFeatureExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl FeatureExtractor for OnnxFeatureExtractor {
    fn align_and_extract(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let margin = ((bbox.width.min(bbox.height)) as f64 * CROP_MARGIN) as i32;
        let crop = frame
            .crop(&bbox.inflated(margin))
            .ok_or("face region has no visible pixels")?;

        let tensor = preprocess(&crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize the crop to 112x112, normalize to [-1, 1], NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape() {
        let crop = Frame::new(vec![128u8; 50 * 50 * 3], 50, 50, 0);
        assert_eq!(preprocess(&crop).shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_midpoint() {
        let crop = Frame::new(vec![127u8; 10 * 10 * 3], 10, 10, 0);
        let tensor = preprocess(&crop);
        let expected = (127.0 - 127.5) / 127.5;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 0.01);
    }

    #[test]
    fn test_preprocess_normalization_extremes() {
        let white = Frame::new(vec![255u8; 10 * 10 * 3], 10, 10, 0);
        assert!((preprocess(&white)[[0, 0, 0, 0]] - 1.0).abs() < 0.01);

        let black = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 0);
        assert!((preprocess(&black)[[0, 0, 0, 0]] + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_preprocess_upscales_small_crops() {
        // A 2x2 crop with distinct quadrants still fills the full input.
        let data = vec![
            0, 0, 0, 255, 255, 255, //
            255, 255, 255, 0, 0, 0,
        ];
        let crop = Frame::new(data, 2, 2, 0);
        let tensor = preprocess(&crop);
        // Top-left quadrant comes from the black pixel, top-right from white.
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, INPUT_SIZE - 1]] - 1.0).abs() < 0.01);
    }
}
