/// ONNX Runtime face detector.
///
/// Letterbox preprocessing, confidence filtering, and greedy NMS around a
/// YOLO-family face model. Output boxes are mapped back to original-frame
/// coordinates before they leave this module.
use std::path::Path;

use crate::detection::domain::detection_provider::{Detection, DetectionProvider};
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Fallback input resolution when the model reports a dynamic shape.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Floor applied at parse time; the pipeline applies its own stricter
/// confidence threshold during association.
const PARSE_CONFIDENCE_FLOOR: f64 = 0.25;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Loads the model and reads its input resolution (NCHW `[1, 3, H, W]`).
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            input_size,
        })
    }
}

impl DetectionProvider for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();
        if shape.len() != 3 {
            return Err(format!("unexpected detector output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("cannot get tensor slice")?;

        let mapping = LetterboxMapping {
            scale,
            pad_x,
            pad_y,
        };
        let mut dets = parse_output(data, shape[1], shape[2], &mapping);
        Ok(nms(&mut dets, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

struct LetterboxMapping {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxMapping {
    /// Maps a center-format box from letterbox space to frame pixels.
    fn to_frame(&self, cx: f64, cy: f64, w: f64, h: f64) -> BoundingBox {
        let x1 = ((cx - w / 2.0) - self.pad_x as f64) / self.scale;
        let y1 = ((cy - h / 2.0) - self.pad_y as f64) / self.scale;
        BoundingBox::new(
            x1.round() as i32,
            y1.round() as i32,
            (w / self.scale).round() as i32,
            (h / self.scale).round() as i32,
        )
    }
}

/// Letterbox-resize a frame to `target` x `target`, normalized NCHW float32.
///
/// Returns `(tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Pad with 114/255 gray, the YOLO training convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Parses a `[1, A, B]` output where each detection row starts with
/// `[cx, cy, w, h, conf, ...]`. Handles both row-major and the transposed
/// `[1, features, detections]` layout YOLO exporters commonly emit.
fn parse_output(
    data: &[f32],
    dim1: usize,
    dim2: usize,
    mapping: &LetterboxMapping,
) -> Vec<Detection> {
    let transposed = dim1 < dim2;
    let (num_dets, num_feats) = if transposed { (dim2, dim1) } else { (dim1, dim2) };
    if num_feats < 5 {
        return Vec::new();
    }

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let feat = |f: usize| {
            if transposed {
                data[f * num_dets + i]
            } else {
                data[i * num_feats + f]
            }
        };

        let conf = feat(4) as f64;
        if conf < PARSE_CONFIDENCE_FLOOR {
            continue;
        }

        let bbox = mapping.to_frame(feat(0) as f64, feat(1) as f64, feat(2) as f64, feat(3) as f64);
        if bbox.is_degenerate() {
            continue;
        }
        dets.push(Detection {
            bbox,
            confidence: conf,
        });
    }
    dets
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [Detection], iou_thresh: f64) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}
