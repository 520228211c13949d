pub mod ncc_tracker;
pub mod onnx_face_detector;
