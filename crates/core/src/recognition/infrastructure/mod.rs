pub mod onnx_feature_extractor;
