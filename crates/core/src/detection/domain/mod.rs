pub mod detection_provider;
pub mod tracker;
