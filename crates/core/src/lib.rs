//! Per-camera face recognition pipeline: detection-tracking fusion,
//! identity resolution against a hot-swappable reference set, cooldown-
//! gated event emission, and annotated frame broadcast.

pub mod capture;
pub mod config;
pub mod detection;
pub mod events;
pub mod pipeline;
pub mod publish;
pub mod recognition;
pub mod shared;
pub mod tracking;
