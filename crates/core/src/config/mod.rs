pub mod camera_registry;
