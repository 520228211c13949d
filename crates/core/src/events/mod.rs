pub mod domain;
pub mod event_gate;
pub mod infrastructure;
pub mod recognition_event;
