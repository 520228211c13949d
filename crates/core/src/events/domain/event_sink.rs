use crate::events::recognition_event::RecognitionEvent;

/// External persistence for recognition events.
///
/// A failed record is logged by the pipeline and the event still counts
/// as attempted; cooldown state advances regardless.
pub trait EventSink: Send {
    fn record(&mut self, event: &RecognitionEvent) -> Result<(), Box<dyn std::error::Error>>;
}
