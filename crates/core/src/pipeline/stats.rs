use std::time::Instant;

/// Per-instance pipeline counters with a throttled status line.
///
/// Emits one `log::info!` line every `log_every` processed frames and a
/// final summary when the loop shuts down.
pub struct PipelineStats {
    started: Instant,
    log_every: usize,
    frames: usize,
    detection_cycles: usize,
    events: usize,
    publish_drops: usize,
    capture_failures: usize,
}

impl PipelineStats {
    pub fn new(log_every: usize) -> Self {
        Self {
            started: Instant::now(),
            log_every: log_every.max(1),
            frames: 0,
            detection_cycles: 0,
            events: 0,
            publish_drops: 0,
            capture_failures: 0,
        }
    }

    pub fn frame(&mut self) {
        self.frames += 1;
        if self.frames % self.log_every == 0 {
            log::info!(
                "Processed {} frames ({:.1} fps, {} detection cycles, {} events)",
                self.frames,
                self.fps(),
                self.detection_cycles,
                self.events
            );
        }
    }

    pub fn detection_cycle(&mut self) {
        self.detection_cycles += 1;
    }

    pub fn event(&mut self) {
        self.events += 1;
    }

    pub fn publish_drop(&mut self) {
        self.publish_drops += 1;
    }

    pub fn capture_failure(&mut self) {
        self.capture_failures += 1;
    }

    pub fn frames_processed(&self) -> usize {
        self.frames
    }

    fn fps(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary_string(&self) -> String {
        format!(
            "{} frames, {} detection cycles, {} events, {} publish drops, {} capture failures ({:.1} fps)",
            self.frames,
            self.detection_cycles,
            self.events,
            self.publish_drops,
            self.capture_failures,
            self.fps()
        )
    }

    pub fn log_summary(&self) {
        log::info!("Pipeline summary: {}", self.summary_string());
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new(100)
    }
}
