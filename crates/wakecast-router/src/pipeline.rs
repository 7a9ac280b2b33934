use tokio::sync::mpsc;
use wakecast_core::{AudioBlock, TriggerGate, WakeDetector, WakeEvent};
use wakecast_engine::RecognizerAdapter;

/// Capture-thread side of the service: recognizer → detector → gate, then a
/// non-blocking handoff to the event loop.
pub struct Pipeline {
    adapter: RecognizerAdapter,
    detector: WakeDetector,
    gate: TriggerGate,
    events: mpsc::UnboundedSender<WakeEvent>,
}

impl Pipeline {
    pub fn new(
        adapter: RecognizerAdapter,
        detector: WakeDetector,
        gate: TriggerGate,
        events: mpsc::UnboundedSender<WakeEvent>,
    ) -> Self {
        Self {
            adapter,
            detector,
            gate,
            events,
        }
    }

    /// Process one block. Returns `true` if a wake event was handed off.
    pub fn process_block(&mut self, block: &AudioBlock) -> bool {
        let recognized = self.adapter.feed(block);
        let hit = self.detector.check(&recognized);
        let matched = hit.is_some();
        if !self.gate.admit(&recognized, matched) {
            if matched {
                tracing::debug!("repeat trigger within utterance suppressed");
            }
            return false;
        }
        let Some(wake) = hit else {
            return false;
        };

        tracing::info!(phrase = %wake.phrase, "wake phrase detected");
        match self.events.send(wake) {
            Ok(()) => true,
            Err(mpsc::error::SendError(dropped)) => {
                tracing::warn!(
                    phrase = %dropped.phrase,
                    "event loop unavailable, detection dropped"
                );
                false
            }
        }
    }
}
