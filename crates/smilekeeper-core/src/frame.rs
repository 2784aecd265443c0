//! Frame/sample boundary.
//!
//! Capture and landmark extraction live outside the core; all the tick
//! loop sees is "a normalized geometry ratio, or nothing this tick".
//! Absence of a sample is a valid tick, never an error and never an
//! implicit "not smiling".

use std::sync::{Arc, Mutex};

/// Produces at most one smile-ratio sample per tick.
pub trait FrameSource {
    /// Latest ratio if a face was detected since the last poll.
    fn poll(&mut self) -> Option<f64>;
}

/// Latest-sample slot between a capture worker thread and the tick
/// loop. The producer overwrites, the consumer takes; neither blocks
/// beyond the lock itself.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    slot: Arc<Mutex<Option<f64>>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: overwrite the slot with the freshest sample.
    pub fn publish(&self, ratio: f64) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(ratio);
        }
    }

    /// Consumer side: take the sample if one arrived since last take.
    pub fn take(&self) -> Option<f64> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl FrameSource for SampleBuffer {
    fn poll(&mut self) -> Option<f64> {
        self.take()
    }
}

/// Replays a fixed trace of samples; `None` entries are no-face ticks.
/// Once the trace is exhausted every poll returns `None`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    samples: std::vec::IntoIter<Option<f64>>,
}

impl ScriptedSource {
    pub fn new(samples: Vec<Option<f64>>) -> Self {
        Self {
            samples: samples.into_iter(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn poll(&mut self) -> Option<f64> {
        self.samples.next().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_take_consumes_the_sample() {
        let buf = SampleBuffer::new();
        assert_eq!(buf.take(), None);
        buf.publish(0.4);
        buf.publish(0.5); // overwrites, consumer only sees the freshest
        assert_eq!(buf.take(), Some(0.5));
        assert_eq!(buf.take(), None);
    }

    #[test]
    fn buffer_is_shared_across_threads() {
        let buf = SampleBuffer::new();
        let producer = buf.clone();
        let handle = std::thread::spawn(move || {
            producer.publish(0.7);
        });
        handle.join().unwrap();
        assert_eq!(buf.take(), Some(0.7));
    }

    #[test]
    fn scripted_source_replays_then_dries_up() {
        let mut src = ScriptedSource::new(vec![Some(0.1), None, Some(0.2)]);
        assert_eq!(src.poll(), Some(0.1));
        assert_eq!(src.poll(), None);
        assert_eq!(src.poll(), Some(0.2));
        assert_eq!(src.poll(), None);
    }
}
