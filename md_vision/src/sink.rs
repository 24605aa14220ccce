//! ABOUTME: Narrow boolean capability exposed to the sensor publishing framework
//! ABOUTME: Edge-triggered forwarding of motion state to pluggable sinks

use tracing::info;

/// Anything that can report a single boolean sensor state
pub trait BinarySensor {
    fn state(&self) -> bool;
}

/// Receiver of published motion state
pub trait StateSink: Send {
    fn publish(&mut self, state: bool);
}

impl<F> StateSink for F
where
    F: FnMut(bool) + Send,
{
    fn publish(&mut self, state: bool) {
        self(state)
    }
}

/// Sink that only logs state changes
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StateSink for LogSink {
    fn publish(&mut self, state: bool) {
        info!(sensor = %self.name, motion = state, "Publishing state");
    }
}

/// Forwards a state to its sink only when it differs from the last one sent
///
/// The first state offered is always forwarded.
pub struct EdgePublisher {
    sink: Box<dyn StateSink>,
    last: Option<bool>,
    published: u64,
}

impl EdgePublisher {
    pub fn new(sink: Box<dyn StateSink>) -> Self {
        Self {
            sink,
            last: None,
            published: 0,
        }
    }

    /// Offer a state; returns true when it was forwarded
    pub fn offer(&mut self, state: bool) -> bool {
        if self.last == Some(state) {
            return false;
        }
        self.last = Some(state);
        self.published += 1;
        self.sink.publish(state);
        true
    }

    pub fn last_published(&self) -> Option<bool> {
        self.last
    }

    /// Number of states forwarded so far
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Forget the last published state so the next offer is forwarded
    pub fn reset(&mut self) {
        self.last = None;
    }
}
