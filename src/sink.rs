//! Destinations for human-readable rate and progress messages

/// Receives rate and progress messages. Delivery failures are not engine errors,
/// so nothing is returned.
pub trait RateMessageSink {
    fn display(&mut self, message: String);
}

impl<F: FnMut(String)> RateMessageSink for F {
    fn display(&mut self, message: String) {
        self(message)
    }
}

/// Forwards messages to the log at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl RateMessageSink for LogSink {
    fn display(&mut self, message: String) {
        log::debug!("{}", message);
    }
}

/// Discards messages
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RateMessageSink for NullSink {
    fn display(&mut self, _message: String) {}
}

/// Keeps every message in arrival order
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    pub messages: Vec<String>,
}

impl RateMessageSink for CollectSink {
    fn display(&mut self, message: String) {
        self.messages.push(message);
    }
}
