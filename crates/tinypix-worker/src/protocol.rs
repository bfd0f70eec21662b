//! Worker message protocol with terminal-state enforcement.
//!
//! One inbound request produces zero or more progress notifications
//! followed by exactly one terminal message. [`Exchange`] tracks the
//! handshake explicitly: once a terminal message has been emitted,
//! every further emission attempt is ignored instead of relying on
//! call-site convention.

use tinypix_pipeline::EncodedImage;

/// Outbound worker message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Intermediate pipeline milestone.
    Progress(u8),
    /// Terminal success payload.
    Success(EncodedImage),
    /// Terminal failure message.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Terminated,
}

/// One request/response exchange over a message sink.
pub struct Exchange<F: FnMut(Outbound)> {
    sink: F,
    state: State,
}

impl<F: FnMut(Outbound)> Exchange<F> {
    /// Start an exchange that emits through `sink`.
    pub fn new(sink: F) -> Self {
        Self {
            sink,
            state: State::Active,
        }
    }

    /// Emit a progress notification. Ignored after a terminal message.
    pub fn progress(&mut self, value: u8) {
        if self.state == State::Active {
            (self.sink)(Outbound::Progress(value));
        }
    }

    /// Emit the terminal success message. Only the first terminal
    /// emission wins; later calls are ignored.
    pub fn succeed(&mut self, result: EncodedImage) {
        self.terminate(Outbound::Success(result));
    }

    /// Emit the terminal error message. Only the first terminal
    /// emission wins; later calls are ignored.
    pub fn fail(&mut self, message: String) {
        self.terminate(Outbound::Error(message));
    }

    /// Whether a terminal message has been emitted.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == State::Terminated
    }

    fn terminate(&mut self, message: Outbound) {
        if self.state == State::Active {
            self.state = State::Terminated;
            (self.sink)(message);
        }
    }
}
