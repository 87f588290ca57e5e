//! Turn streaming between a running session and its consumer

use tokio::sync::mpsc;

use crate::transcript::Turn;

/// Consumer side of a session's turn feed.
///
/// Yields each turn as the orchestrator appends it and ends when the
/// session reaches a terminal state. One stream per session; it cannot be
/// restarted - start a new session for a new request.
#[derive(Debug)]
pub struct TurnStream {
    rx: mpsc::UnboundedReceiver<Turn>,
}

impl TurnStream {
    /// Create a stream and its producer half
    pub(crate) fn new() -> (mpsc::UnboundedSender<Turn>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Receive the next turn. Returns `None` once the session has stopped
    /// and all turns have been consumed.
    pub async fn recv(&mut self) -> Option<Turn> {
        self.rx.recv().await
    }

    /// Non-blocking receive
    pub fn try_recv(&mut self) -> Option<Turn> {
        self.rx.try_recv().ok()
    }

    /// Drain the stream to the end
    pub async fn collect(mut self) -> Vec<Turn> {
        let mut turns = Vec::new();
        while let Some(turn) = self.recv().await {
            turns.push(turn);
        }
        turns
    }
}
