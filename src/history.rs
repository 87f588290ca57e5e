//! History reduction - the bounded recency window behind every judgment

use crate::transcript::Transcript;

/// Produces bounded views of a transcript.
///
/// Every selection and termination decision, and every agent prompt, sees at
/// most `limit` of the most recent turns. The canonical transcript is left
/// untouched; reduction trades long-term memory for bounded prompt cost.
#[derive(Debug, Clone, Copy)]
pub struct HistoryReducer {
    limit: usize,
}

impl HistoryReducer {
    /// Create a reducer retaining at most `limit` turns.
    ///
    /// A limit below 1 is treated as 1: the newest turn is never dropped.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The suffix of `transcript` with at most `limit` turns, in original
    /// order. Idempotent for a fixed limit.
    pub fn reduce(&self, transcript: &Transcript) -> Transcript {
        let turns = transcript.turns();
        let start = turns.len().saturating_sub(self.limit);
        Transcript::from_turns(turns[start..].to_vec())
    }
}
