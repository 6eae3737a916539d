//! ARBOR - Continuation Queue
//! Follow-up invocations of bulk operations that could not finish in one
//! bounded batch. Each queued item is run later as an independent
//! invocation, never recursively inside the call that queued it.

use std::collections::VecDeque;

use crate::types::Key;

/// A deferred unit of bulk work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Resume deleting the subtree under `prefix`.
    DeleteAll { prefix: Key },
}

/// FIFO of pending continuations.
#[derive(Debug, Default)]
pub struct ContinuationQueue {
    pending: VecDeque<Continuation>,
}

impl ContinuationQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Queue a continuation unless an identical one is already waiting.
    /// Returns `true` if it was queued.
    pub fn push(&mut self, continuation: Continuation) -> bool {
        if self.pending.contains(&continuation) {
            return false;
        }
        self.pending.push_back(continuation);
        true
    }

    pub fn pop(&mut self) -> Option<Continuation> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
