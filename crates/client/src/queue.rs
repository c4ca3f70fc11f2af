//! Sends waiting for the connection to open.

use std::collections::VecDeque;

use keyhub_wire::{Request, RequestId};

/// A request that has an id but has not been written to the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedSend {
    /// Id assigned at submission.
    pub id: RequestId,
    /// What to send.
    pub request: Request,
}

/// FIFO buffer of deferred sends.
#[derive(Debug)]
pub struct PendingQueue<T = QueuedSend> {
    items: VecDeque<T>,
}

impl<T> PendingQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Appends `item` to the tail.
    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Hands every queued item to `f`, oldest first, leaving the queue empty.
    pub fn flush(&mut self, mut f: impl FnMut(T)) {
        for item in std::mem::take(&mut self.items) {
            f(item);
        }
    }

    /// Drops everything queued.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_preserves_order_and_empties() {
        let mut queue = PendingQueue::new();
        for n in 1..=5 {
            queue.enqueue(n);
        }

        let mut flushed = Vec::new();
        queue.flush(|n| flushed.push(n));

        assert_eq!(flushed, vec![1, 2, 3, 4, 5]);
        assert!(queue.is_empty());

        queue.flush(|n| flushed.push(n));
        assert_eq!(flushed.len(), 5);
    }

    #[test]
    fn test_clear_discards_items() {
        let mut queue = PendingQueue::new();
        queue.enqueue(QueuedSend {
            id: RequestId::new(1),
            request: Request::new("LIST"),
        });
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }
}
