use std::{cell::Cell, rc::Rc};

use serde::{Deserialize, Serialize};

/// How many frame requests may be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Issue every request as soon as the sequence is constructed.
    #[default]
    Eager,
    /// Keep at most this many requests in flight.
    Bounded(usize),
}

/// Shared flag that stops a [`FrameQueue`] from issuing further requests.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Hands out frame indices to request, in order, respecting a
/// [`LoadStrategy`].
#[derive(Debug)]
pub struct FrameQueue {
    next: usize,
    total: usize,
    in_flight: usize,
    limit: Option<usize>,
    token: CancellationToken,
}

impl FrameQueue {
    pub fn new(total: usize, strategy: LoadStrategy) -> Self {
        let limit = match strategy {
            LoadStrategy::Eager => None,
            LoadStrategy::Bounded(limit) => Some(limit.max(1)),
        };
        Self {
            next: 0,
            total,
            in_flight: 0,
            limit,
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Indices that may be requested now. Empty once cancelled or drained.
    pub fn next_batch(&mut self) -> Vec<usize> {
        if self.is_cancelled() {
            return Vec::new();
        }

        let available = match self.limit {
            Some(limit) => limit.saturating_sub(self.in_flight),
            None => usize::MAX,
        };
        let end = self.next.saturating_add(available).min(self.total);
        let batch: Vec<usize> = (self.next..end).collect();
        self.in_flight += batch.len();
        self.next = end;
        batch
    }

    /// Marks one in-flight request as finished.
    pub fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Frames not yet handed out.
    pub fn remaining(&self) -> usize {
        self.total - self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eager_queue_releases_everything_at_once() {
        let mut queue = FrameQueue::new(5, LoadStrategy::Eager);
        assert_eq!(queue.next_batch(), vec![0, 1, 2, 3, 4]);
        assert!(queue.next_batch().is_empty());
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn bounded_queue_refills_as_requests_settle() {
        let mut queue = FrameQueue::new(5, LoadStrategy::Bounded(2));
        assert_eq!(queue.next_batch(), vec![0, 1]);
        assert!(queue.next_batch().is_empty());

        queue.settle();
        assert_eq!(queue.next_batch(), vec![2]);
        queue.settle();
        queue.settle();
        assert_eq!(queue.next_batch(), vec![3, 4]);
        assert_eq!(queue.in_flight(), 2);
    }

    #[test]
    fn cancellation_stops_new_requests() {
        let mut queue = FrameQueue::new(4, LoadStrategy::Bounded(1));
        let token = queue.token();
        assert_eq!(queue.next_batch(), vec![0]);

        token.cancel();
        queue.settle();
        assert!(queue.next_batch().is_empty());
        assert_eq!(queue.remaining(), 3);
    }

    #[test]
    fn zero_limit_still_makes_progress() {
        let mut queue = FrameQueue::new(2, LoadStrategy::Bounded(0));
        assert_eq!(queue.next_batch(), vec![0]);
    }
}
