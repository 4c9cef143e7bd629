//! Fixed-capacity evicting queue
//!
//! FIFO storage that silently drops the oldest element on overflow instead
//! of rejecting the new one. Writes are short critical sections on a
//! `parking_lot` mutex; the length is mirrored into an atomic counter so
//! readers never take the lock just to ask for a size. While offers are in
//! flight a reader may see a count that lags by an entry or two; these
//! queues hold human-facing diagnostics only.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity queue that evicts the oldest element on overflow
///
/// Iteration order (via [`snapshot`](Self::snapshot)) is insertion order,
/// oldest first.
#[derive(Debug)]
pub struct EvictingQueue<T> {
    items: Mutex<VecDeque<T>>,
    len: AtomicUsize,
    capacity: usize,
}

impl<T: Clone> EvictingQueue<T> {
    /// Create a queue holding at most `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            len: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Add an element, evicting the oldest one when full
    ///
    /// Always succeeds.
    pub fn offer(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        if items.len() > self.capacity {
            items.pop_front();
        }
        self.len.store(items.len(), Ordering::Relaxed);
    }

    /// Current element count, without taking the lock
    ///
    /// May transiently disagree with the queue while offers are in flight.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all elements and reset the counter
    pub fn clear(&self) {
        let mut items = self.items.lock();
        items.clear();
        self.len.store(0, Ordering::Relaxed);
    }

    /// Clone the current contents, oldest first
    ///
    /// Holds the lock only for the duration of the copy; concurrent writers
    /// are delayed, not excluded, so a snapshot taken mid-burst is simply
    /// the state at that instant.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_offer_below_capacity() {
        let queue = EvictingQueue::with_capacity(3);
        queue.offer(1);
        queue.offer(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_offer_evicts_oldest() {
        let queue = EvictingQueue::with_capacity(3);
        for i in 1..=5 {
            queue.offer(i);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.snapshot(), vec![3, 4, 5]);
    }

    #[test]
    fn test_clear_resets_counter() {
        let queue = EvictingQueue::with_capacity(3);
        queue.offer(1);
        queue.offer(2);
        queue.clear();
        assert_eq!(queue.len(), 0);
        assert!(queue.snapshot().is_empty());
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let queue = EvictingQueue::with_capacity(0);
        queue.offer(1);
        assert_eq!(queue.len(), 0);
        assert!(queue.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_offers_settle_at_capacity() {
        let queue = Arc::new(EvictingQueue::with_capacity(64));
        let mut handles = vec![];

        for t in 0..4 {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    queue.offer(t * 1000 + i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // With no offers in flight the count is exact again
        assert_eq!(queue.len(), 64);
        assert_eq!(queue.snapshot().len(), 64);
    }

    proptest! {
        // After any quiescent sequence of N offers into capacity C:
        // size == min(N, C) and contents are exactly the last C, oldest first.
        #[test]
        fn prop_capacity_bound(items in proptest::collection::vec(any::<u32>(), 0..200), capacity in 1usize..20) {
            let queue = EvictingQueue::with_capacity(capacity);
            for item in &items {
                queue.offer(*item);
            }
            prop_assert_eq!(queue.len(), items.len().min(capacity));

            let start = items.len().saturating_sub(capacity);
            prop_assert_eq!(queue.snapshot(), items[start..].to_vec());
        }
    }
}
