//! A fixed-capacity FIFO buffer that evicts its oldest entry when full.
//!
//! [`RingBuffer::push`] never fails: once the buffer holds `capacity` items,
//! the oldest one is removed and handed back to the caller. The buffer also
//! counts every eviction so producers can report how much data was shed while
//! nobody was draining.
//!
//! # Complexity
//! - `push`, `pop`, `len`, `is_full` are **O(1)**; `drain_all` and `take` are
//!   linear in the number of items returned.

use std::collections::VecDeque;

/// A bounded first-in-first-out buffer with overwrite-on-full.
///
/// # Examples
///
/// ```rust
/// use gasoline_common::collections::RingBuffer;
///
/// let mut buffer = RingBuffer::new(3);
/// buffer.push(1);
/// buffer.push(2);
/// buffer.push(3);
/// assert_eq!(buffer.push(4), Some(1)); // the oldest item is evicted
///
/// assert_eq!(buffer.drain_all(), vec![2, 3, 4]);
/// assert_eq!(buffer.evicted(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
    evicted: u64,
}

impl<T> RingBuffer<T> {
    /// Creates a new buffer. A capacity of zero is clamped to `1`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: VecDeque::with_capacity(capacity.min(1024)), capacity, evicted: 0 }
    }

    /// Appends an item, returning the evicted oldest item when the buffer was
    /// full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.evicted += 1;
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(item);
        evicted
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    /// Removes every item, oldest first.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.buf.drain(..).collect()
    }

    /// Removes up to `max` of the oldest items.
    pub fn take(&mut self, max: usize) -> Vec<T> {
        let n = max.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of items evicted since creation.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            let _ = self.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    /// Validates overwrite-on-full returns the evicted item and counts it.
    #[test]
    fn push_evicts_oldest_when_full() {
        let mut buffer = RingBuffer::new(2);
        assert_eq!(buffer.push("a"), None);
        assert_eq!(buffer.push("b"), None);
        assert_eq!(buffer.push("c"), Some("a"));
        assert_eq!(buffer.push("d"), Some("b"));

        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec!["c", "d"]);
        assert_eq!(buffer.evicted(), 2);
    }

    #[test]
    fn drain_all_empties_but_keeps_eviction_count() {
        let mut buffer = RingBuffer::new(3);
        buffer.extend(0..5);

        assert_eq!(buffer.drain_all(), vec![2, 3, 4]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.evicted(), 2);
        assert_eq!(buffer.capacity(), 3);
    }

    /// Validates `take` removes only the oldest `max` items.
    #[test]
    fn take_is_bounded() {
        let mut buffer = RingBuffer::new(10);
        buffer.extend(1..=4);

        assert_eq!(buffer.take(3), vec![1, 2, 3]);
        assert_eq!(buffer.take(3), vec![4]);
        assert!(buffer.take(3).is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut buffer = RingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.push(42);
        buffer.push(43);

        assert!(buffer.is_full());
        assert_eq!(buffer.pop(), Some(43));
        assert_eq!(buffer.pop(), None);
    }
}
