//! Bounded selection of the K lowest-volume candidates.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::orientation::Candidate;

/// Heap entry ordered by volume, so the heap top is the worst kept candidate.
#[derive(Debug, Clone, Copy)]
struct ByVolume(Candidate);

impl PartialEq for ByVolume {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByVolume {}

impl PartialOrd for ByVolume {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByVolume {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.volume.total_cmp(&other.0.volume)
    }
}

/// Max-heap of fixed capacity holding the K best candidates seen so far.
#[derive(Debug, Clone)]
pub struct BestK {
    capacity: usize,
    heap: BinaryHeap<ByVolume>,
}

impl BestK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Highest volume still kept.
    pub fn worst(&self) -> Option<&Candidate> {
        self.heap.peek().map(|entry| &entry.0)
    }

    /// Offer a candidate. When full it replaces the worst only if strictly
    /// better. Returns whether it was kept.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(ByVolume(candidate));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if candidate.improves_on(&worst.0) => {
                *worst = ByVolume(candidate);
                true
            }
            _ => false,
        }
    }

    /// Remove and return the worst remaining candidate.
    pub fn pop_worst(&mut self) -> Option<Candidate> {
        self.heap.pop().map(|entry| entry.0)
    }

    /// Drain in heap-pop order, worst first.
    pub fn into_worst_first(self) -> impl Iterator<Item = Candidate> {
        let mut heap = self.heap;
        std::iter::from_fn(move || heap.pop().map(|entry| entry.0))
    }
}
