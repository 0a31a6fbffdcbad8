//! Array-backed binary min-heap for multi-way merging.
//!
//! The candidate aggregator merges one sorted cursor per LSH table; the heap
//! never grows past the number of active tables, so operations stay
//! O(log n_tables) regardless of bucket sizes.

/// A binary min-heap over `T` with explicit sift operations.
///
/// `pop_min` removes the smallest element; `replace_min` swaps the root and
/// restores the invariant with a single sift-down, which is the common case
/// when a merge cursor advances.
#[derive(Debug)]
pub struct MinHeap<T: Ord> {
    items: Vec<T>,
}

impl<T: Ord> MinHeap<T> {
    pub fn with_capacity(cap: usize) -> Self {
        MinHeap {
            items: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub fn pop_min(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let min = self.items.pop();
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Replace the minimum with `item` and return the old minimum.
    ///
    /// Panics if the heap is empty.
    pub fn replace_min(&mut self, item: T) -> T {
        let old = std::mem::replace(&mut self.items[0], item);
        self.sift_down(0);
        old
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.items[i] < self.items[parent] {
                self.items.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.items.len();
        loop {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut min = i;
            if l < n && self.items[l] < self.items[min] {
                min = l;
            }
            if r < n && self.items[r] < self.items[min] {
                min = r;
            }
            if min == i {
                break;
            }
            self.items.swap(i, min);
            i = min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_push_pop_sorted() {
        let mut heap = MinHeap::with_capacity(8);
        for v in [5u64, 1, 9, 3, 7, 2] {
            heap.push(v);
        }
        let mut out = Vec::new();
        while let Some(v) = heap.pop_min() {
            out.push(v);
        }
        assert_eq!(out, vec![1, 2, 3, 5, 7, 9]);
    }

    #[test]
    fn test_empty_pop() {
        let mut heap: MinHeap<u32> = MinHeap::with_capacity(0);
        assert!(heap.pop_min().is_none());
        assert!(heap.is_empty());
    }

    #[test]
    fn test_replace_min() {
        let mut heap = MinHeap::with_capacity(4);
        heap.push(2u32);
        heap.push(5);
        heap.push(8);
        assert_eq!(heap.replace_min(6), 2);
        assert_eq!(heap.pop_min(), Some(5));
        assert_eq!(heap.pop_min(), Some(6));
        assert_eq!(heap.pop_min(), Some(8));
    }

    #[test]
    fn test_random_matches_sort() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let n = rng.gen_range(0..100);
            let values: Vec<u64> = (0..n).map(|_| rng.gen_range(0..1000)).collect();
            let mut heap = MinHeap::with_capacity(n);
            for &v in &values {
                heap.push(v);
            }
            let mut drained = Vec::new();
            while let Some(v) = heap.pop_min() {
                drained.push(v);
            }
            let mut sorted = values.clone();
            sorted.sort_unstable();
            assert_eq!(drained, sorted);
        }
    }
}
