//! Expiry Index Module
//!
//! Vector-backed binary min-heap of `(key, expires_at)` pairs, used by the
//! sweeper to find the next entry to expire.
//!
//! Every mutating operation takes a `reposition` callback that is invoked as
//! `reposition(key, new_index)` for each item whose slot changed, including a
//! freshly pushed item at its final slot. Items that leave the heap are never
//! reported. Callers that cache positions (the store keeps one per entry) stay
//! valid for [`ExpiryHeap::remove_at`] as long as they apply every callback.

/// One scheduled expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapItem {
    pub key: String,
    /// Absolute expiration time, Unix milliseconds
    pub expires_at: u64,
}

// == Expiry Heap ==
/// Min-heap ordered by `expires_at`.
///
/// - push / pop / remove_at: O(log n)
/// - peek: O(1)
#[derive(Debug, Default)]
pub struct ExpiryHeap {
    items: Vec<HeapItem>,
}

impl ExpiryHeap {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Adds an item and returns its index once the heap property is restored.
    pub fn push<F>(&mut self, key: String, expires_at: u64, mut reposition: F) -> usize
    where
        F: FnMut(&str, usize),
    {
        self.items.push(HeapItem { key, expires_at });
        let idx = self.items.len() - 1;
        let (idx, _) = self.sift_up(idx, &mut reposition);
        reposition(&self.items[idx].key, idx);
        idx
    }

    // == Peek ==
    /// Returns the earliest item without removing it.
    pub fn peek(&self) -> Option<&HeapItem> {
        self.items.first()
    }

    // == Pop ==
    /// Removes and returns the earliest item.
    pub fn pop<F>(&mut self, reposition: F) -> Option<HeapItem>
    where
        F: FnMut(&str, usize),
    {
        self.remove_at(0, reposition)
    }

    // == Remove At ==
    /// Removes the item at `index`, if there is one.
    ///
    /// The last item is moved into the hole and sifted down, or up when
    /// sifting down did not move it.
    pub fn remove_at<F>(&mut self, index: usize, mut reposition: F) -> Option<HeapItem>
    where
        F: FnMut(&str, usize),
    {
        if index >= self.items.len() {
            return None;
        }
        let last = self.items.len() - 1;
        if index == last {
            return self.items.pop();
        }
        let removed = self.items.swap_remove(index);
        let (idx, moved) = self.sift_down(index, &mut reposition);
        let idx = if moved {
            idx
        } else {
            self.sift_up(index, &mut reposition).0
        };
        reposition(&self.items[idx].key, idx);
        Some(removed)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.items.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at a given slot.
    pub fn get(&self, index: usize) -> Option<&HeapItem> {
        self.items.get(index)
    }

    /// Moves the item at `idx` towards the root. Items it displaces are
    /// reported; the moving item itself is left for the caller to report.
    fn sift_up<F>(&mut self, mut idx: usize, reposition: &mut F) -> (usize, bool)
    where
        F: FnMut(&str, usize),
    {
        let mut moved = false;
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.items[parent].expires_at <= self.items[idx].expires_at {
                break;
            }
            self.items.swap(parent, idx);
            reposition(&self.items[idx].key, idx);
            idx = parent;
            moved = true;
        }
        (idx, moved)
    }

    /// Moves the item at `idx` towards the leaves. Same reporting rule as
    /// `sift_up`.
    fn sift_down<F>(&mut self, mut idx: usize, reposition: &mut F) -> (usize, bool)
    where
        F: FnMut(&str, usize),
    {
        let len = self.items.len();
        let mut moved = false;
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.items[left].expires_at < self.items[smallest].expires_at {
                smallest = left;
            }
            if right < len && self.items[right].expires_at < self.items[smallest].expires_at {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.items.swap(idx, smallest);
            reposition(&self.items[idx].key, idx);
            idx = smallest;
            moved = true;
        }
        (idx, moved)
    }

    /// Asserts the heap property over every parent/child pair.
    #[cfg(test)]
    pub(crate) fn check_heap_property(&self) {
        for idx in 1..self.items.len() {
            let parent = (idx - 1) / 2;
            assert!(
                self.items[parent].expires_at <= self.items[idx].expires_at,
                "heap property violated between slots {parent} and {idx}"
            );
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Heap plus the position table a caller would maintain.
    #[derive(Default)]
    struct Tracked {
        heap: ExpiryHeap,
        positions: HashMap<String, usize>,
    }

    impl Tracked {
        fn push(&mut self, key: &str, at: u64) -> usize {
            let positions = &mut self.positions;
            self.heap.push(key.to_string(), at, |k, i| {
                positions.insert(k.to_string(), i);
            })
        }

        fn remove(&mut self, key: &str) -> Option<HeapItem> {
            let pos = self.positions.remove(key)?;
            let positions = &mut self.positions;
            self.heap.remove_at(pos, |k, i| {
                positions.insert(k.to_string(), i);
            })
        }

        fn pop(&mut self) -> Option<HeapItem> {
            let positions = &mut self.positions;
            let item = self.heap.pop(|k, i| {
                positions.insert(k.to_string(), i);
            })?;
            self.positions.remove(&item.key);
            Some(item)
        }

        fn check(&self) {
            self.heap.check_heap_property();
            assert_eq!(self.positions.len(), self.heap.len());
            for (key, &pos) in &self.positions {
                assert_eq!(
                    self.heap.get(pos).map(|item| item.key.as_str()),
                    Some(key.as_str()),
                    "stale position for {key}"
                );
            }
        }
    }

    #[test]
    fn test_heap_new() {
        let heap = ExpiryHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
    }

    #[test]
    fn test_push_returns_final_index() {
        let mut heap = ExpiryHeap::new();
        assert_eq!(heap.push("a".to_string(), 30, |_, _| {}), 0);
        assert_eq!(heap.push("b".to_string(), 20, |_, _| {}), 0);
        assert_eq!(heap.push("c".to_string(), 40, |_, _| {}), 2);
        assert_eq!(heap.peek().map(|i| i.key.as_str()), Some("b"));
    }

    #[test]
    fn test_pop_in_expiry_order() {
        let mut t = Tracked::default();
        for (key, at) in [("e", 50), ("a", 10), ("d", 40), ("b", 20), ("c", 30)] {
            t.push(key, at);
            t.check();
        }

        let order: Vec<u64> = std::iter::from_fn(|| t.pop().map(|i| i.expires_at)).collect();
        assert_eq!(order, vec![10, 20, 30, 40, 50]);
        assert!(t.heap.is_empty());
    }

    #[test]
    fn test_remove_last_slot_truncates() {
        let mut t = Tracked::default();
        t.push("a", 10);
        t.push("b", 20);

        let removed = t.remove("b").unwrap();
        assert_eq!(removed.key, "b");
        assert_eq!(t.heap.len(), 1);
        t.check();
    }

    #[test]
    fn test_remove_interior_sifts_down() {
        let mut t = Tracked::default();
        for (key, at) in [("a", 10), ("b", 20), ("c", 30), ("d", 25), ("e", 26), ("f", 35), ("g", 99)] {
            t.push(key, at);
        }

        let removed = t.remove("b").unwrap();
        assert_eq!(removed.expires_at, 20);
        t.check();
    }

    #[test]
    fn test_remove_interior_sifts_up() {
        // Pushed in level order, so no swaps happen while building. The last
        // item "i" (15) comes from the left subtree and lands under "c" (20)
        // when "f" is removed, so it has to climb.
        let mut t = Tracked::default();
        for (key, at) in [("a", 10), ("b", 11), ("c", 20), ("d", 12), ("e", 13), ("f", 25), ("g", 30), ("h", 14), ("i", 15)] {
            t.push(key, at);
        }
        assert_eq!(t.positions["i"], 8);

        t.remove("f").unwrap();
        t.check();
        assert_eq!(t.positions["i"], 2);
        assert_eq!(t.positions["c"], 5);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut heap = ExpiryHeap::new();
        heap.push("a".to_string(), 1, |_, _| {});
        assert_eq!(heap.remove_at(5, |_, _| {}), None);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_positions_survive_mixed_operations() {
        let mut t = Tracked::default();
        let times = [17u64, 3, 99, 42, 8, 8, 56, 1, 73, 21, 64, 5, 30];
        for (n, at) in times.iter().enumerate() {
            t.push(&format!("k{n}"), *at);
        }
        t.check();

        for key in ["k3", "k0", "k11", "k7", "k12"] {
            assert!(t.remove(key).is_some());
            t.check();
        }
        t.pop();
        t.check();
        t.push("late", 2);
        t.check();
        assert_eq!(t.heap.peek().map(|i| i.key.as_str()), Some("late"));
    }

    #[test]
    fn test_clear() {
        let mut heap = ExpiryHeap::new();
        heap.push("a".to_string(), 1, |_, _| {});
        heap.clear();
        assert!(heap.is_empty());
    }
}
