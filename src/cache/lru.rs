//! Recency Index Module
//!
//! Doubly linked list of keys ordered by last access, stored in an arena and
//! linked by slot index so that handles stay valid while nodes move.

// == Node Handle ==
/// Stable reference to a node in a [`RecencyList`].
///
/// A handle is valid from `insert_front` until the node is removed or popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Every operation is O(1). Freed slots are recycled through a free list.
#[derive(Debug, Default)]
pub struct RecencyList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl RecencyList {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert Front ==
    /// Adds a key as the most recently used and returns its handle.
    pub fn insert_front(&mut self, key: String) -> NodeHandle {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.attach_front(idx);
        self.len += 1;
        NodeHandle(idx)
    }

    // == Move To Front ==
    /// Marks a node as most recently used. No-op if it is already the head.
    pub fn move_to_front(&mut self, handle: NodeHandle) {
        if self.head == Some(handle.0) || !self.is_live(handle) {
            return;
        }
        self.detach(handle.0);
        self.attach_front(handle.0);
    }

    // == Remove ==
    /// Unlinks a node and frees its slot, returning its key.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<String> {
        if !self.is_live(handle) {
            return None;
        }
        self.detach(handle.0);
        let node = self.slots[handle.0].take()?;
        self.free.push(handle.0);
        self.len -= 1;
        Some(node.key)
    }

    // == Pop Tail ==
    /// Removes and returns the least recently used key.
    ///
    /// Only the list node is freed; the caller owns the rest of the entry.
    pub fn pop_tail(&mut self) -> Option<String> {
        let tail = self.tail?;
        self.remove(NodeHandle(tail))
    }

    // == Peek Tail ==
    /// Returns the least recently used key without removing it.
    pub fn peek_tail_key(&self) -> Option<&str> {
        let tail = self.tail?;
        self.slots[tail].as_ref().map(|node| node.key.as_str())
    }

    /// Returns the key behind a handle.
    pub fn key(&self, handle: NodeHandle) -> Option<&str> {
        self.slots
            .get(handle.0)
            .and_then(|slot| slot.as_ref())
            .map(|node| node.key.as_str())
    }

    // == Clear ==
    /// Drops every node. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates keys from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.slots[cursor?].as_ref()?;
            cursor = node.next;
            Some(node.key.as_str())
        })
    }

    fn is_live(&self, handle: NodeHandle) -> bool {
        matches!(self.slots.get(handle.0), Some(Some(_)))
    }

    /// Links an unlinked node in at the head.
    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(head) = self.slots[h].as_mut() {
                    head.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Re-links the neighbours around a node, then clears the node's own links.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    /// Walks the list both ways and checks links, length and slot usage.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let forward: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = self.head;
            let mut prev = None;
            while let Some(idx) = cursor {
                let node = self.slots[idx].as_ref().expect("linked slot is free");
                assert_eq!(node.prev, prev, "broken prev link at slot {idx}");
                out.push(idx);
                prev = Some(idx);
                cursor = node.next;
            }
            assert_eq!(self.tail, prev, "tail does not end the forward walk");
            out
        };
        assert_eq!(forward.len(), self.len, "length mismatch");
        assert_eq!(
            self.slots.iter().filter(|slot| slot.is_some()).count(),
            self.len,
            "live slots do not match length"
        );
    }
}
