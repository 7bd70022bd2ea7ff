//! Recency List Module
//!
//! Implements the doubly linked recency order used for LRU eviction.

// == Node ==
#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Doubly linked list stored in a slab of nodes.
///
/// Links are slot indices rather than pointers, so the list owns each
/// value's position and nothing else holds a reference into it:
/// - Head = most recently used
/// - Tail = least recently used
///
/// Every operation addressed by slot is O(1). Slots of removed nodes are
/// recycled through a free list.
#[derive(Debug, Clone)]
pub struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Inserts a value at the head and returns its slot.
    pub fn push_front(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: self.head,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        if let Some(old_head) = self.head {
            if let Some(node) = self.slots[old_head].as_mut() {
                node.prev = Some(slot);
            }
        } else {
            self.tail = Some(slot);
        }
        self.head = Some(slot);
        self.len += 1;
        slot
    }

    // == Remove ==
    /// Unlinks the node at `slot` and returns its value.
    ///
    /// Returns None if the slot is vacant.
    pub fn remove(&mut self, slot: usize) -> Option<T> {
        self.unlink(slot)?;
        let node = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.value)
    }

    // == Move To Front ==
    /// Marks the node at `slot` as most recently used.
    ///
    /// Returns false if the slot is vacant.
    pub fn move_to_front(&mut self, slot: usize) -> bool {
        if self.head == Some(slot) {
            return self.get(slot).is_some();
        }
        if self.unlink(slot).is_none() {
            return false;
        }

        let old_head = self.head;
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.slots[h].as_mut() {
                    node.prev = Some(slot);
                }
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        true
    }

    // == Pop Back ==
    /// Removes and returns the least recently used value.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Access ==
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.as_ref().map(|node| &node.value)
    }

    // == Length ==
    /// Returns the number of linked values.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iteration ==
    /// Iterates from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            forward: true,
        }
    }

    /// Iterates from least to most recently used.
    pub fn iter_lru(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.tail,
            forward: false,
        }
    }

    /// Detaches `slot` from its neighbours without freeing it.
    fn unlink(&mut self, slot: usize) -> Option<()> {
        let (prev, next) = {
            let node = self.slots.get(slot)?.as_ref()?;
            (node.prev, node.next)
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
        Some(())
    }
}

// == Iterator ==
/// Borrowing iterator over a [`RecencyList`].
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
    forward: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.slots.get(slot)?.as_ref()?;
        self.cursor = if self.forward { node.next } else { node.prev };
        Some(&node.value)
    }
}
