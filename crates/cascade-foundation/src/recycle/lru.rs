//! Bounded insertion-recency cache.
//!
//! A classic LRU built as an arena of nodes addressed by stable integer
//! indices: the doubly linked recency list lives inside a `Vec`, and the hash
//! index stores arena slots instead of pointers, so there are no ownership
//! cycles or weak back-references to manage.

use cascade_core::collections::map::HashMap;
use cascade_core::ElementId;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<V> {
    key: ElementId,
    value: V,
    prev: usize,
    next: usize,
}

/// Bounded cache with strict least-recently-used eviction.
///
/// `get` refreshes recency; `insert` evicts the coldest entry once the
/// configured capacity is exceeded. Both are O(1) amortized.
#[derive(Debug)]
pub struct LruCache<V> {
    capacity: usize,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    index: HashMap<ElementId, usize>,
    /// Least recently used entry.
    head: usize,
    /// Most recently used entry.
    tail: usize,
}

impl<V> LruCache<V> {
    /// Creates a cache holding at most `capacity` entries (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::default(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: ElementId) -> bool {
        self.index.contains_key(&key)
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: ElementId) -> Option<&mut V> {
        let slot = *self.index.get(&key)?;
        self.detach(slot);
        self.push_tail(slot);
        self.slots[slot].as_mut().map(|n| &mut n.value)
    }

    /// Inserts `value` at the warm end. Returns the evicted entry when the
    /// cache was full, or the previous value when `key` was already present.
    pub fn insert(&mut self, key: ElementId, value: V) -> Option<(ElementId, V)> {
        if let Some(&slot) = self.index.get(&key) {
            let node = self.slots[slot].as_mut().expect("indexed slot occupied");
            let old = std::mem::replace(&mut node.value, value);
            self.detach(slot);
            self.push_tail(slot);
            return Some((key, old));
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(Node {
                    key,
                    value,
                    prev: NIL,
                    next: NIL,
                });
                slot
            }
            None => {
                self.slots.push(Some(Node {
                    key,
                    value,
                    prev: NIL,
                    next: NIL,
                }));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_tail(slot);

        if self.index.len() > self.capacity {
            self.evict_coldest()
        } else {
            None
        }
    }

    /// Removes `key` without touching recency of other entries.
    pub fn remove(&mut self, key: ElementId) -> Option<V> {
        let slot = self.index.remove(&key)?;
        self.detach(slot);
        let node = self.slots[slot].take().expect("indexed slot occupied");
        self.free.push(slot);
        Some(node.value)
    }

    /// Removes every entry failing the predicate, coldest first.
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId, &V) -> bool) {
        let mut cursor = self.head;
        while cursor != NIL {
            let node = self.slots[cursor].as_ref().expect("linked slot occupied");
            let next = node.next;
            if !keep(node.key, &node.value) {
                let key = node.key;
                self.remove(key);
            }
            cursor = next;
        }
    }

    /// Keys from coldest to warmest.
    pub fn keys(&self) -> impl Iterator<Item = ElementId> + '_ {
        LruIter {
            cache: self,
            cursor: self.head,
        }
    }

    fn evict_coldest(&mut self) -> Option<(ElementId, V)> {
        if self.head == NIL {
            return None;
        }
        let slot = self.head;
        self.detach(slot);
        let node = self.slots[slot].take().expect("head slot occupied");
        self.index.remove(&node.key);
        self.free.push(slot);
        Some((node.key, node.value))
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.slots[slot].as_ref().expect("detached slot occupied");
            (node.prev, node.next)
        };
        if prev != NIL {
            self.slots[prev].as_mut().expect("prev occupied").next = next;
        } else if self.head == slot {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].as_mut().expect("next occupied").prev = prev;
        } else if self.tail == slot {
            self.tail = prev;
        }
        let node = self.slots[slot].as_mut().expect("detached slot occupied");
        node.prev = NIL;
        node.next = NIL;
    }

    fn push_tail(&mut self, slot: usize) {
        let old_tail = self.tail;
        {
            let node = self.slots[slot].as_mut().expect("pushed slot occupied");
            node.prev = old_tail;
            node.next = NIL;
        }
        if old_tail != NIL {
            self.slots[old_tail].as_mut().expect("tail occupied").next = slot;
        } else {
            self.head = slot;
        }
        self.tail = slot;
    }
}

struct LruIter<'a, V> {
    cache: &'a LruCache<V>,
    cursor: usize,
}

impl<V> Iterator for LruIter<'_, V> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.cache.slots[self.cursor]
            .as_ref()
            .expect("linked slot occupied");
        self.cursor = node.next;
        Some(node.key)
    }
}
