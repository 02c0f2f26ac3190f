use std::collections::HashMap;
use std::hash::Hash;

/// Min-heap over `element` keyed by a caller-supplied score.
///
/// The score travels with the element so that a search can change a node's
/// cost outside the heap and then call [`BinaryHeap::rescore_element`].
/// `positions` mirrors every slot of `content`, which keeps the rescore
/// lookup constant-time.
#[derive(Debug, Clone)]
pub struct BinaryHeap<T> {
    content: Vec<HeapEntry<T>>,
    positions: HashMap<T, usize>,
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry<T> {
    element: T,
    score: f64,
}

impl<T> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> BinaryHeap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            content: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, element: T, score: f64) {
        debug_assert!(
            !self.positions.contains_key(&element),
            "element pushed twice without being popped"
        );
        let index = self.content.len();
        self.content.push(HeapEntry { element, score });
        self.positions.insert(element, index);
        self.sink_down(index);
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.content.is_empty() {
            return None;
        }
        let last = self.content.len() - 1;
        self.swap(0, last);
        let entry = self.content.pop()?;
        self.positions.remove(&entry.element);
        if !self.content.is_empty() {
            self.bubble_up(0);
        }
        Some(entry.element)
    }

    pub fn peek(&self) -> Option<T> {
        self.content.first().map(|entry| entry.element)
    }

    /// Re-sifts an already queued element after its score changed.
    /// Returns `false` when the element is not in the heap.
    pub fn rescore_element(&mut self, element: T, score: f64) -> bool {
        let Some(&index) = self.positions.get(&element) else {
            return false;
        };
        let previous = self.content[index].score;
        self.content[index].score = score;
        if score < previous {
            self.sink_down(index);
        } else {
            self.bubble_up(index);
        }
        true
    }

    pub fn contains(&self, element: T) -> bool {
        self.positions.contains_key(&element)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.positions.clear();
    }

    fn sink_down(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.content[index].score < self.content[parent].score {
                self.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn bubble_up(&mut self, mut index: usize) {
        let length = self.content.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < length && self.content[left].score < self.content[smallest].score {
                smallest = left;
            }
            if right < length && self.content[right].score < self.content[smallest].score {
                smallest = right;
            }
            if smallest == index {
                return;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.content.swap(a, b);
        self.positions.insert(self.content[a].element, a);
        self.positions.insert(self.content[b].element, b);
    }
}
