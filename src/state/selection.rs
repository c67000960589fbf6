//! Rule selection
//!
//! An ascending, duplicate-free set of indices into the store's rule list.
//! The selection never sees the rules themselves: `ProjectStore` tells it
//! about every insertion and removal so the indices keep pointing at the
//! same rules.

/// Selected rule indices, kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `index`, returning its position within the selection.
    ///
    /// Returns `None` when it was already selected.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        match self.indices.binary_search(&index) {
            Ok(_) => None,
            Err(position) => {
                self.indices.insert(position, index);
                Some(position)
            }
        }
    }

    /// Select every index in `start..=end`.
    pub fn select_span(&mut self, start: usize, end: usize) {
        for index in start..=end {
            self.select(index);
        }
    }

    /// Remove `index`. Returns `true` if it was selected.
    pub fn deselect(&mut self, index: usize) -> bool {
        match self.indices.binary_search(&index) {
            Ok(position) => {
                self.indices.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Toggle `index`, returning whether it is now selected.
    pub fn flip(&mut self, index: usize) -> bool {
        if self.deselect(index) {
            false
        } else {
            self.select(index);
            true
        }
    }

    /// Select `0..count`.
    pub fn select_all(&mut self, count: usize) {
        self.indices = (0..count).collect();
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// True when the indices are consecutive. An empty selection counts.
    pub fn is_continuous(&self) -> bool {
        self.indices.windows(2).all(|pair| pair[0] + 1 == pair[1])
    }

    /// A rule was inserted at `index`; shift everything at or after it up.
    pub(crate) fn rule_added(&mut self, index: usize) {
        for selected in &mut self.indices {
            if *selected >= index {
                *selected += 1;
            }
        }
    }

    /// The rule at `index` was removed; drop it and shift later ones down.
    pub(crate) fn rule_removed(&mut self, index: usize) {
        self.deselect(index);
        for selected in &mut self.indices {
            if *selected > index {
                *selected -= 1;
            }
        }
    }
}
