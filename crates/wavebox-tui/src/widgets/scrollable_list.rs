//! Generic scrollable list widget.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn set_selected(&mut self, idx: usize) {
        if idx < self.items.len() {
            self.selected = idx;
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Returns (index, &item) pairs visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        if height == 0 || self.items.is_empty() {
            return Vec::new();
        }
        let end = (self.scroll_offset + height).min(self.items.len());
        self.items[self.scroll_offset..end]
            .iter()
            .enumerate()
            .map(|(n, item)| (self.scroll_offset + n, item))
            .collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }

    /// Map a click at `row` within the rendered area to an item index.
    pub fn index_at(&self, row: usize) -> Option<usize> {
        let target = self.scroll_offset + row;
        (target < self.items.len()).then_some(target)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> ScrollableList<usize> {
        let mut l = ScrollableList::new();
        l.set_items((0..n).collect());
        l
    }

    #[test]
    fn selection_is_clamped() {
        let mut l = list(5);
        l.select_down(10);
        assert_eq!(l.selected, 4);
        l.select_up(10);
        assert_eq!(l.selected, 0);
    }

    #[test]
    fn ensure_visible_scrolls_both_ways() {
        let mut l = list(20);
        l.set_selected(15);
        l.ensure_visible(5);
        assert_eq!(l.scroll_offset, 11);
        l.set_selected(3);
        l.ensure_visible(5);
        assert_eq!(l.scroll_offset, 3);
    }

    #[test]
    fn index_at_respects_scroll() {
        let mut l = list(20);
        l.scroll_offset = 10;
        assert_eq!(l.index_at(2), Some(12));
        assert_eq!(l.index_at(15), None);
    }
}
