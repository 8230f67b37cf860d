use std::ops::Range;

/// Half-open range of layout-table indices that are materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualWindow {
    pub start: usize,
    pub end: usize,
}

impl VirtualWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}
