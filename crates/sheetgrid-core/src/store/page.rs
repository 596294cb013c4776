//! Row pages inside one column bucket
//!
//! A column keeps its entries in a list of pages. Each page is a row-sorted
//! `Vec`, pages never overlap and are ordered by row, so a lookup is two
//! binary searches: one over page tails, one inside the page.

use crate::MAX_ROWS;

/// Maximum entries per page before it is split in two
pub(crate) const PAGE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Page<T> {
    entries: Vec<(u32, T)>,
}

impl<T> Page<T> {
    fn single(row: u32, value: T) -> Self {
        let mut entries = Vec::with_capacity(8);
        entries.push((row, value));
        Self { entries }
    }

    #[inline]
    fn first_row(&self) -> u32 {
        self.entries[0].0
    }

    #[inline]
    fn last_row(&self) -> u32 {
        self.entries[self.entries.len() - 1].0
    }

    #[inline]
    fn search(&self, row: u32) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&row, |e| e.0)
    }
}

/// All entries of one column
///
/// Invariant: no page is empty.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndex<T> {
    pub(crate) col: u16,
    pages: Vec<Page<T>>,
    len: usize,
}

impl<T> ColumnIndex<T> {
    pub(crate) fn new(col: u16) -> Self {
        Self {
            col,
            pages: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the first page whose last row is >= `row`
    #[inline]
    fn page_for(&self, row: u32) -> usize {
        self.pages.partition_point(|p| p.last_row() < row)
    }

    pub(crate) fn get(&self, row: u32) -> Option<&T> {
        let page = self.pages.get(self.page_for(row))?;
        let i = page.search(row).ok()?;
        Some(&page.entries[i].1)
    }

    pub(crate) fn get_mut(&mut self, row: u32) -> Option<&mut T> {
        let pi = self.page_for(row);
        let page = self.pages.get_mut(pi)?;
        let i = page.search(row).ok()?;
        Some(&mut page.entries[i].1)
    }

    /// Insert or overwrite; returns the previous value when overwriting
    pub(crate) fn insert(&mut self, row: u32, value: T) -> Option<T> {
        if self.pages.is_empty() {
            self.pages.push(Page::single(row, value));
            self.len += 1;
            return None;
        }

        // Past the last page: append to it
        let pi = self.page_for(row).min(self.pages.len() - 1);
        let page = &mut self.pages[pi];
        match page.search(row) {
            Ok(i) => Some(std::mem::replace(&mut page.entries[i].1, value)),
            Err(i) => {
                page.entries.insert(i, (row, value));
                self.len += 1;
                if page.entries.len() > PAGE_CAPACITY {
                    self.split(pi);
                }
                None
            }
        }
    }

    fn split(&mut self, pi: usize) {
        let page = &mut self.pages[pi];
        let tail = page.entries.split_off(page.entries.len() / 2);
        log::trace!(
            "column {}: splitting page {} at row {}",
            self.col,
            pi,
            tail[0].0
        );
        self.pages.insert(pi + 1, Page { entries: tail });
    }

    pub(crate) fn remove(&mut self, row: u32) -> Option<T> {
        let pi = self.page_for(row);
        let page = self.pages.get_mut(pi)?;
        let i = page.search(row).ok()?;
        let (_, value) = page.entries.remove(i);
        if page.entries.is_empty() {
            self.pages.remove(pi);
        }
        self.len -= 1;
        Some(value)
    }

    /// First entry with row >= `row`
    pub(crate) fn first_at_or_after(&self, row: u32) -> Option<(u32, &T)> {
        let page = self.pages.get(self.page_for(row))?;
        let i = page.entries.partition_point(|e| e.0 < row);
        page.entries.get(i).map(|(r, v)| (*r, v))
    }

    /// Last entry with row <= `row`
    pub(crate) fn last_at_or_before(&self, row: u32) -> Option<(u32, &T)> {
        let pi = self.pages.partition_point(|p| p.first_row() <= row);
        if pi == 0 {
            return None;
        }
        let page = &self.pages[pi - 1];
        let i = page.entries.partition_point(|e| e.0 <= row);
        page.entries.get(i.checked_sub(1)?).map(|(r, v)| (*r, v))
    }

    pub(crate) fn last_row(&self) -> Option<u32> {
        self.pages.last().map(Page::last_row)
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = (u32, &T)> + '_ {
        self.pages
            .iter()
            .flat_map(|p| p.entries.iter().map(|(r, v)| (*r, v)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> + '_ {
        self.pages
            .iter_mut()
            .flat_map(|p| p.entries.iter_mut().map(|(r, v)| (*r, v)))
    }

    /// Re-key every row >= `at` by `+count`; entries pushed past `MAX_ROWS`
    /// are dropped. Returns the number dropped.
    ///
    /// Adding the same offset to a sorted suffix keeps it sorted, so rows are
    /// moved in place and never collide.
    pub(crate) fn insert_rows(&mut self, at: u32, count: u32) -> usize {
        for page in self.pages.iter_mut().rev() {
            if page.last_row() < at {
                break;
            }
            let start = page.entries.partition_point(|e| e.0 < at);
            for entry in &mut page.entries[start..] {
                entry.0 += count;
            }
        }

        let mut dropped = 0;
        while let Some(page) = self.pages.last_mut() {
            if page.last_row() <= MAX_ROWS {
                break;
            }
            let keep = page.entries.partition_point(|e| e.0 <= MAX_ROWS);
            dropped += page.entries.len() - keep;
            page.entries.truncate(keep);
            if page.entries.is_empty() {
                self.pages.pop();
            } else {
                break;
            }
        }
        self.len -= dropped;
        dropped
    }

    /// Remove rows in `[at, at + count)` and re-key later rows by `-count`.
    /// Returns the number removed.
    pub(crate) fn delete_rows(&mut self, at: u32, count: u32) -> usize {
        let end = at.saturating_add(count);
        let removed = self.retain_rows(|row| row < at || row >= end);
        for page in self.pages.iter_mut() {
            if page.last_row() < end {
                continue;
            }
            let start = page.entries.partition_point(|e| e.0 < end);
            for entry in &mut page.entries[start..] {
                entry.0 -= count;
            }
        }
        removed
    }

    /// Remove rows in `[from, to]` without re-keying anything
    pub(crate) fn clear_rows(&mut self, from: u32, to: u32) -> usize {
        self.retain_rows(|row| row < from || row > to)
    }

    fn retain_rows<F: Fn(u32) -> bool>(&mut self, keep: F) -> usize {
        let before = self.len;
        for page in self.pages.iter_mut() {
            page.entries.retain(|e| keep(e.0));
        }
        self.pages.retain(|p| !p.entries.is_empty());
        self.len = self.pages.iter().map(|p| p.entries.len()).sum();
        self.coalesce();
        before - self.len
    }

    /// Merge neighbouring pages that together fit in one page
    fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.pages.len() {
            if self.pages[i].entries.len() + self.pages[i + 1].entries.len() <= PAGE_CAPACITY {
                let next = self.pages.remove(i + 1);
                self.pages[i].entries.extend(next.entries);
            } else {
                i += 1;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(rows: impl IntoIterator<Item = u32>) -> ColumnIndex<u32> {
        let mut index = ColumnIndex::new(1);
        for row in rows {
            index.insert(row, row);
        }
        index
    }

    #[test]
    fn test_pages_split_and_stay_ordered() {
        let index = filled((1..=1000).rev());
        assert_eq!(index.len(), 1000);
        assert!(index.page_count() > 1);

        let rows: Vec<u32> = index.iter().map(|(r, _)| r).collect();
        assert_eq!(rows, (1..=1000).collect::<Vec<_>>());
        assert_eq!(index.get(517), Some(&517));
    }

    #[test]
    fn test_neighbour_queries() {
        let index = filled([5, 10, 600, 900]);
        assert_eq!(index.first_at_or_after(6).map(|e| e.0), Some(10));
        assert_eq!(index.first_at_or_after(901), None);
        assert_eq!(index.last_at_or_before(599).map(|e| e.0), Some(10));
        assert_eq!(index.last_at_or_before(4), None);
        assert_eq!(index.last_row(), Some(900));
    }

    #[test]
    fn test_insert_rows_drops_overflow() {
        let mut index = filled([1, 5, MAX_ROWS - 1]);
        let dropped = index.insert_rows(3, 2);
        assert_eq!(dropped, 1);
        let rows: Vec<u32> = index.iter().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![1, 7]);
    }

    #[test]
    fn test_delete_rows_coalesces_pages() {
        let mut index = filled(1..=600);
        let pages_before = index.page_count();
        let removed = index.delete_rows(10, 500);
        assert_eq!(removed, 500);
        assert_eq!(index.len(), 100);
        assert!(index.page_count() < pages_before);
        assert_eq!(index.get(10), Some(&510));
        assert_eq!(index.get(100), Some(&600));
    }

    #[test]
    fn test_remove_drops_empty_page() {
        let mut index = filled([3]);
        assert_eq!(index.remove(3), Some(3));
        assert!(index.is_empty());
        assert_eq!(index.page_count(), 0);
        assert_eq!(index.remove(3), None);
    }
}
