//! Cell comments (notes)
//!
//! Comments are kept in a plain list; a [`SparseStore<usize>`] maps each
//! commented cell to its position in that list, so the comments follow the
//! worksheet through row/column shifts like any other coordinate-indexed data.
//!
//! ## Example
//!
//! ```rust
//! use sheetgrid_core::{Workbook, CellComment};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! // Add a comment to cell A1
//! sheet.set_comment("A1", CellComment::new("Author", "This is a note")).unwrap();
//!
//! // Get the comment back
//! let comment = sheet.comment("A1").unwrap();
//! assert!(comment.is_some());
//! ```

use crate::error::Result;
use crate::store::{CellBounds, Shift, SparseStore};

/// A cell comment/note
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellComment {
    /// Author of the comment
    pub author: String,
    /// Comment text content
    pub text: String,
    /// Whether the comment box is visible by default
    pub visible: bool,
}

impl CellComment {
    /// Create a new comment with the given author and text
    ///
    /// # Example
    ///
    /// ```rust
    /// use sheetgrid_core::CellComment;
    ///
    /// let comment = CellComment::new("John Doe", "Review this value");
    /// assert_eq!(comment.author, "John Doe");
    /// assert!(!comment.visible);
    /// ```
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            visible: false,
        }
    }

    /// Create a comment with just text (empty author)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }

    /// Set whether the comment is visible by default
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Check if this comment has an author
    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }
}

impl std::fmt::Display for CellComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_author() {
            write!(f, "[{}]: {}", self.author, self.text)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// Comments of one worksheet
#[derive(Debug, Clone, Default)]
pub struct CommentCollection {
    comments: Vec<CellComment>,
    index: SparseStore<usize>,
}

impl CommentCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of comments
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if there are no comments
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Attach a comment to a cell, returning the one it replaced
    pub fn insert(&mut self, row: u32, col: u16, comment: CellComment) -> Result<Option<CellComment>> {
        if let Some(&i) = self.index.get(row, col) {
            return Ok(Some(std::mem::replace(&mut self.comments[i], comment)));
        }
        self.index.set_value(row, col, self.comments.len())?;
        self.comments.push(comment);
        Ok(None)
    }

    /// Comment attached to a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&CellComment> {
        self.index.get(row, col).and_then(|&i| self.comments.get(i))
    }

    /// Mutable comment attached to a cell
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellComment> {
        let i = *self.index.get(row, col)?;
        self.comments.get_mut(i)
    }

    /// Detach and return the comment on a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellComment> {
        let removed = self.index.remove(row, col)?;
        for (_, _, i) in self.index.iter_mut() {
            if *i > removed {
                *i -= 1;
            }
        }
        Some(self.comments.remove(removed))
    }

    /// Comments in reading order (row by row)
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellComment)> + '_ {
        self.index
            .cursor(CellBounds::sheet())
            .filter_map(|(row, col, &i)| self.comments.get(i).map(|c| (row, col, c)))
    }

    /// Rebuild the list after index entries were dropped by a shift
    fn compact(&mut self) {
        if self.comments.len() == self.index.len() {
            return;
        }
        let mut old: Vec<Option<CellComment>> =
            std::mem::take(&mut self.comments).into_iter().map(Some).collect();
        for (_, _, i) in self.index.iter_mut() {
            let comment = old.get_mut(*i).and_then(Option::take).unwrap_or_default();
            *i = self.comments.len();
            self.comments.push(comment);
        }
        log::debug!(
            "comment list compacted, {} dropped",
            old.iter().filter(|c| c.is_some()).count()
        );
    }
}

impl Shift for CommentCollection {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.index.insert_rows(at, count)?;
        self.compact();
        Ok(())
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.index.delete_rows(at, count)?;
        self.compact();
        Ok(())
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        self.index.insert_columns(at, count)?;
        self.compact();
        Ok(())
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        self.index.delete_columns(at, count)?;
        self.compact();
        Ok(())
    }
}
