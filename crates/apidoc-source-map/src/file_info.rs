//! Line index for position lookups

use crate::types::Position;
use serde::{Deserialize, Serialize};

/// Line index over a document's text.
///
/// Stores the character index at which every line starts, so that a
/// [`Position`] converts to the flat character index `ariadne` labels use
/// without rescanning the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Character index of the first character of each line
    line_starts: Vec<usize>,

    /// Total length of the text in characters
    total_chars: usize,
}

impl FileInformation {
    /// Scan `content` once and record its line starts.
    ///
    /// # Example
    ///
    /// ```
    /// use apidoc_source_map::{FileInformation, Position};
    ///
    /// let info = FileInformation::new("héllo\nworld");
    /// assert_eq!(info.char_index(Position::new(1, 2)), Some(8));
    /// ```
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        let mut total_chars = 0;
        for ch in content.chars() {
            total_chars += 1;
            if ch == '\n' {
                line_starts.push(total_chars);
            }
        }

        FileInformation {
            line_starts,
            total_chars,
        }
    }

    /// Convert a position to a character index.
    ///
    /// Returns None if the line does not exist or the column runs past the
    /// end of the text.
    pub fn char_index(&self, position: Position) -> Option<usize> {
        let start = *self.line_starts.get(position.line)?;
        let index = start + position.character;
        (index <= self.total_chars).then_some(index)
    }

    /// Convert a character index back to a position.
    pub fn position(&self, char_index: usize) -> Option<Position> {
        if char_index > self.total_chars {
            return None;
        }
        let line = match self.line_starts.binary_search(&char_index) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Some(Position::new(line, char_index - self.line_starts[line]))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }
}
