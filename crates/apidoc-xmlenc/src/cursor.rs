//! Position-tracked character cursor over a block.

use crate::error::{Result, XmlError};
use apidoc_source_map::utils::advance;
use apidoc_source_map::{Block, Location, Position, Range, Uri};
use memchr::memmem;

/// A point in the block: the absolute document position plus the byte
/// offset into the block's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub position: Position,
    pub offset: usize,
}

impl Pos {
    /// Step back over `n` single-byte characters on the current line.
    fn back_ascii(self, n: usize) -> Pos {
        Pos {
            position: Position::new(self.position.line, self.position.character - n),
            offset: self.offset - n,
        }
    }
}

/// Cursor over the text of a [`Block`].
///
/// Every consuming operation remembers where it started so the last one
/// can be undone with [`Cursor::rollback`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    uri: Uri,
    data: &'a str,
    current: Pos,
    prev: Option<Pos>,
}

impl<'a> Cursor<'a> {
    /// Wrap a block, rejecting data that is not valid UTF-8.
    pub fn new(block: &'a Block) -> Result<Self> {
        let uri = block.location.uri.clone();
        let start = Pos {
            position: block.location.range.start,
            offset: 0,
        };

        let data = match std::str::from_utf8(&block.data) {
            Ok(data) => data,
            Err(err) => {
                // The prefix up to `valid_up_to` is valid, so it can be walked.
                let valid = std::str::from_utf8(&block.data[..err.valid_up_to()]).unwrap_or("");
                let at = advance_over(start, valid).position;
                let end = Position::new(at.line, at.character + 1);
                return Err(XmlError::InvalidUtf8 {
                    location: Location::new(uri, Range::new(at, end)),
                });
            }
        };

        Ok(Cursor {
            uri,
            data,
            current: start,
            prev: Some(start),
        })
    }

    pub fn at_eof(&self) -> bool {
        self.current.offset >= self.data.len()
    }

    pub fn current(&self) -> Pos {
        self.current
    }

    fn rest(&self) -> &'a str {
        &self.data[self.current.offset..]
    }

    /// Consume up to `n` characters and return them.
    pub fn next(&mut self, n: usize) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .nth(n)
            .map_or(rest.len(), |(index, _)| index);
        self.consume(len)
    }

    /// Consume `word` if the input continues with it.
    pub fn matches(&mut self, word: &str) -> bool {
        if word.is_empty() || !self.rest().starts_with(word) {
            return false;
        }
        self.consume(word.len());
        true
    }

    /// Undo the last consuming operation. Does nothing after `move_to` or a
    /// second rollback.
    pub fn rollback(&mut self) {
        if let Some(prev) = self.prev.take() {
            self.current = prev;
        }
    }

    /// Jump to a position returned earlier by [`Cursor::current`].
    pub fn move_to(&mut self, pos: Pos) {
        self.current = pos;
        self.prev = None;
    }

    /// Skip whitespace, newlines included.
    pub fn spaces(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.len() - rest.trim_start().len();
        self.consume(len)
    }

    /// Consume everything up to the byte `delim`, which must be ASCII.
    ///
    /// With `contain` the delimiter is consumed and returned too. Returns
    /// None and leaves the cursor alone when `delim` does not occur.
    pub fn delim(&mut self, delim: u8, contain: bool) -> Option<&'a str> {
        debug_assert!(delim.is_ascii());
        let index = memchr::memchr(delim, self.rest().as_bytes())?;
        Some(self.consume(if contain { index + 1 } else { index }))
    }

    /// Like [`Cursor::delim`] with a string delimiter.
    pub fn delim_str(&mut self, delim: &str, contain: bool) -> Option<&'a str> {
        assert!(!delim.is_empty(), "delimiter must not be empty");
        let index = memmem::find(self.rest().as_bytes(), delim.as_bytes())?;
        Some(self.consume(if contain { index + delim.len() } else { index }))
    }

    /// Consume up to the first character for which `f` holds.
    pub fn delim_fn(&mut self, f: impl Fn(char) -> bool, contain: bool) -> Option<&'a str> {
        let (index, ch) = self.rest().char_indices().find(|&(_, ch)| f(ch))?;
        Some(self.consume(if contain { index + ch.len_utf8() } else { index }))
    }

    /// Consume everything that is left.
    pub fn all(&mut self) -> &'a str {
        let len = self.rest().len();
        self.consume(len)
    }

    pub fn location(&self, start: Position, end: Position) -> Location {
        Location::new(self.uri.clone(), Range::new(start, end))
    }

    /// Rewind over a `]]` the cursor just passed; see the CDATA scanner.
    pub(crate) fn back_ascii(&mut self, n: usize) {
        let pos = self.current.back_ascii(n);
        self.move_to(pos);
    }

    fn consume(&mut self, len: usize) -> &'a str {
        let start = self.current;
        let text = &self.data[start.offset..start.offset + len];
        self.prev = Some(start);
        self.current = advance_over(start, text);
        text
    }
}

fn advance_over(mut pos: Pos, text: &str) -> Pos {
    for ch in text.chars() {
        pos.position = advance(pos.position, ch);
    }
    pos.offset += text.len();
    pos
}
