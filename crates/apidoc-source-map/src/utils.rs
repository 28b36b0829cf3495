//! Conversions between byte offsets and positions

use crate::types::Position;

/// Convert a byte offset in `source` to a position relative to its start.
///
/// Returns None if the offset is out of bounds or splits a character.
pub fn offset_to_position(source: &str, offset: usize) -> Option<Position> {
    if offset > source.len() || !source.is_char_boundary(offset) {
        return None;
    }

    let mut pos = Position::default();
    for ch in source[..offset].chars() {
        pos = advance(pos, ch);
    }
    Some(pos)
}

/// Convert a position relative to the start of `source` to a byte offset.
pub fn position_to_offset(source: &str, position: Position) -> Option<usize> {
    let mut pos = Position::default();
    for (offset, ch) in source.char_indices() {
        if pos == position {
            return Some(offset);
        }
        pos = advance(pos, ch);
    }

    (pos == position).then_some(source.len())
}

/// The position after `ch` when reading from `pos`.
pub fn advance(pos: Position, ch: char) -> Position {
    if ch == '\n' {
        Position::new(pos.line + 1, 0)
    } else {
        Position::new(pos.line, pos.character + 1)
    }
}
