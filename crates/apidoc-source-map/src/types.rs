//! Core types for source locations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const SCHEME_SEPARATOR: &str = "://";

/// Identifier of a source document.
///
/// Cloning is cheap; every token and decoded value of a block shares the
/// same allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(Arc<str>);

impl Uri {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Uri(Arc::from(uri.as_ref()))
    }

    /// Build a `file://` URI from a local path.
    ///
    /// A path that already carries a scheme is returned unchanged.
    pub fn from_path(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        if path.contains(SCHEME_SEPARATOR) {
            Uri::new(path)
        } else {
            Uri::new(format!("file{SCHEME_SEPARATOR}{path}"))
        }
    }

    /// Split into scheme and path. The scheme is empty for bare paths.
    pub fn parse(&self) -> (&str, &str) {
        match self.0.find(SCHEME_SEPARATOR) {
            Some(index) => (&self.0[..index], &self.0[index + SCHEME_SEPARATOR.len()..]),
            None => ("", &self.0),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(value: &str) -> Self {
        Uri::new(value)
    }
}

impl From<String> for Uri {
    fn from(value: String) -> Self {
        Uri(Arc::from(value))
    }
}

/// A position in a document (0-indexed)
///
/// Compatible with the LSP `Position` structure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number
    pub line: usize,
    /// Column, counted in characters (Unicode scalar values), not bytes
    pub character: usize,
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Position { line, character }
    }
}

/// A range in a document from start to end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// The range covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `p` lies inside the range, both ends included.
    pub fn contains(&self, p: Position) -> bool {
        self.start <= p && p <= self.end
    }
}

/// A range inside a named document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: Uri,
    pub range: Range,
}

impl Location {
    pub fn new(uri: Uri, range: Range) -> Self {
        Location { uri, range }
    }

    pub fn contains(&self, uri: &Uri, p: Position) -> bool {
        &self.uri == uri && self.range.contains(p)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.range;
        write!(
            f,
            "{}[{}:{},{}:{}]",
            self.uri, start.line, start.character, end.line, end.character
        )
    }
}

/// A documentation comment block extracted from a source file.
///
/// `location.range.start` anchors the first byte of `data` in the enclosing
/// document; positions computed while reading the block are absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub location: Location,
    pub data: Vec<u8>,
}

impl Block {
    pub fn new(location: Location, data: impl Into<Vec<u8>>) -> Self {
        Block {
            location,
            data: data.into(),
        }
    }

    /// A block starting at the top of `uri`.
    pub fn from_text(uri: impl Into<Uri>, data: &str) -> Self {
        Block::new(
            Location::new(uri.into(), Range::default()),
            data.as_bytes().to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(1, 2) < Position::new(1, 3));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = Range::new(Position::new(1, 2), Position::new(3, 4));

        assert!(range.contains(Position::new(1, 2)));
        assert!(range.contains(Position::new(2, 0)));
        assert!(range.contains(Position::new(2, 100)));
        assert!(range.contains(Position::new(3, 4)));

        assert!(!range.contains(Position::new(1, 1)));
        assert!(!range.contains(Position::new(3, 5)));
        assert!(!range.contains(Position::new(0, 3)));
    }

    #[test]
    fn test_range_is_empty() {
        assert!(Range::default().is_empty());
        assert!(Range::new(Position::new(3, 1), Position::new(3, 1)).is_empty());
        assert!(!Range::new(Position::new(3, 1), Position::new(3, 2)).is_empty());
    }

    #[test]
    fn test_location_contains_checks_uri() {
        let loc = Location::new(
            Uri::new("file:///a.go"),
            Range::new(Position::new(0, 0), Position::new(0, 10)),
        );
        assert!(loc.contains(&Uri::new("file:///a.go"), Position::new(0, 3)));
        assert!(!loc.contains(&Uri::new("file:///b.go"), Position::new(0, 3)));
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new(
            Uri::new("file:///a.go"),
            Range::new(Position::new(1, 2), Position::new(3, 4)),
        );
        assert_eq!(loc.to_string(), "file:///a.go[1:2,3:4]");
    }

    #[test]
    fn test_uri_from_path() {
        assert_eq!(Uri::from_path("./a.go").as_str(), "file://./a.go");
        assert_eq!(
            Uri::from_path("https://example.com/a.go").as_str(),
            "https://example.com/a.go"
        );
        assert_eq!(Uri::from_path("/tmp/x").parse(), ("file", "/tmp/x"));
        assert_eq!(Uri::new("a/b").parse(), ("", "a/b"));
    }

    #[test]
    fn test_serialization_location() {
        let loc = Location::new(
            Uri::new("file:///a.go"),
            Range::new(Position::new(1, 2), Position::new(3, 4)),
        );
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["uri"], "file:///a.go");
        assert_eq!(json["range"]["start"]["line"], 1);
        assert_eq!(json["range"]["end"]["character"], 4);

        let back: Location = serde_json::from_value(json).unwrap();
        assert_eq!(back, loc);
    }
}
