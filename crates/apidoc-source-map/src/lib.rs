//! Source locations for apidoc
//!
//! Every token and every decoded value of a documentation block carries a
//! [`Location`]: the document [`Uri`] and a [`Range`] of LSP style
//! positions (line and character, 0-indexed, characters counted as Unicode
//! scalar values). A [`Block`] anchors raw comment text at its position in
//! the enclosing source file so positions computed inside the block are
//! absolute.
//!
//! # Example
//!
//! ```rust
//! use apidoc_source_map::*;
//!
//! let block = Block::new(
//!     Location::new(Uri::from_path("a.go"), Range::new(Position::new(3, 2), Position::new(3, 2))),
//!     "<api/>",
//! );
//! assert_eq!(block.location.uri.as_str(), "file://a.go");
//! assert!(block.location.range.is_empty());
//! ```

pub mod context;
pub mod file_info;
pub mod types;
pub mod utils;

pub use context::{SourceContext, SourceFile};
pub use file_info::FileInformation;
pub use types::{Block, Location, Position, Range, Uri};
pub use utils::{offset_to_position, position_to_offset};
