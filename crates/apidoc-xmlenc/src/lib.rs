//! Markup codec for apidoc documentation blocks.
//!
//! Documentation comments hold an XML-like markup. This crate reads that
//! markup from a [`Block`](apidoc_source_map::Block) into typed values and
//! writes values back out, keeping the source location of every token and
//! every decoded value.
//!
//! - [`Parser`] tokenizes a block.
//! - [`decode`] fills a value from the parser's tokens, reporting problems
//!   to a [`DiagnosticSink`](apidoc_error_reporting::DiagnosticSink).
//! - [`encode`] renders a value as markup.
//!
//! Document types describe their schema with `#[derive(XmlNode)]`:
//!
//! ```rust
//! use apidoc_error_reporting::DiagnosticCollector;
//! use apidoc_source_map::{Block, Uri};
//! use apidoc_xmlenc::{BaseTag, Parser, StringAttribute, TextElement, XmlNode};
//!
//! #[derive(Debug, Default, XmlNode)]
//! #[apidoc("api,meta,usage-api")]
//! struct Api {
//!     #[apidoc(flatten)]
//!     base: BaseTag,
//!     #[apidoc("method,attr,usage-method")]
//!     method: StringAttribute,
//!     #[apidoc("summary,elem,usage-summary,omitempty")]
//!     summary: Option<TextElement>,
//! }
//!
//! let block = Block::from_text(
//!     Uri::new("file:///api.go"),
//!     r#"<api method="GET"><summary>List users</summary></api>"#,
//! );
//! let sink = DiagnosticCollector::new();
//! let mut parser = Parser::new(&block, &sink).unwrap();
//!
//! let mut api = Api::default();
//! apidoc_xmlenc::decode(&mut parser, &mut api, "");
//! assert!(sink.is_empty());
//! assert_eq!(api.method.v(), "GET");
//! assert_eq!(api.summary.as_ref().map(|s| s.v()), Some("List users"));
//!
//! let xml = apidoc_xmlenc::encode("", &api, "", "").unwrap();
//! assert_eq!(
//!     String::from_utf8(xml).unwrap(),
//!     r#"<api method="GET"><summary>List users</summary></api>"#
//! );
//! ```

// The derive emits `::apidoc_xmlenc::` paths, which must also resolve here.
extern crate self as apidoc_xmlenc;

pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod options;
pub mod parser;
pub mod schema;
pub mod token;
pub mod types;
pub mod value;

pub use apidoc_xmlenc_derive::XmlNode;
pub use cursor::{Cursor, Pos};
pub use decode::{decode, decode_with, read_text};
pub use encode::{encode, encode_with};
pub use error::{Result, XmlError};
pub use options::{DecodeOptions, EncodeOptions};
pub use parser::Parser;
pub use schema::{DecodeNode, EncodeNode, Meta, Node, Slot};
pub use token::{
    CData, Comment, EndElement, Instruction, StartElement, Token, XmlAttribute, XmlName, XmlString,
};
pub use types::{
    BaseAttribute, BaseTag, BoolAttribute, CDataText, Content, Number, NumberAttribute,
    StringAttribute, TextElement,
};
pub use value::{
    Attr, AttrDecoder, AttrEncoder, CharData, Decoder, Element, Encoder, IsEmpty, Sanitizer,
    Sequence,
};
