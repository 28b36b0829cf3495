//! Error reporting and diagnostic messages for apidoc.
//!
//! Diagnostics follow a tidyverse-style structure (title, problem, details,
//! hints) and carry the [`Location`](apidoc_source_map::Location) they refer
//! to, the offending field name and optional [`DiagnosticTag`]s that an
//! editor integration maps onto its own diagnostic model.
//!
//! - [`DiagnosticMessage`]: the message structure, rendered with
//!   [`DiagnosticMessage::to_text`] (ariadne source excerpts when a
//!   [`SourceContext`](apidoc_source_map::SourceContext) is available) or
//!   [`DiagnosticMessage::to_json`]
//! - [`DiagnosticMessageBuilder`]: the recommended way to build messages
//! - [`catalog`]: stable error codes (`A-<subsystem>-<number>`)
//! - [`DiagnosticSink`]: where decoders send what they find, with an
//!   in-memory [`DiagnosticCollector`] and the threaded [`MessageHandler`]
//!
//! # Example
//!
//! ```
//! use apidoc_error_reporting::{DiagnosticCollector, DiagnosticMessageBuilder, DiagnosticSink};
//!
//! let sink = DiagnosticCollector::new();
//! sink.error(
//!     DiagnosticMessageBuilder::error("End Tag Not Found")
//!         .with_code("A-1-2")
//!         .with_field("api")
//!         .build(),
//! );
//! assert!(sink.has_errors());
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;
pub mod sink;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{
    DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, DiagnosticTag, MessageContent,
};
pub use sink::{
    DiagnosticCollector, DiagnosticSink, MESSAGE_QUEUE_CAPACITY, Message, MessageHandler,
    MessageKind,
};
