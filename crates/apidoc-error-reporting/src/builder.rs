//! Builder API for diagnostic messages.
//!
//! The builder encodes the tidyverse structure: a title, one problem
//! statement, bulleted details and hints phrased as questions.

use crate::diagnostic::{
    DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, DiagnosticTag, MessageContent,
};
use apidoc_source_map::Location;

/// Builder for [`DiagnosticMessage`].
///
/// # Example
///
/// ```
/// use apidoc_error_reporting::DiagnosticMessageBuilder;
///
/// let error = DiagnosticMessageBuilder::error("End Tag Not Found")
///     .with_code("A-1-2")
///     .problem("`api` has no matching end tag")
///     .with_field("api")
///     .add_hint("Add `</api>` after the last child?")
///     .build();
/// assert_eq!(error.field.as_deref(), Some("api"));
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        DiagnosticMessageBuilder {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// The problem statement. Setting it twice keeps the last one.
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    pub fn add_detail(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    pub fn add_detail_at(self, detail: impl Into<MessageContent>, location: Location) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    pub fn add_info(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, detail.into(), None)
    }

    pub fn add_info_at(self, detail: impl Into<MessageContent>, location: Location) -> Self {
        self.push_detail(DetailKind::Info, detail.into(), Some(location))
    }

    pub fn add_note(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Note, detail.into(), None)
    }

    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.message.location = Some(location);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.message.field = Some(field.into());
        self
    }

    /// Add a tag; adding the same tag twice has no effect.
    pub fn add_tag(mut self, tag: DiagnosticTag) -> Self {
        if !self.message.tags.contains(&tag) {
            self.message.tags.push(tag);
        }
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<Location>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}
