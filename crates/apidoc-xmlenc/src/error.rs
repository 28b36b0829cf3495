//! Error types for markup decoding and encoding.

use apidoc_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, DiagnosticTag, catalog};
use apidoc_source_map::Location;
use thiserror::Error;

/// Errors produced by the tokenizer, the decoder and the encoder.
///
/// Tokenizer errors abort the enclosing decode. The decoder files the
/// recoverable ones (`IsEmpty`, `MultipleRootTag`, `InvalidTag`,
/// `InvalidValue`) with the diagnostic sink and carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XmlError {
    /// Malformed markup.
    #[error("invalid markup at {location}")]
    InvalidXml { location: Location, field: String },

    /// A construct that was opened is never closed.
    #[error("end tag not found for `{field}` at {location}")]
    NotFoundEndTag { location: Location, field: String },

    /// A required attribute, element or text is missing or empty.
    #[error("`{field}` must not be empty at {location}")]
    IsEmpty { location: Location, field: String },

    /// A second top-level element.
    #[error("multiple root elements, `{field}` at {location} is ignored")]
    MultipleRootTag { location: Location, field: String },

    /// A child element the schema does not know.
    #[error("unknown element `{field}` at {location}")]
    InvalidTag { location: Location, field: String },

    #[error("invalid UTF-8 at {location}")]
    InvalidUtf8 { location: Location },

    /// Text that does not parse as the slot's value type.
    #[error("invalid value for `{field}` at {location}: {message}")]
    InvalidValue {
        location: Location,
        field: String,
        message: String,
    },

    #[error("cannot encode: {message}")]
    Encode { message: String },
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, XmlError>;

impl XmlError {
    /// The error code in the diagnostics catalog.
    pub fn code(&self) -> &'static str {
        match self {
            XmlError::InvalidXml { .. } => "A-1-1",
            XmlError::NotFoundEndTag { .. } => "A-1-2",
            XmlError::IsEmpty { .. } => "A-1-3",
            XmlError::MultipleRootTag { .. } => "A-1-4",
            XmlError::InvalidTag { .. } => "A-1-5",
            XmlError::InvalidUtf8 { .. } => "A-1-6",
            XmlError::InvalidValue { .. } => "A-1-7",
            XmlError::Encode { .. } => "A-1-8",
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            XmlError::InvalidXml { location, .. }
            | XmlError::NotFoundEndTag { location, .. }
            | XmlError::IsEmpty { location, .. }
            | XmlError::MultipleRootTag { location, .. }
            | XmlError::InvalidTag { location, .. }
            | XmlError::InvalidUtf8 { location }
            | XmlError::InvalidValue { location, .. } => Some(location),
            XmlError::Encode { .. } => None,
        }
    }

    /// Name of the element, attribute or slot at fault; empty when the
    /// error is not about a named construct.
    pub fn field(&self) -> &str {
        match self {
            XmlError::InvalidXml { field, .. }
            | XmlError::NotFoundEndTag { field, .. }
            | XmlError::IsEmpty { field, .. }
            | XmlError::MultipleRootTag { field, .. }
            | XmlError::InvalidTag { field, .. }
            | XmlError::InvalidValue { field, .. } => field,
            XmlError::InvalidUtf8 { .. } | XmlError::Encode { .. } => "",
        }
    }

    /// Convert to a [`DiagnosticMessage`] with the matching A-1-* code.
    ///
    /// The result is an error; sinks file it as a warning where the
    /// decoder treats it as one.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let code = self.code();
        let field = self.field();
        let title = catalog::get_error_info(code)
            .map(|info| info.title.clone())
            .unwrap_or_else(|| self.to_string());

        let mut builder = DiagnosticMessageBuilder::error(title).with_code(code);
        if let Some(problem) = catalog::render_message(code, field) {
            builder = builder.problem(problem);
        }
        if !field.is_empty() {
            builder = builder.with_field(field);
        }
        if let Some(location) = self.location() {
            builder = builder.with_location(location.clone());
        }

        match self {
            XmlError::MultipleRootTag { .. } | XmlError::InvalidTag { .. } => {
                builder = builder.add_tag(DiagnosticTag::Unused);
            }
            XmlError::InvalidValue { message, .. } | XmlError::Encode { message } => {
                builder = builder.add_detail(message.clone());
            }
            XmlError::NotFoundEndTag { field, .. } if !field.starts_with('<') => {
                builder = builder.add_hint(format!("Add `</{field}>` after its content?"));
            }
            _ => {}
        }

        builder.build()
    }
}

impl From<XmlError> for DiagnosticMessage {
    fn from(err: XmlError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_error_reporting::DiagnosticKind;
    use apidoc_source_map::{Position, Range, Uri};

    fn loc() -> Location {
        Location::new(
            Uri::new("file:///a.go"),
            Range::new(Position::new(1, 2), Position::new(1, 9)),
        )
    }

    #[test]
    fn test_display() {
        let err = XmlError::NotFoundEndTag {
            location: loc(),
            field: "api".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "end tag not found for `api` at file:///a.go[1:2,1:9]"
        );
    }

    #[test]
    fn test_not_found_end_tag_diagnostic() {
        let diag = XmlError::NotFoundEndTag {
            location: loc(),
            field: "api".to_string(),
        }
        .to_diagnostic();

        assert_eq!(diag.kind, DiagnosticKind::Error);
        assert_eq!(diag.code.as_deref(), Some("A-1-2"));
        assert_eq!(diag.title, "End Tag Not Found");
        assert_eq!(diag.field.as_deref(), Some("api"));
        assert_eq!(diag.location, Some(loc()));
        assert_eq!(diag.hints[0].as_str(), "Add `</api>` after its content?");
        assert!(diag.tags.is_empty());
    }

    #[test]
    fn test_markers_get_no_hint() {
        let diag = XmlError::NotFoundEndTag {
            location: loc(),
            field: "<!--".to_string(),
        }
        .to_diagnostic();
        assert!(diag.hints.is_empty());
    }

    #[test]
    fn test_unused_tag() {
        let diag = XmlError::InvalidTag {
            location: loc(),
            field: "unknown".to_string(),
        }
        .to_diagnostic();
        assert!(diag.has_tag(DiagnosticTag::Unused));
        assert_eq!(
            diag.problem.as_ref().map(|p| p.as_str()),
            Some("`unknown` is not a known element here and is ignored")
        );
    }

    #[test]
    fn test_invalid_value_detail() {
        let diag: DiagnosticMessage = XmlError::InvalidValue {
            location: loc(),
            field: "id".to_string(),
            message: "invalid digit found in string".to_string(),
        }
        .into();
        assert_eq!(diag.code.as_deref(), Some("A-1-7"));
        assert_eq!(diag.details[0].content.as_str(), "invalid digit found in string");
    }

    #[test]
    fn test_encode_has_no_location() {
        let err = XmlError::Encode {
            message: "no root name".to_string(),
        };
        assert!(err.location().is_none());
        assert_eq!(err.field(), "");
        assert!(err.to_diagnostic().field.is_none());
    }
}
