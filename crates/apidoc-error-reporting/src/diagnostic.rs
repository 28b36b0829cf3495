//! Diagnostic messages: what went wrong, where, and what to do about it.

use apidoc_source_map::{Location, SourceContext};
use serde::{Deserialize, Serialize};

/// Severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// The input could not be fully used
    Error,
    /// Something was ignored or looks wrong
    Warning,
    /// Informational message
    Info,
    Note,
}

/// Extra classification an editor can use to render a diagnostic.
///
/// Mirrors the LSP `DiagnosticTag` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticTag {
    /// The flagged text is ignored (shown faded out)
    Unused,
    /// The flagged construct is deprecated (shown struck through)
    Deprecated,
}

/// Bullet of a detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// `✖`
    Error,
    /// `ℹ`
    Info,
    /// `•`
    Note,
}

/// Text of a problem, detail or hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text content
    Plain(String),
    /// Markdown content
    Markdown(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) => s,
            MessageContent::Markdown(s) => s,
        }
    }

    /// `{"type": "plain" | "markdown", "content": ...}`
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            MessageContent::Plain(s) => json!({
                "type": "plain",
                "content": s
            }),
            MessageContent::Markdown(s) => json!({
                "type": "markdown",
                "content": s
            }),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// One bulleted line under the problem statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: MessageContent,
    /// Lets a message highlight several related places, e.g. both the start
    /// tag and the stray end tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A diagnostic: a short title with an optional catalog code, the problem
/// statement, bulleted details and hints phrased as questions.
///
/// Markup diagnostics also name the offending `field` and may carry
/// [`DiagnosticTag`]s for the editor layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Optional error code (e.g., "A-1-2")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    pub kind: DiagnosticKind,

    /// The problem statement
    pub problem: Option<MessageContent>,

    /// Specific error details
    pub details: Vec<DetailItem>,

    /// Suggestions, each ending with `?`
    pub hints: Vec<MessageContent>,

    /// Where in the source the issue occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Name of the element, attribute or slot the diagnostic is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DiagnosticTag>,
}

impl DiagnosticMessage {
    /// A message with only a title.
    ///
    /// Note: Consider using [`DiagnosticMessageBuilder`](crate::DiagnosticMessageBuilder)
    /// instead for better structure.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
            field: None,
            tags: Vec::new(),
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

    /// Set the error code.
    ///
    /// Error codes follow the format `A-<subsystem>-<number>`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replace the kind, keeping everything else.
    ///
    /// Sinks use this to file the same structured error as an error or as a
    /// warning.
    pub fn with_kind(mut self, kind: DiagnosticKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    pub fn has_tag(&self, tag: DiagnosticTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Subsystem of the error code, from the catalog.
    pub fn subsystem(&self) -> Option<&str> {
        self.code
            .as_ref()
            .and_then(|code| crate::catalog::get_subsystem(code))
    }

    /// Plain-text rendering for terminals and logs.
    ///
    /// Format:
    /// ```text
    /// Error [A-1-2]: title
    /// Problem statement here
    /// • Field: name
    /// ✖ Error detail 1
    /// ℹ Info detail
    /// ? Hint 1
    ///   at file:///a.go:3:5
    /// ```
    ///
    /// When `ctx` knows the document the location points into, the source
    /// excerpt is drawn with ariadne instead of the plain header.
    ///
    /// # Example
    ///
    /// ```
    /// use apidoc_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Invalid input")
    ///     .problem("Values must be numeric")
    ///     .add_detail("Found text in column 3")
    ///     .add_hint("Convert to numbers first?")
    ///     .build();
    /// let text = msg.to_text(None);
    /// assert!(text.contains("Error: Invalid input"));
    /// assert!(text.contains("Values must be numeric"));
    /// ```
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        use std::fmt::Write;

        let mut result = String::new();

        let ariadne = match (&self.location, ctx) {
            (Some(loc), Some(ctx)) => self.render_ariadne_source_context(loc, ctx),
            _ => None,
        };

        // fmt::Write on String never fails
        if let Some(rendered) = &ariadne {
            result.push_str(rendered);
        } else {
            let kind_str = match self.kind {
                DiagnosticKind::Error => "Error",
                DiagnosticKind::Warning => "Warning",
                DiagnosticKind::Info => "Info",
                DiagnosticKind::Note => "Note",
            };
            match &self.code {
                Some(code) => {
                    let _ = writeln!(result, "{} [{}]: {}", kind_str, code, self.title);
                }
                None => {
                    let _ = writeln!(result, "{}: {}", kind_str, self.title);
                }
            }

            if let Some(problem) = &self.problem {
                let _ = writeln!(result, "{}", problem.as_str());
            }
            if let Some(field) = &self.field {
                let _ = writeln!(result, "• Field: {}", field);
            }
        }

        for detail in &self.details {
            // ariadne already drew located details as labels
            if ariadne.is_some() && detail.location.is_some() {
                continue;
            }
            let bullet = match detail.kind {
                DetailKind::Error => "✖",
                DetailKind::Info => "ℹ",
                DetailKind::Note => "•",
            };
            let _ = writeln!(result, "{} {}", bullet, detail.content.as_str());
        }

        for hint in &self.hints {
            let _ = writeln!(result, "? {}", hint.as_str());
        }

        if ariadne.is_none() {
            if let Some(loc) = &self.location {
                let _ = writeln!(
                    result,
                    "  at {}:{}:{}",
                    loc.uri,
                    loc.range.start.line + 1,
                    loc.range.start.character + 1
                );
            }
        }

        result
    }

    /// JSON rendering for editor integrations.
    ///
    /// # Example
    ///
    /// ```
    /// use apidoc_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Something went wrong");
    /// let json = msg.to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let kind_str = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
            DiagnosticKind::Note => "note",
        };

        let mut obj = json!({
            "kind": kind_str,
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }

        if let Some(problem) = &self.problem {
            obj["problem"] = problem.to_json();
        }

        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let detail_kind = match d.kind {
                        DetailKind::Error => "error",
                        DetailKind::Info => "info",
                        DetailKind::Note => "note",
                    };
                    let mut detail_obj = json!({
                        "kind": detail_kind,
                        "content": d.content.to_json()
                    });
                    if let Some(location) = &d.location {
                        detail_obj["location"] = json!(location);
                    }
                    detail_obj
                })
                .collect();
            obj["details"] = json!(details);
        }

        if !self.hints.is_empty() {
            let hints: Vec<_> = self.hints.iter().map(|h| h.to_json()).collect();
            obj["hints"] = json!(hints);
        }

        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        if let Some(field) = &self.field {
            obj["field"] = json!(field);
        }

        if !self.tags.is_empty() {
            obj["tags"] = json!(self.tags);
        }

        obj
    }

    /// Draw the source excerpt with ariadne (helper for to_text).
    fn render_ariadne_source_context(
        &self,
        main_location: &Location,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(&main_location.uri)?;
        let content = file.text()?;
        let start = file.char_index(main_location.range.start)?;
        let end = file.char_index(main_location.range.end)?.max(start);
        let path = main_location.uri.to_string();

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let mut report = Report::build(report_kind, path.clone(), start)
            .with_config(Config::default().with_color(false));

        if let Some(code) = &self.code {
            report = report.with_message(format!("[{}] {}", code, self.title));
        } else {
            report = report.with_message(&self.title);
        }

        let main_message = match (&self.problem, &self.field) {
            (Some(problem), _) => problem.as_str().to_string(),
            (None, Some(field)) => field.clone(),
            (None, None) => self.title.clone(),
        };
        report = report.with_label(
            Label::new((path.clone(), start..end))
                .with_message(main_message)
                .with_color(main_color),
        );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.uri != main_location.uri {
                continue;
            }
            if let (Some(detail_start), Some(detail_end)) = (
                file.char_index(detail_loc.range.start),
                file.char_index(detail_loc.range.end),
            ) {
                let detail_color = match detail.kind {
                    DetailKind::Error => Color::Red,
                    DetailKind::Info => Color::Cyan,
                    DetailKind::Note => Color::Blue,
                };
                report = report.with_label(
                    Label::new((path.clone(), detail_start..detail_end.max(detail_start)))
                        .with_message(detail.content.as_str())
                        .with_color(detail_color),
                );
            }
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((path, Source::from(content.as_str())), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagnosticMessageBuilder;
    use apidoc_source_map::{Position, Range, Uri};

    fn location(uri: &str, start: (usize, usize), end: (usize, usize)) -> Location {
        Location::new(
            Uri::new(uri),
            Range::new(
                Position::new(start.0, start.1),
                Position::new(end.0, end.1),
            ),
        )
    }

    #[test]
    fn test_diagnostic_message_new() {
        let msg = DiagnosticMessage::new(DiagnosticKind::Error, "Test error");
        assert_eq!(msg.title, "Test error");
        assert_eq!(msg.kind, DiagnosticKind::Error);
        assert!(msg.code.is_none());
        assert!(msg.problem.is_none());
        assert!(msg.details.is_empty());
        assert!(msg.hints.is_empty());
        assert!(msg.field.is_none());
        assert!(msg.tags.is_empty());
    }

    #[test]
    fn test_with_kind_keeps_content() {
        let msg = DiagnosticMessage::error("Unknown element")
            .with_code("A-1-5")
            .with_kind(DiagnosticKind::Warning);
        assert_eq!(msg.kind, DiagnosticKind::Warning);
        assert_eq!(msg.code.as_deref(), Some("A-1-5"));
        assert!(!msg.is_error());
        assert_eq!(msg.subsystem(), Some("markup"));
    }

    #[test]
    fn test_to_text_simple_error() {
        let msg = DiagnosticMessage::error("Something went wrong");
        assert_eq!(msg.to_text(None), "Error: Something went wrong\n");
    }

    #[test]
    fn test_to_text_with_code() {
        let msg = DiagnosticMessage::error("Something went wrong").with_code("A-1-1");
        assert_eq!(msg.to_text(None), "Error [A-1-1]: Something went wrong\n");
    }

    #[test]
    fn test_to_text_full_message() {
        let msg = DiagnosticMessageBuilder::warning("Unknown element")
            .with_code("A-1-5")
            .problem("`foo` is not a known element here and is ignored")
            .with_field("foo")
            .add_info("Known elements are listed in the schema")
            .add_hint("Check the spelling?")
            .with_location(location("file:///a.go", (2, 4), (2, 20)))
            .build();

        insta::assert_snapshot!(msg.to_text(None), @r"
        Warning [A-1-5]: Unknown element
        `foo` is not a known element here and is ignored
        • Field: foo
        ℹ Known elements are listed in the schema
        ? Check the spelling?
          at file:///a.go:3:5
        ");
    }

    #[test]
    fn test_to_text_with_context() {
        let mut ctx = SourceContext::new();
        let uri = Uri::new("file:///a.go");
        ctx.add_file(uri, Some("// <api>\n// <x></api>\n".to_string()));

        let msg = DiagnosticMessageBuilder::error("End Tag Not Found")
            .with_code("A-1-2")
            .problem("`x` has no matching end tag")
            .with_location(location("file:///a.go", (1, 3), (1, 6)))
            .add_hint("Close the element?")
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[A-1-2] End Tag Not Found"));
        assert!(text.contains("file:///a.go"));
        assert!(text.contains("`x` has no matching end tag"));
        assert!(text.contains("? Close the element?"));
    }

    #[test]
    fn test_to_text_unknown_file_falls_back() {
        let ctx = SourceContext::new();
        let mut msg = DiagnosticMessage::error("Oops").with_code("A-1-1");
        msg.location = Some(location("file:///missing.go", (0, 0), (0, 1)));

        let text = msg.to_text(Some(&ctx));
        assert!(text.starts_with("Error [A-1-1]: Oops\n"));
        assert!(text.contains("at file:///missing.go:1:1"));
    }

    #[test]
    fn test_to_json_simple() {
        let msg = DiagnosticMessage::error("Something went wrong");
        let json = msg.to_json();

        assert_eq!(json["kind"], "error");
        assert_eq!(json["title"], "Something went wrong");
        assert!(json.get("code").is_none());
        assert!(json.get("problem").is_none());
        assert!(json.get("location").is_none());
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_to_json_full_message() {
        let msg = DiagnosticMessageBuilder::warning("Multiple Root Elements")
            .with_code("A-1-4")
            .problem("Only one root element is allowed")
            .with_field("api")
            .add_tag(DiagnosticTag::Unused)
            .with_location(location("file:///a.go", (10, 5), (10, 15)))
            .add_detail("second root")
            .add_hint("Remove it?")
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "warning");
        assert_eq!(json["code"], "A-1-4");
        assert_eq!(json["problem"]["content"], "Only one root element is allowed");
        assert_eq!(json["field"], "api");
        assert_eq!(json["tags"][0], "Unused");
        assert_eq!(json["details"][0]["kind"], "error");
        assert_eq!(json["hints"][0]["content"], "Remove it?");
        assert_eq!(json["location"]["uri"], "file:///a.go");
        assert_eq!(json["location"]["range"]["start"]["line"], 10);
        assert_eq!(json["location"]["range"]["end"]["character"], 15);
    }

    #[test]
    fn test_serde_round_trip() {
        let msg = DiagnosticMessageBuilder::error("Invalid Value")
            .with_code("A-1-7")
            .with_field("id")
            .add_tag(DiagnosticTag::Deprecated)
            .build();

        let json = serde_json::to_string(&msg).unwrap();
        let back: DiagnosticMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
