//! Tokenizer for the documentation markup.

use crate::cursor::{Cursor, Pos};
use crate::error::{Result, XmlError};
use crate::token::{
    CData, Comment, EndElement, Instruction, StartElement, Token, XmlAttribute, XmlName, XmlString,
};
use apidoc_error_reporting::DiagnosticSink;
use apidoc_source_map::{Block, Location, Position, Range};
use std::borrow::Cow;

pub(crate) const CDATA_START: &str = "<![CDATA[";
pub(crate) const CDATA_END: &str = "]]>";
pub(crate) const CDATA_ESCAPE: &str = "]]]]><![CDATA[>";

/// Reads tokens from one block and reports what it cannot recover from to
/// a diagnostic sink.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Parser<'a> {
    pub fn new(block: &'a Block, sink: &'a dyn DiagnosticSink) -> Result<Self> {
        Ok(Parser {
            cursor: Cursor::new(block)?,
            sink,
        })
    }

    /// Report `err` to the sink as an error.
    pub fn error(&self, err: XmlError) {
        self.sink.error(err.to_diagnostic());
    }

    /// Report `err` to the sink as a warning.
    pub fn warning(&self, err: XmlError) {
        self.sink.warning(err.to_diagnostic());
    }

    pub fn sink(&self) -> &'a dyn DiagnosticSink {
        self.sink
    }

    /// Current document position.
    pub fn position(&self) -> Position {
        self.cursor.current().position
    }

    /// Location in this block from `start` to `end`.
    pub fn location(&self, start: Position, end: Position) -> Location {
        self.cursor.location(start, end)
    }

    /// Read the next token. `Ok(None)` marks the end of the block.
    pub fn token(&mut self) -> Result<Option<Token>> {
        if self.cursor.at_eof() {
            return Ok(None);
        }

        let pos = self.cursor.current();
        if self.cursor.next(1) != "<" {
            self.cursor.rollback();
            return Ok(Some(Token::String(self.parse_content())));
        }

        let token = if self.cursor.matches("?") {
            Token::Instruction(self.parse_instruction(pos)?)
        } else if self.cursor.matches("![CDATA[") {
            Token::CData(self.parse_cdata(pos)?)
        } else if self.cursor.matches("/") {
            Token::EndElement(self.parse_end_element(pos)?)
        } else if self.cursor.matches("!--") {
            Token::Comment(self.parse_comment(pos)?)
        } else {
            Token::StartElement(self.parse_start_element(pos)?)
        };
        Ok(Some(token))
    }

    /// Skip past the end tag that closes `start`.
    ///
    /// Used when `start` cannot be decoded normally. Nested elements of the
    /// same name are balanced: each non-self-closing start tag with the
    /// same name opens one level, each end tag with that name closes one,
    /// and the end tag met at level zero is the match. Tags with other
    /// names leave the count alone. If the end tag never comes, a
    /// `NotFoundEndTag` error goes to the sink and the cursor returns to
    /// where it was, so the caller can go on with what follows `start`.
    pub fn end_element(&mut self, start: &StartElement) -> Result<()> {
        if start.self_close {
            return Ok(());
        }

        let mark = self.cursor.current();
        let mut level = 0usize;
        loop {
            match self.token()? {
                None => {
                    tracing::debug!(element = %start.name, "end tag not found, rewinding");
                    self.error(XmlError::NotFoundEndTag {
                        location: start.location.clone(),
                        field: start.name.to_string(),
                    });
                    self.cursor.move_to(mark);
                    return Ok(());
                }
                Some(Token::StartElement(elem))
                    if !elem.self_close && elem.name.same_as(&start.name) =>
                {
                    level += 1;
                }
                Some(Token::EndElement(elem)) if start.matches(&elem) => {
                    if level == 0 {
                        return Ok(());
                    }
                    level -= 1;
                }
                Some(_) => {}
            }
        }
    }

    fn invalid_here(&self, field: &str) -> XmlError {
        let at = self.position();
        XmlError::InvalidXml {
            location: self.location(at, at),
            field: field.to_string(),
        }
    }

    fn not_found_here(&self, field: &str) -> XmlError {
        let at = self.position();
        XmlError::NotFoundEndTag {
            location: self.location(at, at),
            field: field.to_string(),
        }
    }

    fn string(&self, start: Pos, end: Pos, value: String) -> XmlString {
        XmlString {
            location: self.location(start.position, end.position),
            value,
        }
    }

    fn parse_content(&mut self) -> XmlString {
        let start = self.cursor.current();
        let data = match self.cursor.delim(b'<', false) {
            Some(data) => data,
            None => self.cursor.all(),
        };
        self.string(start, self.cursor.current(), unescape(data))
    }

    fn parse_comment(&mut self, pos: Pos) -> Result<Comment> {
        let start = self.cursor.current();
        let Some(data) = self.cursor.delim_str("-->", false) else {
            return Err(self.not_found_here("<!--"));
        };
        let end = self.cursor.current();
        self.cursor.next(3);

        Ok(Comment {
            location: self.location(pos.position, self.position()),
            value: self.string(start, end, data.to_string()),
        })
    }

    fn parse_start_element(&mut self, pos: Pos) -> Result<StartElement> {
        self.cursor.spaces();

        let start = self.cursor.current();
        let name = self
            .cursor
            .delim_fn(|ch| ch.is_whitespace() || ch == '/' || ch == '>', false)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| self.invalid_here(""))?;
        let name = self.parse_name(name, start.position, self.position());

        let attributes = self.parse_attributes()?;

        self.cursor.spaces();
        let self_close = if self.cursor.matches("/>") {
            true
        } else if self.cursor.matches(">") {
            false
        } else {
            return Err(self.not_found_here(&name.to_string()));
        };

        Ok(StartElement {
            location: self.location(pos.position, self.position()),
            name,
            attributes,
            self_close,
        })
    }

    fn parse_end_element(&mut self, pos: Pos) -> Result<EndElement> {
        let start = self.cursor.current();
        let name = self
            .cursor
            .delim(b'>', false)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| self.invalid_here(""))?;
        let end = self.cursor.current();
        self.cursor.next(1);

        Ok(EndElement {
            location: self.location(pos.position, self.position()),
            name: self.parse_name(name, start.position, end.position),
        })
    }

    fn parse_cdata(&mut self, pos: Pos) -> Result<CData> {
        let start = self.cursor.current();
        let mut value = String::new();

        loop {
            let Some(segment) = self.cursor.delim_str(CDATA_END, false) else {
                self.cursor.all();
                return Err(XmlError::NotFoundEndTag {
                    location: self.location(pos.position, self.position()),
                    field: CDATA_START.to_string(),
                });
            };
            value.push_str(segment);

            // `]]]]><![CDATA[>` stands for a literal `]]>`; the segment
            // already holds its leading `]]`.
            if segment.ends_with("]]") {
                let boundary = self.cursor.current();
                self.cursor.back_ascii(2);
                if self.cursor.matches(CDATA_ESCAPE) {
                    value.push('>');
                    continue;
                }
                self.cursor.move_to(boundary);
            }
            break;
        }

        let end = self.cursor.current();
        self.cursor.next(CDATA_END.len());

        Ok(CData {
            location: self.location(pos.position, self.position()),
            value: self.string(start, end, value),
        })
    }

    fn parse_instruction(&mut self, pos: Pos) -> Result<Instruction> {
        let (name, range) = self.get_name();
        if name.is_empty() {
            return Err(self.invalid_here(""));
        }
        let name = XmlString {
            location: self.location(range.start, range.end),
            value: name.to_string(),
        };

        let attributes = self.parse_attributes()?;

        self.cursor.spaces();
        if !self.cursor.matches("?>") {
            return Err(self.not_found_here("<?"));
        }

        Ok(Instruction {
            location: self.location(pos.position, self.position()),
            name,
            attributes,
        })
    }

    fn parse_attributes(&mut self) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();
        while let Some(attr) = self.parse_attribute()? {
            attributes.push(attr);
        }
        self.cursor.spaces();
        Ok(attributes)
    }

    fn parse_attribute(&mut self) -> Result<Option<XmlAttribute>> {
        self.cursor.spaces();
        let start = self.cursor.current();

        let (name, range) = self.get_name();
        if name.is_empty() {
            return Ok(None);
        }
        let name = self.parse_name(name, range.start, range.end);

        self.cursor.spaces();
        if !self.cursor.matches("=") {
            return Err(self.invalid_here(&name.to_string()));
        }

        self.cursor.spaces();
        if !self.cursor.matches("\"") {
            return Err(self.invalid_here(&name.to_string()));
        }

        let value_start = self.cursor.current();
        let Some(raw) = self.cursor.delim(b'"', false) else {
            return Err(self.invalid_here(&name.to_string()));
        };
        let value = self.string(value_start, self.cursor.current(), unescape(raw));
        self.cursor.next(1);

        Ok(Some(XmlAttribute {
            location: self.location(start.position, self.position()),
            name,
            value,
        }))
    }

    /// Read a bare name, stopping before quotes, `=`, `<`, `>`, `?`, `/`
    /// or whitespace.
    fn get_name(&mut self) -> (&'a str, Range) {
        let start = self.position();
        let name = match self.cursor.delim_fn(
            |ch| matches!(ch, '"' | '=' | '<' | '>' | '?' | '/') || ch.is_whitespace(),
            false,
        ) {
            Some(name) => name,
            None => self.cursor.all(),
        };
        (name, Range::new(start, self.position()))
    }

    fn parse_name(&self, raw: &str, start: Position, end: Position) -> XmlName {
        let location = self.location(start, end);
        let Some(index) = raw.find(':') else {
            return XmlName {
                location: location.clone(),
                prefix: None,
                local: XmlString {
                    location,
                    value: raw.to_string(),
                },
            };
        };

        let prefix = &raw[..index];
        let character = start.character + prefix.chars().count();
        XmlName {
            prefix: Some(XmlString {
                location: self.location(start, Position::new(start.line, character)),
                value: prefix.to_string(),
            }),
            local: XmlString {
                location: self.location(Position::new(start.line, character + 1), end),
                value: raw[index + 1..].to_string(),
            },
            location,
        }
    }
}

/// Decode the predefined entities and character references; text with an
/// unknown entity is kept as written.
fn unescape(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(Cow::Borrowed(text)) => text.to_string(),
        Ok(Cow::Owned(text)) => text,
        Err(_) => raw.to_string(),
    }
}
