//! Markup tokens.
//!
//! Every token and every piece of a token records the [`Location`] it was
//! read from.

use apidoc_source_map::Location;
use std::fmt;

/// A run of text with its location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlString {
    pub location: Location,
    pub value: String,
}

/// An element or attribute name, `prefix:local` or just `local`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlName {
    pub location: Location,
    pub prefix: Option<XmlString>,
    pub local: XmlString,
}

impl XmlName {
    /// The prefix, or `""` when there is none.
    pub fn prefix_str(&self) -> &str {
        self.prefix.as_ref().map_or("", |p| p.value.as_str())
    }

    /// Same prefix and local name; locations are not compared.
    pub fn same_as(&self, other: &XmlName) -> bool {
        self.prefix_str() == other.prefix_str() && self.local.value == other.local.value
    }

    /// Local name is `local` and the prefix is `prefix` (`""` for none).
    pub fn is(&self, prefix: &str, local: &str) -> bool {
        self.prefix_str() == prefix && self.local.value == local
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix.value, self.local.value),
            None => f.write_str(&self.local.value),
        }
    }
}

/// `name="value"` inside a start tag or an instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlAttribute {
    pub location: Location,
    pub name: XmlName,
    /// The value without its quotes
    pub value: XmlString,
}

/// `<name attr="...">` or `<name/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartElement {
    pub location: Location,
    pub name: XmlName,
    pub attributes: Vec<XmlAttribute>,
    pub self_close: bool,
}

impl StartElement {
    /// Whether `end` closes this element.
    pub fn matches(&self, end: &EndElement) -> bool {
        self.name.same_as(&end.name)
    }
}

/// `</name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndElement {
    pub location: Location,
    pub name: XmlName,
}

/// `<?name attr="..."?>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    pub location: Location,
    pub name: XmlString,
    pub attributes: Vec<XmlAttribute>,
}

/// `<![CDATA[...]]>`; `value` holds the unescaped payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CData {
    pub location: Location,
    pub value: XmlString,
}

/// `<!--...-->`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub location: Location,
    pub value: XmlString,
}

/// A token returned by [`Parser::token`](crate::Parser::token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartElement(StartElement),
    EndElement(EndElement),
    Instruction(Instruction),
    CData(CData),
    Comment(Comment),
    /// Text between tags
    String(XmlString),
}

impl Token {
    pub fn location(&self) -> &Location {
        match self {
            Token::StartElement(t) => &t.location,
            Token::EndElement(t) => &t.location,
            Token::Instruction(t) => &t.location,
            Token::CData(t) => &t.location,
            Token::Comment(t) => &t.location,
            Token::String(t) => &t.location,
        }
    }
}
