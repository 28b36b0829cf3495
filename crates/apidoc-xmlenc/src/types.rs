//! Value types documents are built from.
//!
//! Each one remembers where it was decoded from, so later passes can point
//! diagnostics at the exact attribute or tag.

use crate::error::{Result, XmlError};
use crate::parser::Parser;
use crate::token::{CData, EndElement, StartElement, XmlAttribute, XmlName, XmlString};
use crate::value::{Attr, AttrDecoder, AttrEncoder, CharData, Element, IsEmpty, parse_bool};
use crate::XmlNode;
use apidoc_source_map::{Location, Range};
use std::fmt;

/// Provenance of an element: its span from start tag to end tag, both tag
/// names, and the usage key of the slot it was decoded into.
///
/// Flatten it into a document type to have the decoder fill it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseTag {
    pub location: Location,
    pub usage: &'static str,
    pub start_tag: XmlName,
    /// `None` for a self-closing element
    pub end_tag: Option<XmlName>,
}

impl IsEmpty for BaseTag {
    fn is_empty(&self) -> bool {
        self.start_tag.local.value.is_empty()
    }
}

impl Element for BaseTag {
    fn set_tag(&mut self, usage: &'static str, start: &StartElement, end: Option<&EndElement>) {
        self.usage = usage;
        self.start_tag = start.name.clone();
        match end {
            Some(end) => {
                self.location = Location::new(
                    start.location.uri.clone(),
                    Range::new(start.location.range.start, end.location.range.end),
                );
                self.end_tag = Some(end.name.clone());
            }
            None => {
                self.location = start.location.clone();
                self.end_tag = None;
            }
        }
    }
}

/// Provenance of an attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseAttribute {
    pub location: Location,
    pub usage: &'static str,
    pub name: XmlName,
}

impl BaseAttribute {
    pub fn set(&mut self, usage: &'static str, attr: &XmlAttribute) {
        self.location = attr.location.clone();
        self.usage = usage;
        self.name = attr.name.clone();
    }
}

fn invalid_value(attr: &XmlAttribute, message: impl Into<String>) -> XmlError {
    XmlError::InvalidValue {
        location: attr.value.location.clone(),
        field: attr.name.to_string(),
        message: message.into(),
    }
}

/// A string attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringAttribute {
    pub base: BaseAttribute,
    pub value: XmlString,
}

impl StringAttribute {
    pub fn new(value: impl Into<String>) -> Self {
        StringAttribute {
            value: XmlString {
                value: value.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn v(&self) -> &str {
        &self.value.value
    }
}

impl IsEmpty for StringAttribute {
    fn is_empty(&self) -> bool {
        self.value.value.is_empty()
    }
}

impl AttrDecoder for StringAttribute {
    fn decode_xml_attr(&mut self, _p: &Parser<'_>, attr: &XmlAttribute) -> Result<()> {
        self.value = attr.value.clone();
        Ok(())
    }
}

impl AttrEncoder for StringAttribute {
    fn encode_xml_attr(&self) -> Result<String> {
        Ok(self.value.value.clone())
    }
}

impl Attr for StringAttribute {
    fn set_attribute(&mut self, usage: &'static str, attr: &XmlAttribute) {
        self.base.set(usage, attr);
    }
}

/// An integer or a floating point number, as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl Number {
    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// The value as an integer; floats are truncated.
    pub fn int_value(&self) -> i64 {
        match *self {
            Number::Int(v) => v,
            Number::Float(v) => v as i64,
        }
    }

    pub fn float_value(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

/// Floats keep a fractional part or exponent (`2.0`, `1e20`) so they read
/// back as floats.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// A numeric attribute. Integers are tried first, then floats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberAttribute {
    pub base: BaseAttribute,
    pub value: Number,
}

impl NumberAttribute {
    pub fn new(value: Number) -> Self {
        NumberAttribute {
            value,
            ..Default::default()
        }
    }
}

impl IsEmpty for NumberAttribute {
    fn is_empty(&self) -> bool {
        self.value.float_value() == 0.0
    }
}

impl AttrDecoder for NumberAttribute {
    fn decode_xml_attr(&mut self, _p: &Parser<'_>, attr: &XmlAttribute) -> Result<()> {
        let text = attr.value.value.trim();
        if let Ok(v) = text.parse::<i64>() {
            self.value = Number::Int(v);
            return Ok(());
        }
        let v = text
            .parse::<f64>()
            .map_err(|err| invalid_value(attr, err.to_string()))?;
        self.value = Number::Float(v);
        Ok(())
    }
}

impl AttrEncoder for NumberAttribute {
    fn encode_xml_attr(&self) -> Result<String> {
        Ok(self.value.to_string())
    }
}

impl Attr for NumberAttribute {
    fn set_attribute(&mut self, usage: &'static str, attr: &XmlAttribute) {
        self.base.set(usage, attr);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolAttribute {
    pub base: BaseAttribute,
    pub value: bool,
}

impl BoolAttribute {
    pub fn new(value: bool) -> Self {
        BoolAttribute {
            value,
            ..Default::default()
        }
    }
}

impl IsEmpty for BoolAttribute {
    fn is_empty(&self) -> bool {
        !self.value
    }
}

impl AttrDecoder for BoolAttribute {
    fn decode_xml_attr(&mut self, _p: &Parser<'_>, attr: &XmlAttribute) -> Result<()> {
        self.value = parse_bool(attr.value.value.trim()).map_err(|msg| invalid_value(attr, msg))?;
        Ok(())
    }
}

impl AttrEncoder for BoolAttribute {
    fn encode_xml_attr(&self) -> Result<String> {
        Ok(self.value.to_string())
    }
}

impl Attr for BoolAttribute {
    fn set_attribute(&mut self, usage: &'static str, attr: &XmlAttribute) {
        self.base.set(usage, attr);
    }
}

/// Text of a content slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    pub location: Location,
    pub value: String,
}

impl Content {
    pub fn new(value: impl Into<String>) -> Self {
        Content {
            value: value.into(),
            ..Default::default()
        }
    }
}

impl IsEmpty for Content {
    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl CharData for Content {
    fn set_string(&mut self, value: &XmlString) -> Result<()> {
        self.location = value.location.clone();
        self.value = value.value.clone();
        Ok(())
    }

    fn set_cdata(&mut self, value: &CData) -> Result<()> {
        self.set_string(&value.value)
    }

    fn encode_chardata(&self) -> Result<String> {
        Ok(self.value.clone())
    }
}

/// Text of a cdata slot; `location` spans the whole `<![CDATA[...]]>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CDataText {
    pub location: Location,
    pub value: String,
}

impl CDataText {
    pub fn new(value: impl Into<String>) -> Self {
        CDataText {
            value: value.into(),
            ..Default::default()
        }
    }
}

impl IsEmpty for CDataText {
    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl CharData for CDataText {
    fn set_string(&mut self, value: &XmlString) -> Result<()> {
        self.location = value.location.clone();
        self.value = value.value.clone();
        Ok(())
    }

    fn set_cdata(&mut self, value: &CData) -> Result<()> {
        self.location = value.location.clone();
        self.value = value.value.value.clone();
        Ok(())
    }

    fn encode_chardata(&self) -> Result<String> {
        Ok(self.value.clone())
    }
}

/// An element with text and nothing else, such as `<title>Users</title>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, XmlNode)]
#[apidoc("string,meta,usage-string")]
pub struct TextElement {
    #[apidoc(flatten)]
    pub base: BaseTag,
    #[apidoc(",content")]
    pub content: Content,
}

impl TextElement {
    pub fn new(value: impl Into<String>) -> Self {
        TextElement {
            content: Content::new(value),
            ..Default::default()
        }
    }

    pub fn v(&self) -> &str {
        &self.content.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Token;
    use apidoc_error_reporting::DiagnosticCollector;
    use apidoc_source_map::{Block, Position, Uri};

    fn attributes(data: &str) -> Vec<XmlAttribute> {
        let block = Block::from_text(Uri::new("a.go"), data);
        let sink = DiagnosticCollector::new();
        let mut p = Parser::new(&block, &sink).unwrap();
        match p.token().unwrap() {
            Some(Token::StartElement(start)) => start.attributes,
            other => panic!("expected a start element, got {other:?}"),
        }
    }

    fn with_parser<R>(f: impl FnOnce(&Parser<'_>) -> R) -> R {
        let block = Block::from_text(Uri::new("a.go"), "");
        let sink = DiagnosticCollector::new();
        let p = Parser::new(&block, &sink).unwrap();
        f(&p)
    }

    #[test]
    fn test_number_attribute() {
        let attrs = attributes(r#"<a n="12" f="1.5" bad="1x"/>"#);
        with_parser(|p| {
            let mut num = NumberAttribute::default();
            num.decode_xml_attr(p, &attrs[0]).unwrap();
            assert_eq!(num.value, Number::Int(12));
            assert_eq!(num.encode_xml_attr().unwrap(), "12");

            num.decode_xml_attr(p, &attrs[1]).unwrap();
            assert!(num.value.is_float());
            assert_eq!(num.value.int_value(), 1);
            assert_eq!(num.encode_xml_attr().unwrap(), "1.5");

            assert_eq!(Number::Float(2.0).to_string(), "2.0");
            assert_eq!(Number::Float(1e20).to_string(), "1e20");
            assert_eq!(Number::Int(2).to_string(), "2");

            let err = num.decode_xml_attr(p, &attrs[2]).unwrap_err();
            assert_eq!(err.code(), "A-1-7");
            assert_eq!(err.field(), "bad");
            assert_eq!(
                err.location().map(|l| l.range),
                Some(Range::new(Position::new(0, 23), Position::new(0, 25)))
            );
        });
    }

    #[test]
    fn test_bool_and_string_attributes() {
        let attrs = attributes(r#"<a deprecated="true" name="x &lt; y"/>"#);
        with_parser(|p| {
            let mut flag = BoolAttribute::default();
            assert!(flag.is_empty());
            flag.decode_xml_attr(p, &attrs[0]).unwrap();
            flag.set_attribute("usage-deprecated", &attrs[0]);
            assert!(flag.value);
            assert_eq!(flag.base.usage, "usage-deprecated");
            assert_eq!(flag.base.name.local.value, "deprecated");

            let mut name = StringAttribute::default();
            name.decode_xml_attr(p, &attrs[1]).unwrap();
            assert_eq!(name.v(), "x < y");
            assert_eq!(name.encode_xml_attr().unwrap(), "x < y");
        });
    }

    #[test]
    fn test_base_tag() {
        let block = Block::from_text(Uri::new("a.go"), "<title>x</title><br/>");
        let sink = DiagnosticCollector::new();
        let mut p = Parser::new(&block, &sink).unwrap();
        let mut tokens = std::iter::from_fn(|| p.token().unwrap());
        let (Some(Token::StartElement(start)), _, Some(Token::EndElement(end))) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            panic!("unexpected tokens");
        };

        let mut tag = BaseTag::default();
        assert!(tag.is_empty());
        tag.set_tag("usage-title", &start, Some(&end));
        assert!(!tag.is_empty());
        assert_eq!(
            tag.location.range,
            Range::new(Position::new(0, 0), Position::new(0, 16))
        );
        assert_eq!(tag.end_tag.as_ref().map(|n| n.to_string()), Some("title".into()));

        let Some(Token::StartElement(br)) = tokens.next() else {
            panic!("expected <br/>");
        };
        tag.set_tag("usage-br", &br, None);
        assert_eq!(tag.location, br.location);
        assert!(tag.end_tag.is_none());
    }

    #[test]
    fn test_text_element_node() {
        let mut elem = TextElement::new("Users");
        {
            let node = elem.node();
            assert_eq!(node.meta.map(|m| m.name), Some("string"));
            assert!(node.content.is_some());
            assert!(node.attributes.is_empty() && node.elements.is_empty());
        }
        assert!(!elem.is_empty());
        elem.content.value.clear();
        assert!(elem.is_empty());
    }
}
