//! Capabilities the codec looks for on document values.
//!
//! The decoder and encoder only ever see values as trait objects. A type
//! takes part as an element by implementing [`Element`] (normally through
//! `#[derive(XmlNode)]`), as an attribute by implementing [`Attr`], and as
//! the text of a cdata or content slot by implementing [`CharData`].

use crate::decode::read_text;
use crate::error::{Result, XmlError};
use crate::parser::Parser;
use crate::schema::{DecodeNode, EncodeNode, Node};
use crate::token::{CData, EndElement, StartElement, XmlAttribute, XmlString};

/// Whether a value counts as absent for omitempty checks.
pub trait IsEmpty {
    fn is_empty(&self) -> bool;
}

/// Reads an attribute value.
pub trait AttrDecoder {
    /// Errors are reported and decoding goes on with the next attribute.
    fn decode_xml_attr(&mut self, p: &Parser<'_>, attr: &XmlAttribute) -> Result<()>;
}

/// Renders an attribute value, without quotes or escaping.
pub trait AttrEncoder {
    fn encode_xml_attr(&self) -> Result<String>;
}

/// Decodes a whole element by hand.
pub trait Decoder {
    /// Read the element's content and its end tag from `p`.
    ///
    /// Not called for self-closing elements. The returned end tag becomes
    /// part of the value's provenance. An error aborts the enclosing
    /// decode.
    fn decode_xml(&mut self, p: &mut Parser<'_>, start: &StartElement)
    -> Result<Option<EndElement>>;
}

/// Renders the text of an element that is written as `<name>text</name>`.
pub trait Encoder {
    /// The text only, unescaped and without the tags.
    fn encode_xml(&self) -> Result<String>;
}

/// Checks a value once it has been decoded and reports what is wrong with
/// it through [`Parser::error`] or [`Parser::warning`].
pub trait Sanitizer {
    fn sanitize(&mut self, p: &Parser<'_>);
}

/// A value that can sit in an attribute slot.
pub trait Attr: AttrDecoder + AttrEncoder + IsEmpty {
    /// Record where the value came from.
    fn set_attribute(&mut self, _usage: &'static str, _attr: &XmlAttribute) {}

    fn as_sanitizer(&mut self) -> Option<&mut dyn Sanitizer> {
        None
    }
}

/// A value that can sit in an element slot or be a document root.
pub trait Element: IsEmpty {
    /// The schema, bound to this value's fields.
    fn node_mut(&mut self) -> DecodeNode<'_> {
        Node::new()
    }

    fn node(&self) -> EncodeNode<'_> {
        Node::new()
    }

    fn as_decoder(&mut self) -> Option<&mut dyn Decoder> {
        None
    }

    fn as_encoder(&self) -> Option<&dyn Encoder> {
        None
    }

    fn as_sanitizer(&mut self) -> Option<&mut dyn Sanitizer> {
        None
    }

    /// Repeated elements: one slot decodes and encodes many items.
    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        None
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        None
    }

    /// Record the tags the value was decoded from. `end` is `None` for a
    /// self-closing element.
    fn set_tag(&mut self, _usage: &'static str, _start: &StartElement, _end: Option<&EndElement>) {}
}

/// A growable list of elements.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> &dyn Element;

    /// Append a default item and hand it out for decoding.
    fn push_default(&mut self) -> &mut dyn Element;

    fn truncate(&mut self, len: usize);
}

/// The value of a cdata or content slot.
pub trait CharData: IsEmpty {
    fn set_string(&mut self, value: &XmlString) -> Result<()>;

    fn set_cdata(&mut self, value: &CData) -> Result<()>;

    fn encode_chardata(&self) -> Result<String>;
}

impl<T: IsEmpty> IsEmpty for Option<T> {
    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(IsEmpty::is_empty)
    }
}

impl<T: AttrDecoder + Default> AttrDecoder for Option<T> {
    fn decode_xml_attr(&mut self, p: &Parser<'_>, attr: &XmlAttribute) -> Result<()> {
        self.get_or_insert_with(T::default).decode_xml_attr(p, attr)
    }
}

impl<T: AttrEncoder> AttrEncoder for Option<T> {
    fn encode_xml_attr(&self) -> Result<String> {
        match self {
            Some(value) => value.encode_xml_attr(),
            None => Ok(String::new()),
        }
    }
}

impl<T: Attr + Default> Attr for Option<T> {
    fn set_attribute(&mut self, usage: &'static str, attr: &XmlAttribute) {
        Attr::set_attribute(self.get_or_insert_with(T::default), usage, attr);
    }

    fn as_sanitizer(&mut self) -> Option<&mut dyn Sanitizer> {
        self.as_mut().and_then(Attr::as_sanitizer)
    }
}

// Optional children come into existence the first time the decoder
// touches them.
impl<T: Element + Default> Element for Option<T> {
    fn node_mut(&mut self) -> DecodeNode<'_> {
        Element::node_mut(self.get_or_insert_with(T::default))
    }

    fn node(&self) -> EncodeNode<'_> {
        self.as_ref().map(Element::node).unwrap_or_default()
    }

    fn as_decoder(&mut self) -> Option<&mut dyn Decoder> {
        Element::as_decoder(self.get_or_insert_with(T::default))
    }

    fn as_encoder(&self) -> Option<&dyn Encoder> {
        self.as_ref().and_then(Element::as_encoder)
    }

    fn as_sanitizer(&mut self) -> Option<&mut dyn Sanitizer> {
        self.as_mut().and_then(Element::as_sanitizer)
    }

    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        Element::as_sequence_mut(self.get_or_insert_with(T::default))
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        self.as_ref().and_then(Element::as_sequence)
    }

    fn set_tag(&mut self, usage: &'static str, start: &StartElement, end: Option<&EndElement>) {
        Element::set_tag(self.get_or_insert_with(T::default), usage, start, end);
    }
}

impl<T: CharData + Default> CharData for Option<T> {
    fn set_string(&mut self, value: &XmlString) -> Result<()> {
        self.get_or_insert_with(T::default).set_string(value)
    }

    fn set_cdata(&mut self, value: &CData) -> Result<()> {
        self.get_or_insert_with(T::default).set_cdata(value)
    }

    fn encode_chardata(&self) -> Result<String> {
        match self {
            Some(value) => value.encode_chardata(),
            None => Ok(String::new()),
        }
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Element + Default> Element for Vec<T> {
    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        Some(self)
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        Some(self)
    }
}

impl<T: Element + Default> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn item(&self, index: usize) -> &dyn Element {
        &self[index]
    }

    fn push_default(&mut self) -> &mut dyn Element {
        self.push(T::default());
        let last = Vec::len(self) - 1;
        &mut self[last]
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }
}

/// Text forms of the scalar types.
trait Scalar: Sized {
    fn parse_text(text: &str) -> std::result::Result<Self, String>;
}

macro_rules! parsed_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            fn parse_text(text: &str) -> std::result::Result<Self, String> {
                text.trim().parse::<$ty>().map_err(|err| err.to_string())
            }
        }
    )*};
}

parsed_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Scalar for bool {
    fn parse_text(text: &str) -> std::result::Result<Self, String> {
        parse_bool(text.trim())
    }
}

impl Scalar for String {
    fn parse_text(text: &str) -> std::result::Result<Self, String> {
        Ok(text.to_string())
    }
}

/// Accepts `1`, `t`, `T`, `true`, `TRUE`, `True` and the matching false
/// spellings.
pub(crate) fn parse_bool(text: &str) -> std::result::Result<bool, String> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(format!("`{text}` is not a boolean")),
    }
}

fn parse_scalar<T: Scalar>(text: &XmlString, field: &str) -> Result<T> {
    T::parse_text(&text.value).map_err(|message| XmlError::InvalidValue {
        location: text.location.clone(),
        field: field.to_string(),
        message,
    })
}

// Scalars decode from attributes, from `<name>text</name>` elements and
// from cdata or content slots.
macro_rules! scalar_capabilities {
    ($($ty:ty),* $(,)?) => {$(
        impl IsEmpty for $ty {
            fn is_empty(&self) -> bool {
                *self == <$ty>::default()
            }
        }

        impl AttrDecoder for $ty {
            fn decode_xml_attr(&mut self, _p: &Parser<'_>, attr: &XmlAttribute) -> Result<()> {
                *self = parse_scalar(&attr.value, &attr.name.to_string())?;
                Ok(())
            }
        }

        impl AttrEncoder for $ty {
            fn encode_xml_attr(&self) -> Result<String> {
                Ok(self.to_string())
            }
        }

        impl Attr for $ty {}

        impl Decoder for $ty {
            fn decode_xml(
                &mut self,
                p: &mut Parser<'_>,
                start: &StartElement,
            ) -> Result<Option<EndElement>> {
                let (text, end) = read_text(p, start)?;
                match parse_scalar(&text, &start.name.to_string()) {
                    Ok(value) => *self = value,
                    Err(err) => p.error(err),
                }
                Ok(Some(end))
            }
        }

        impl Encoder for $ty {
            fn encode_xml(&self) -> Result<String> {
                Ok(self.to_string())
            }
        }

        impl Element for $ty {
            fn as_decoder(&mut self) -> Option<&mut dyn Decoder> {
                Some(self)
            }

            fn as_encoder(&self) -> Option<&dyn Encoder> {
                Some(self)
            }
        }

        impl CharData for $ty {
            fn set_string(&mut self, value: &XmlString) -> Result<()> {
                *self = parse_scalar(value, "content")?;
                Ok(())
            }

            fn set_cdata(&mut self, value: &CData) -> Result<()> {
                *self = parse_scalar(&value.value, "cdata")?;
                Ok(())
            }

            fn encode_chardata(&self) -> Result<String> {
                Ok(self.to_string())
            }
        }
    )*};
}

scalar_capabilities!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String,
);

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_error_reporting::DiagnosticCollector;
    use apidoc_source_map::{Block, Location, Position, Range, Uri};

    fn text(value: &str) -> XmlString {
        XmlString {
            location: Location::new(
                Uri::new("a.go"),
                Range::new(Position::new(0, 3), Position::new(0, 5)),
            ),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_scalar_emptiness() {
        assert!(IsEmpty::is_empty(&0u32));
        assert!(!IsEmpty::is_empty(&1u32));
        assert!(IsEmpty::is_empty(&0.0f64));
        assert!(IsEmpty::is_empty(&false));
        assert!(IsEmpty::is_empty(&String::new()));
        assert!(IsEmpty::is_empty(&None::<u32>));
        assert!(IsEmpty::is_empty(&Some(0u32)));
        assert!(!IsEmpty::is_empty(&Some(3u32)));
        assert!(IsEmpty::is_empty(&Vec::<u32>::new()));
        assert!(!IsEmpty::is_empty(&vec![0u32]));
    }

    #[test]
    fn test_scalar_char_data() {
        let mut n = 0i64;
        n.set_string(&text(" 42\n")).unwrap();
        assert_eq!(n, 42);

        let mut s = String::new();
        s.set_string(&text(" kept ")).unwrap();
        assert_eq!(s, " kept ");

        let err = n.set_string(&text("4x")).unwrap_err();
        let XmlError::InvalidValue {
            location, field, ..
        } = err
        else {
            panic!("expected an invalid value error");
        };
        assert_eq!(field, "content");
        assert_eq!(location.range.start, Position::new(0, 3));
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(parse_bool("T"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("yes").is_err());

        let mut b = false;
        b.set_string(&text(" True ")).unwrap();
        assert!(b);
    }

    #[test]
    fn test_scalar_attribute() {
        let block = Block::from_text(Uri::new("a.go"), r#"<a id="12" bad="x"/>"#);
        let sink = DiagnosticCollector::new();
        let mut p = Parser::new(&block, &sink).unwrap();
        let Some(crate::Token::StartElement(start)) = p.token().unwrap() else {
            panic!("expected a start element");
        };

        let mut id = 0u16;
        id.decode_xml_attr(&p, &start.attributes[0]).unwrap();
        assert_eq!(id, 12);
        assert_eq!(id.encode_xml_attr().unwrap(), "12");

        let err = id.decode_xml_attr(&p, &start.attributes[1]).unwrap_err();
        assert_eq!(err.field(), "bad");
        assert_eq!(id, 12);
    }

    #[test]
    fn test_option_materializes() {
        let mut v: Option<u32> = None;
        assert!(Element::as_encoder(&v).is_none());
        assert!(Element::as_decoder(&mut v).is_some());
        assert_eq!(v, Some(0));

        let v: Option<u32> = None;
        assert_eq!(v.encode_xml_attr().unwrap(), "");
        assert_eq!(v.encode_chardata().unwrap(), "");
    }

    #[test]
    fn test_vec_sequence() {
        let mut v: Vec<String> = vec!["a".to_string()];
        {
            let seq = Element::as_sequence_mut(&mut v).unwrap();
            assert_eq!(seq.len(), 1);
            let item = seq.push_default();
            assert!(item.is_empty());
            seq.truncate(1);
        }
        assert_eq!(v, vec!["a".to_string()]);

        let seq = Element::as_sequence(&v).unwrap();
        let text = seq.item(0).as_encoder().unwrap().encode_xml().unwrap();
        assert_eq!(text, "a");
    }
}
