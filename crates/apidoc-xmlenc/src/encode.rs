//! Encoding a value tree back into markup.

use crate::error::{Result, XmlError};
use crate::options::EncodeOptions;
use crate::parser::CDATA_END;
use crate::schema::EncodeNode;
use crate::value::Element;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Encode `v` as a document whose root is named by `v`'s meta descriptor.
///
/// `indent` is either empty (no line breaks) or one character repeated,
/// such as `"\t"` or four spaces. With a non-empty `namespace` the root
/// element declares it, bound to `prefix` when that is not empty, and
/// every element and attribute name carries the prefix.
///
/// # Panics
///
/// When `prefix` is given without a `namespace`.
pub fn encode(indent: &str, v: &dyn Element, namespace: &str, prefix: &str) -> Result<Vec<u8>> {
    assert!(
        prefix.is_empty() || !namespace.is_empty(),
        "prefix `{prefix}` needs a namespace"
    );

    let writer = match indent_unit(indent)? {
        Some((ch, size)) => Writer::new_with_indent(Vec::new(), ch, size),
        None => Writer::new(Vec::new()),
    };

    let node = v.node();
    let Some(meta) = node.meta else {
        return Err(XmlError::Encode {
            message: "the root value has no element name".to_string(),
        });
    };

    let mut encoding = Encoding { writer, prefix };
    encoding.node(meta.name, &node, Some(namespace))?;
    Ok(encoding.writer.into_inner())
}

/// [`encode`] with indent, namespace and prefix taken from `options`.
pub fn encode_with(v: &dyn Element, options: &EncodeOptions) -> Result<Vec<u8>> {
    encode(&options.indent, v, &options.namespace, &options.prefix)
}

fn indent_unit(indent: &str) -> Result<Option<(u8, usize)>> {
    let bytes = indent.as_bytes();
    match bytes.first() {
        None => Ok(None),
        Some(&first) if bytes.iter().all(|&b| b == first) && first.is_ascii() => {
            Ok(Some((first, bytes.len())))
        }
        Some(_) => Err(XmlError::Encode {
            message: format!("indent {indent:?} must repeat a single character"),
        }),
    }
}

fn write_failed(err: impl std::fmt::Display) -> XmlError {
    XmlError::Encode {
        message: err.to_string(),
    }
}

struct Encoding<'e> {
    writer: Writer<Vec<u8>>,
    prefix: &'e str,
}

impl Encoding<'_> {
    fn name(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_failed)
    }

    /// Write `<name>text</name>`.
    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> Result<()> {
        let end = start.to_end().into_owned();
        self.write(Event::Start(start))?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.write(Event::End(end))
    }

    /// Encode a node. `namespace` is `Some` for the root only.
    fn node(&mut self, name: &str, node: &EncodeNode<'_>, namespace: Option<&str>) -> Result<()> {
        let name = self.name(name);
        let mut start = BytesStart::new(name.as_str());

        for slot in &node.attributes {
            if slot.omitempty && slot.value.is_empty() {
                continue;
            }
            let value = slot.value.encode_xml_attr()?;
            start.push_attribute((self.name(slot.name).as_str(), value.as_str()));
        }

        if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
            let xmlns = if self.prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", self.prefix)
            };
            start.push_attribute((xmlns.as_str(), namespace));
        }

        if let Some(slot) = &node.cdata {
            if !(slot.omitempty && slot.value.is_empty()) {
                let text = slot.value.encode_chardata()?;
                let escaped = text.replace(CDATA_END, crate::parser::CDATA_ESCAPE);
                self.write(Event::Start(start))?;
                self.write(Event::CData(BytesCData::new(escaped)))?;
                return self.write(Event::End(BytesEnd::new(name)));
            }
        }

        if let Some(slot) = &node.content {
            if !(slot.omitempty && slot.value.is_empty()) {
                let text = slot.value.encode_chardata()?;
                return self.text_element(start, &text);
            }
        }

        let children: Vec<_> = node
            .elements
            .iter()
            .filter(|slot| !(slot.omitempty && slot.value.is_empty()))
            .collect();
        if children.is_empty() {
            return self.write(Event::Empty(start));
        }

        self.write(Event::Start(start))?;
        for slot in children {
            self.element(slot.name, slot.value)?;
        }
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Encode the value of an element slot that is not omitted.
    fn element(&mut self, name: &str, v: &dyn Element) -> Result<()> {
        if let Some(encoder) = v.as_encoder() {
            let text = encoder.encode_xml()?;
            let start = BytesStart::new(self.name(name));
            return self.text_element(start, &text);
        }

        if let Some(seq) = v.as_sequence() {
            for index in 0..seq.len() {
                self.element(name, seq.item(index))?;
            }
            return Ok(());
        }

        self.node(name, &v.node(), None)
    }
}
