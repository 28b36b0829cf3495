//! Decoding a token stream into a value tree.

use crate::error::XmlError;
use crate::options::DecodeOptions;
use crate::parser::Parser;
use crate::schema::DecodeNode;
use crate::token::{EndElement, StartElement, Token, XmlString};
use crate::value::{Element, Sequence};
use apidoc_source_map::Location;

/// Decode the document read by `p` into `v`.
///
/// `namespace`, when not empty, selects the prefix that names must carry:
/// the prefix bound to it by an `xmlns:prefix` attribute of the root
/// element. Nothing is returned; every problem goes to the parser's
/// diagnostic sink, and whatever was decoded before a fatal error stays in
/// `v`.
pub fn decode(p: &mut Parser<'_>, v: &mut dyn Element, namespace: &str) {
    let mut has_root = false;
    loop {
        let token = match p.token() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(err) => {
                p.error(err);
                return;
            }
        };

        match token {
            Token::StartElement(start) => {
                if has_root {
                    // Only the extent of the extra root matters here.
                    if let Err(err) = p.end_element(&start) {
                        tracing::debug!(error = %err, "cannot find the end of a second root");
                    }
                    tracing::debug!(root = %start.name, "second root element, decoding stops");
                    let location = p.location(start.location.range.start, p.position());
                    p.warning(XmlError::MultipleRootTag {
                        location,
                        field: start.name.to_string(),
                    });
                    return;
                }
                has_root = true;

                let usage = v.node().meta.map_or("", |meta| meta.usage);
                let mut decoding = Decoding {
                    prefix: find_prefix(&start, namespace),
                    p: &mut *p,
                };
                if decoding.element(&start, &mut *v, usage).is_err() {
                    return;
                }
            }
            Token::Comment(_) | Token::String(_) | Token::Instruction(_) => {}
            other => {
                p.error(XmlError::InvalidXml {
                    location: other.location().clone(),
                    field: String::new(),
                });
                return;
            }
        }
    }
}

/// [`decode`] with the namespace taken from `options`.
pub fn decode_with(p: &mut Parser<'_>, v: &mut dyn Element, options: &DecodeOptions) {
    decode(p, v, &options.namespace);
}

/// Read the text of `<name>text</name>` up to and including the end tag.
///
/// Text and CDATA sections are joined and comments skipped; a child
/// element is an error. Helps [`Decoder`](crate::Decoder) implementations
/// of leaf values.
pub fn read_text(p: &mut Parser<'_>, start: &StartElement) -> crate::Result<(XmlString, EndElement)> {
    let after_start = start.location.range.end;
    let mut text = XmlString {
        location: p.location(after_start, after_start),
        value: String::new(),
    };

    loop {
        let piece = match p.token()? {
            None => {
                return Err(XmlError::NotFoundEndTag {
                    location: start.location.clone(),
                    field: start.name.to_string(),
                });
            }
            Some(Token::EndElement(end)) if start.matches(&end) => return Ok((text, end)),
            Some(Token::String(s)) => s,
            Some(Token::CData(cdata)) => cdata.value,
            Some(Token::Comment(_)) => continue,
            Some(other) => {
                return Err(XmlError::InvalidXml {
                    location: other.location().clone(),
                    field: start.name.to_string(),
                });
            }
        };

        if text.value.is_empty() {
            text.location.range.start = piece.location.range.start;
        }
        text.location.range.end = piece.location.range.end;
        text.value.push_str(&piece.value);
    }
}

/// The decode was given up; the cause is already with the sink.
struct Abort;

type Step<T = ()> = std::result::Result<T, Abort>;

/// State of one decode call.
struct Decoding<'p, 'a> {
    p: &'p mut Parser<'a>,
    /// Prefix every element and attribute name must carry
    prefix: String,
}

impl Decoding<'_, '_> {
    fn fail(&self, err: XmlError) -> Abort {
        self.p.error(err);
        Abort
    }

    fn element(&mut self, start: &StartElement, v: &mut dyn Element, usage: &'static str) -> Step {
        if let Some(seq) = v.as_sequence_mut() {
            return self.sequence_item(start, seq, usage);
        }

        tracing::trace!(element = %start.name, "decoding element");
        let end = match v.as_decoder() {
            Some(_) if start.self_close => None,
            Some(decoder) => decoder
                .decode_xml(self.p, start)
                .map_err(|err| self.fail(err))?,
            None => self.node(start, v.node_mut())?,
        };

        v.set_tag(usage, start, end.as_ref());
        if let Some(sanitizer) = v.as_sanitizer() {
            sanitizer.sanitize(self.p);
        }
        Ok(())
    }

    /// Decode one more item of a repeated element; a failed item is not
    /// kept.
    fn sequence_item(&mut self, start: &StartElement, seq: &mut dyn Sequence, usage: &'static str) -> Step {
        let len = seq.len();
        let result = self.element(start, seq.push_default(), usage);
        if result.is_err() {
            seq.truncate(len);
        }
        result
    }

    fn node(&mut self, start: &StartElement, mut node: DecodeNode<'_>) -> Step<Option<EndElement>> {
        self.attributes(start, &mut node);

        if start.self_close {
            self.check_omitempty(&node, &start.location);
            return Ok(None);
        }

        let end = self.children(start, &mut node)?;
        let span = self.p.location(start.location.range.start, end.location.range.end);
        self.check_omitempty(&node, &span);
        Ok(Some(end))
    }

    fn attributes(&mut self, start: &StartElement, node: &mut DecodeNode<'_>) {
        for attr in &start.attributes {
            if attr.name.prefix_str() != self.prefix {
                continue;
            }
            let Some(slot) = node.attribute_mut(&attr.name.local.value) else {
                continue;
            };

            if let Err(err) = slot.value.decode_xml_attr(self.p, attr) {
                self.p.error(err);
            }
            slot.value.set_attribute(slot.usage, attr);
            if let Some(sanitizer) = slot.value.as_sanitizer() {
                sanitizer.sanitize(self.p);
            }
        }
    }

    fn children(&mut self, start: &StartElement, node: &mut DecodeNode<'_>) -> Step<EndElement> {
        loop {
            let token = match self.p.token() {
                Ok(Some(token)) => token,
                Ok(None) => {
                    let at = self.p.position();
                    let location = self.p.location(at, at);
                    return Err(self.fail(XmlError::NotFoundEndTag {
                        location,
                        field: start.name.to_string(),
                    }));
                }
                Err(err) => return Err(self.fail(err)),
            };

            match token {
                Token::EndElement(end) => {
                    if end.name.is(&self.prefix, &start.name.local.value) {
                        return Ok(end);
                    }
                    return Err(self.fail(XmlError::NotFoundEndTag {
                        location: end.location,
                        field: start.name.to_string(),
                    }));
                }
                Token::CData(cdata) => {
                    if let Some(slot) = node.cdata.as_mut() {
                        if let Err(err) = slot.value.set_cdata(&cdata) {
                            self.p.error(err);
                        }
                    }
                }
                Token::String(text) => {
                    if let Some(slot) = node.content.as_mut() {
                        if let Err(err) = slot.value.set_string(&text) {
                            self.p.error(err);
                        }
                    }
                }
                Token::StartElement(child) => {
                    let slot = if child.name.prefix_str() == self.prefix {
                        node.element_mut(&child.name.local.value)
                    } else {
                        None
                    };
                    match slot {
                        Some(slot) => self.element(&child, &mut *slot.value, slot.usage)?,
                        None => self.skip_unknown(&child)?,
                    }
                }
                Token::Comment(_) => {}
                Token::Instruction(instruction) => {
                    return Err(self.fail(XmlError::InvalidXml {
                        location: instruction.location,
                        field: String::new(),
                    }));
                }
            }
        }
    }

    fn skip_unknown(&mut self, child: &StartElement) -> Step {
        self.p.end_element(child).map_err(|err| self.fail(err))?;

        tracing::debug!(element = %child.name, "skipping unknown element");
        let location = self.p.location(child.location.range.start, self.p.position());
        self.p.warning(XmlError::InvalidTag {
            location,
            field: child.name.to_string(),
        });
        Ok(())
    }

    /// Report every required slot left empty, at the element's span.
    fn check_omitempty(&self, node: &DecodeNode<'_>, location: &Location) {
        let required = |omitempty: bool, empty: bool| !omitempty && empty;

        let attributes = node
            .attributes
            .iter()
            .filter(|s| required(s.omitempty, s.value.is_empty()))
            .map(|s| s.name);
        let elements = node
            .elements
            .iter()
            .filter(|s| required(s.omitempty, s.value.is_empty()))
            .map(|s| s.name);
        let cdata = node
            .cdata
            .iter()
            .filter(|s| required(s.omitempty, s.value.is_empty()))
            .map(|s| if s.name.is_empty() { "cdata" } else { s.name });
        let content = node
            .content
            .iter()
            .filter(|s| required(s.omitempty, s.value.is_empty()))
            .map(|s| if s.name.is_empty() { "content" } else { s.name });

        for field in attributes.chain(elements).chain(cdata).chain(content) {
            self.p.error(XmlError::IsEmpty {
                location: location.clone(),
                field: field.to_string(),
            });
        }
    }
}

fn find_prefix(start: &StartElement, namespace: &str) -> String {
    if namespace.is_empty() {
        return String::new();
    }
    start
        .attributes
        .iter()
        .find(|attr| attr.name.prefix_str() == "xmlns" && attr.value.value == namespace)
        .map(|attr| attr.name.local.value.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseTag, CDataText, TextElement};
    use crate::value::Sanitizer;
    use crate::XmlNode;
    use apidoc_error_reporting::{
        DiagnosticCollector, DiagnosticMessage, DiagnosticMessageBuilder, DiagnosticSink,
    };
    use apidoc_source_map::{Block, Uri};

    #[derive(Debug, Default, XmlNode)]
    #[apidoc("a,meta,usage-a")]
    struct Api {
        #[apidoc(flatten)]
        base: BaseTag,
        #[apidoc("id,attr,usage-id")]
        id: u32,
        #[apidoc("known,elem,usage-known,omitempty")]
        known: Option<u32>,
    }

    #[derive(Debug, Default, XmlNode)]
    #[apidoc("a,meta,usage-a")]
    struct OptionalId {
        #[apidoc(flatten)]
        base: BaseTag,
        #[apidoc("id,attr,usage-id,omitempty")]
        id: u32,
    }

    #[derive(Debug, Default, XmlNode)]
    #[apidoc("code,meta,usage-code")]
    struct Code {
        #[apidoc(flatten)]
        base: BaseTag,
        #[apidoc(",cdata")]
        text: CDataText,
    }

    #[derive(Debug, Default, XmlNode)]
    #[apidoc("list,meta,usage-list")]
    struct List {
        #[apidoc("item,elem,usage-item,omitempty")]
        items: Vec<TextElement>,
        #[apidoc("tag,elem,usage-tag,omitempty")]
        tags: Vec<String>,
    }

    #[derive(Debug, Default, XmlNode)]
    #[apidoc("limit,meta,usage-limit")]
    #[apidoc(sanitize)]
    struct Limit {
        #[apidoc(flatten)]
        base: BaseTag,
        #[apidoc("max,attr,usage-max")]
        max: u32,
    }

    impl Sanitizer for Limit {
        fn sanitize(&mut self, p: &Parser<'_>) {
            if self.max > 100 {
                p.sink().warning(
                    DiagnosticMessageBuilder::warning("Limit too large")
                        .with_location(self.base.location.clone())
                        .build(),
                );
                self.max = 100;
            }
        }
    }

    fn run<T: Element + Default>(data: &str, namespace: &str) -> (T, DiagnosticCollector) {
        let block = Block::from_text(Uri::new("file:///doc.go"), data);
        let sink = DiagnosticCollector::new();
        let mut v = T::default();
        {
            let mut p = Parser::new(&block, &sink).unwrap();
            decode(&mut p, &mut v, namespace);
        }
        (v, sink)
    }

    /// `code field line:col-line:col` for each diagnostic.
    fn summary(diags: &[DiagnosticMessage]) -> Vec<String> {
        diags
            .iter()
            .map(|d| {
                let mut line = format!(
                    "{} {}",
                    d.code.as_deref().unwrap_or("-"),
                    d.field.as_deref().unwrap_or("-")
                );
                if let Some(loc) = &d.location {
                    let r = loc.range;
                    line.push_str(&format!(
                        " {}:{}-{}:{}",
                        r.start.line, r.start.character, r.end.line, r.end.character
                    ));
                }
                line
            })
            .collect()
    }

    #[test]
    fn test_self_closing_root() {
        let (api, sink) = run::<Api>(r#"<a id="5"/>"#, "");
        assert!(sink.is_empty(), "{:?}", sink.diagnostics());
        assert_eq!(api.id, 5);
        assert_eq!(api.known, None);
        assert_eq!(api.base.usage, "usage-a");
        assert_eq!(api.base.start_tag.local.value, "a");
        assert_eq!(api.base.end_tag, None);
    }

    #[test]
    fn test_required_attribute() {
        let (_, sink) = run::<Api>("<a></a>", "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-3 id 0:0-0:7"]);

        let (_, sink) = run::<OptionalId>("<a></a>", "");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unknown_element_is_skipped() {
        let (api, sink) = run::<Api>(r#"<a id="1"><unknown>x</unknown><known>1</known></a>"#, "");
        assert!(!sink.has_errors());
        assert_eq!(summary(&sink.warnings()), vec!["A-1-5 unknown 0:10-0:30"]);
        assert_eq!(api.known, Some(1));
        assert_eq!(api.base.end_tag.map(|n| n.local.value), Some("a".to_string()));
    }

    #[test]
    fn test_unclosed_unknown_element_rewinds() {
        let (api, sink) = run::<Api>(r#"<a id="1"><u><known>2</known></a>"#, "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-2 u 0:10-0:13"]);
        assert_eq!(summary(&sink.warnings()), vec!["A-1-5 u 0:10-0:13"]);
        assert_eq!(api.id, 1);
        assert_eq!(api.known, Some(2));
        assert_eq!(api.base.end_tag.map(|n| n.local.value), Some("a".to_string()));
    }

    #[test]
    fn test_multiple_roots() {
        let (api, sink) = run::<Api>(r#"<a id="1"/><a id="2"/>"#, "");
        assert_eq!(summary(&sink.warnings()), vec!["A-1-4 a 0:11-0:22"]);
        assert!(!sink.has_errors());
        assert_eq!(api.id, 1);

        let (single, _) = run::<OptionalId>("<a/>", "");
        let (double, sink) = run::<OptionalId>("<a/><a/>", "");
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(single.base, double.base);
    }

    #[test]
    fn test_namespace_prefix() {
        let data = r#"<aa:a xmlns:aa="urn:apidoc" aa:id="3" id="9"><aa:known>4</aa:known><known>5</known></aa:a>"#;

        let (api, sink) = run::<Api>(data, "urn:apidoc");
        assert!(!sink.has_errors(), "{:?}", sink.errors());
        assert_eq!(summary(&sink.warnings()), vec!["A-1-5 known 0:67-0:83"]);
        assert_eq!(api.id, 3);
        assert_eq!(api.known, Some(4));

        // Unbound namespace: unprefixed names match and the root's end tag does not.
        let (api, sink) = run::<Api>(data, "urn:other");
        assert_eq!(api.id, 9);
        assert_eq!(api.known, Some(5));
        assert_eq!(summary(&sink.warnings()), vec!["A-1-5 aa:known 0:45-0:67"]);
        assert_eq!(summary(&sink.errors()), vec!["A-1-2 aa:a 0:83-0:90"]);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let (api, sink) = run::<Api>(r#"<a id="1"><known>1</known></b>"#, "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-2 a 0:26-0:30"]);
        assert_eq!(api.known, Some(1));
        // Aborted before the tag was recorded.
        assert_eq!(api.base.usage, "");
    }

    #[test]
    fn test_missing_end_tag() {
        let (_, sink) = run::<Api>(r#"<a id="1">"#, "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-2 a 0:10-0:10"]);
    }

    #[test]
    fn test_invalid_tokens() {
        let (_, sink) = run::<Api>(r#"<a id="1"><?x?></a>"#, "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-1 - 0:10-0:15"]);

        let (_, sink) = run::<Api>("</a>", "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-1 - 0:0-0:4"]);

        let (api, sink) = run::<Api>("<?xml version=\"1.0\"?>\n<!-- c -->\n<a id=\"2\"/>\n", "");
        assert!(sink.is_empty(), "{:?}", sink.diagnostics());
        assert_eq!(api.id, 2);
    }

    #[test]
    fn test_invalid_attribute_value() {
        let (api, sink) = run::<Api>(r#"<a id="x"/>"#, "");
        assert_eq!(
            summary(&sink.errors()),
            vec!["A-1-7 id 0:7-0:8", "A-1-3 id 0:0-0:11"]
        );
        assert_eq!(api.id, 0);
    }

    #[test]
    fn test_cdata_slot() {
        let (code, sink) = run::<Code>("<code><![CDATA[a]]]]><![CDATA[>b]]></code>", "");
        assert!(sink.is_empty(), "{:?}", sink.diagnostics());
        assert_eq!(code.text.value, "a]]>b");

        let (_, sink) = run::<Code>("<code>  </code>", "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-3 cdata 0:0-0:15"]);
    }

    #[test]
    fn test_sequences() {
        let (list, sink) = run::<List>("<list><item>a</item><tag>x</tag><item>b</item><tag>y</tag></list>", "");
        assert!(sink.is_empty(), "{:?}", sink.diagnostics());
        let items: Vec<&str> = list.items.iter().map(TextElement::v).collect();
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(list.tags, vec!["x", "y"]);
        assert_eq!(list.items[1].base.usage, "usage-item");
    }

    #[test]
    fn test_failed_item_is_dropped() {
        let (list, sink) = run::<List>("<list><item>a</item><item>b</list>", "");
        assert_eq!(summary(&sink.errors()), vec!["A-1-2 item 0:27-0:34"]);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].v(), "a");
    }

    #[test]
    fn test_sanitizer_runs_after_decode() {
        let (limit, sink) = run::<Limit>(r#"<limit max="500"></limit>"#, "");
        assert_eq!(limit.max, 100);
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title, "Limit too large");
        assert_eq!(summary(&warnings), vec!["- - 0:0-0:25"]);

        let (limit, sink) = run::<Limit>(r#"<limit max="50"/>"#, "");
        assert!(sink.is_empty());
        assert_eq!(limit.max, 50);
    }

    #[test]
    fn test_read_text() {
        let block = Block::from_text(Uri::new("file:///doc.go"), "<t>a<!-- c --><![CDATA[<b>]]>c</t><u><v/></u>");
        let sink = DiagnosticCollector::new();
        let mut p = Parser::new(&block, &sink).unwrap();

        let Ok(Some(Token::StartElement(start))) = p.token() else {
            panic!("expected <t>");
        };
        let (text, end) = read_text(&mut p, &start).unwrap();
        assert_eq!(text.value, "a<b>c");
        assert_eq!(text.location.range.start.character, 3);
        assert_eq!(text.location.range.end.character, 30);
        assert_eq!(end.name.local.value, "t");

        let Ok(Some(Token::StartElement(start))) = p.token() else {
            panic!("expected <u>");
        };
        let err = read_text(&mut p, &start).unwrap_err();
        assert_eq!(err.code(), "A-1-1");
        assert_eq!(err.field(), "u");
    }
}
