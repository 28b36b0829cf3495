//! The schema of an element: which of its fields are attributes, child
//! elements, character data, and what its own tag is called.
//!
//! A [`Node`] is rebuilt for every decode or encode call. Its slots borrow
//! the fields of the live value, so decoding writes straight into them.
//! Nodes are normally produced by `#[derive(XmlNode)]`.

use crate::value::{Attr, CharData, Element};

/// One field of a node.
#[derive(Debug)]
pub struct Slot<B> {
    /// Tag or attribute name; empty for unnamed cdata and content slots
    pub name: &'static str,
    pub value: B,
    pub omitempty: bool,
    /// Localization key describing the field
    pub usage: &'static str,
}

impl<B> Slot<B> {
    pub fn new(name: &'static str, value: B, omitempty: bool, usage: &'static str) -> Self {
        Slot {
            name,
            value,
            omitempty,
            usage,
        }
    }
}

/// The element's own tag name and usage key, used when the type is the
/// document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub name: &'static str,
    pub usage: &'static str,
}

impl Meta {
    pub const fn new(name: &'static str, usage: &'static str) -> Self {
        Meta { name, usage }
    }
}

/// Schema of one element.
///
/// Every method that adds a slot panics when the node would break one of
/// its rules: unique attribute names, unique element names, a single cdata
/// or content slot that never coexists with the other or with child
/// elements, and a single meta descriptor. Those are mistakes in the type
/// definition, not in the input.
#[derive(Debug)]
pub struct Node<A, E, C> {
    pub attributes: Vec<Slot<A>>,
    pub elements: Vec<Slot<E>>,
    pub cdata: Option<Slot<C>>,
    pub content: Option<Slot<C>>,
    pub meta: Option<Meta>,
}

/// A node whose slots can be written to.
pub type DecodeNode<'a> = Node<&'a mut dyn Attr, &'a mut dyn Element, &'a mut dyn CharData>;

/// A node whose slots are read.
pub type EncodeNode<'a> = Node<&'a dyn Attr, &'a dyn Element, &'a dyn CharData>;

impl<A, E, C> Default for Node<A, E, C> {
    fn default() -> Self {
        Node {
            attributes: Vec::new(),
            elements: Vec::new(),
            cdata: None,
            content: None,
            meta: None,
        }
    }
}

impl<A, E, C> Node<A, E, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_attr(&mut self, slot: Slot<A>) {
        if self.attributes.iter().any(|s| s.name == slot.name) {
            panic!("duplicate attribute `{}`", slot.name);
        }
        self.attributes.push(slot);
    }

    pub fn append_elem(&mut self, slot: Slot<E>) {
        if self.elements.iter().any(|s| s.name == slot.name) {
            panic!("duplicate element `{}`", slot.name);
        }
        if self.cdata.is_some() || self.content.is_some() {
            panic!("element `{}` cannot coexist with cdata or content", slot.name);
        }
        self.elements.push(slot);
    }

    pub fn set_cdata(&mut self, slot: Slot<C>) {
        if self.cdata.is_some() {
            panic!("more than one cdata slot");
        }
        self.check_char_data("cdata");
        self.cdata = Some(slot);
    }

    pub fn set_content(&mut self, slot: Slot<C>) {
        if self.content.is_some() {
            panic!("more than one content slot");
        }
        self.check_char_data("content");
        self.content = Some(slot);
    }

    pub fn set_meta(&mut self, meta: Meta) {
        if let Some(prev) = self.meta {
            panic!("meta `{}` conflicts with `{}`", meta.name, prev.name);
        }
        self.meta = Some(meta);
    }

    /// Add every slot of `other`, the node of a flattened field, with the
    /// same checks as adding them one by one.
    pub fn merge(&mut self, other: Node<A, E, C>) {
        for slot in other.attributes {
            self.append_attr(slot);
        }
        for slot in other.elements {
            self.append_elem(slot);
        }
        if let Some(slot) = other.cdata {
            self.set_cdata(slot);
        }
        if let Some(slot) = other.content {
            self.set_content(slot);
        }
        if let Some(meta) = other.meta {
            self.set_meta(meta);
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Slot<A>> {
        self.attributes.iter().find(|s| s.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Slot<A>> {
        self.attributes.iter_mut().find(|s| s.name == name)
    }

    pub fn element(&self, name: &str) -> Option<&Slot<E>> {
        self.elements.iter().find(|s| s.name == name)
    }

    pub fn element_mut(&mut self, name: &str) -> Option<&mut Slot<E>> {
        self.elements.iter_mut().find(|s| s.name == name)
    }

    fn check_char_data(&self, kind: &str) {
        if self.cdata.is_some() || self.content.is_some() {
            panic!("{kind} cannot coexist with another cdata or content slot");
        }
        if let Some(elem) = self.elements.first() {
            panic!("{kind} cannot coexist with element `{}`", elem.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Plain = Node<u8, u8, u8>;

    #[test]
    fn test_merge_keeps_order() {
        let mut node = Plain::new();
        node.set_meta(Meta::new("apidoc", "usage-apidoc"));
        node.append_attr(Slot::new("version", 1, false, "usage-version"));

        let mut base = Plain::new();
        base.append_attr(Slot::new("lang", 2, true, "usage-lang"));
        base.append_elem(Slot::new("title", 3, false, "usage-title"));
        node.merge(base);

        let names: Vec<_> = node.attributes.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["version", "lang"]);
        assert_eq!(node.element("title").map(|s| s.value), Some(3));
        assert!(node.attribute("lang").unwrap().omitempty);
        assert_eq!(node.meta, Some(Meta::new("apidoc", "usage-apidoc")));
        assert!(node.element_mut("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate attribute `id`")]
    fn test_duplicate_attribute() {
        let mut node = Plain::new();
        node.append_attr(Slot::new("id", 1, false, ""));
        node.append_attr(Slot::new("id", 2, false, ""));
    }

    #[test]
    #[should_panic(expected = "duplicate element `param`")]
    fn test_duplicate_element_after_merge() {
        let mut node = Plain::new();
        node.append_elem(Slot::new("param", 1, false, ""));
        let mut base = Plain::new();
        base.append_elem(Slot::new("param", 2, false, ""));
        node.merge(base);
    }

    #[test]
    #[should_panic(expected = "cdata cannot coexist with element `param`")]
    fn test_cdata_with_elements() {
        let mut node = Plain::new();
        node.append_elem(Slot::new("param", 1, false, ""));
        node.set_cdata(Slot::new("", 2, false, ""));
    }

    #[test]
    #[should_panic(expected = "cannot coexist with cdata or content")]
    fn test_element_after_content() {
        let mut node = Plain::new();
        node.set_content(Slot::new("", 1, false, ""));
        node.append_elem(Slot::new("param", 2, false, ""));
    }

    #[test]
    #[should_panic(expected = "content cannot coexist with another cdata or content slot")]
    fn test_content_with_cdata() {
        let mut node = Plain::new();
        node.set_cdata(Slot::new("", 1, false, ""));
        node.set_content(Slot::new("", 2, false, ""));
    }

    #[test]
    #[should_panic(expected = "more than one content slot")]
    fn test_two_content_slots() {
        let mut node = Plain::new();
        node.set_content(Slot::new("", 1, false, ""));
        node.set_content(Slot::new("", 2, false, ""));
    }

    #[test]
    #[should_panic(expected = "meta `b` conflicts with `a`")]
    fn test_meta_twice_after_merge() {
        let mut node = Plain::new();
        node.set_meta(Meta::new("a", ""));
        let mut base = Plain::new();
        base.set_meta(Meta::new("b", ""));
        node.merge(base);
    }
}
