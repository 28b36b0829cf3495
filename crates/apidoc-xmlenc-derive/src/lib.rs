//! `#[derive(XmlNode)]` for apidoc document types.
//!
//! Fields take part in the markup schema through `#[apidoc(...)]`:
//!
//! - `#[apidoc("name,kind[,usage[,omitempty]]")]` where `kind` is `attr`,
//!   `elem`, `cdata` or `content`. An empty name means the field name,
//!   except for `cdata` and `content` which stay unnamed.
//! - `#[apidoc("-")]` or no attribute: not part of the schema.
//! - `#[apidoc(flatten)]`: the field's own schema is merged into this one
//!   and the field receives this element's tags.
//!
//! On the struct, `#[apidoc("name,meta[,usage]")]` names the element when it
//! is a document root and `#[apidoc(sanitize)]` hands decoded values to the
//! type's `Sanitizer` implementation.
//!
//! The generated code refers to `::apidoc_xmlenc`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input};

#[proc_macro_derive(XmlNode, attributes(apidoc))]
pub fn derive_xml_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Contents of one `#[apidoc(...)]`.
enum Annotation {
    Tag(LitStr),
    Flatten,
    Sanitize,
}

fn parse_annotation(attr: &Attribute) -> syn::Result<Annotation> {
    attr.parse_args_with(|input: ParseStream| {
        if input.peek(LitStr) {
            return Ok(Annotation::Tag(input.parse()?));
        }
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "flatten" => Ok(Annotation::Flatten),
            "sanitize" => Ok(Annotation::Sanitize),
            _ => Err(syn::Error::new(
                ident.span(),
                "expected a tag string, `flatten` or `sanitize`",
            )),
        }
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Attr,
    Elem,
    CData,
    Content,
    Meta,
}

/// A parsed `"name,kind[,usage[,omitempty]]"` string.
struct Tag {
    name: String,
    kind: Kind,
    usage: String,
    omitempty: bool,
}

fn parse_tag(lit: &LitStr) -> syn::Result<Tag> {
    let value = lit.value();
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let error = |msg: &str| syn::Error::new(lit.span(), msg);

    if parts.len() < 2 {
        return Err(error("expected \"name,kind[,usage[,omitempty]]\""));
    }
    if parts.len() > 4 {
        return Err(error("too many components in tag"));
    }

    let kind = match parts[1] {
        "attr" => Kind::Attr,
        "elem" => Kind::Elem,
        "cdata" => Kind::CData,
        "content" => Kind::Content,
        "meta" => Kind::Meta,
        other => {
            return Err(error(&format!(
                "unknown kind `{other}`, expected attr, elem, cdata, content or meta"
            )));
        }
    };

    let omitempty = match parts.get(3) {
        None => false,
        Some(&"omitempty") => true,
        Some(other) => return Err(error(&format!("expected `omitempty`, found `{other}`"))),
    };

    Ok(Tag {
        name: parts[0].to_string(),
        kind,
        usage: parts.get(2).copied().unwrap_or_default().to_string(),
        omitempty,
    })
}

enum Member {
    Slot { ident: Ident, tag: Tag },
    Flatten(Ident),
}

struct Container {
    meta: Option<Tag>,
    sanitize: bool,
}

fn container(input: &DeriveInput) -> syn::Result<Container> {
    let mut meta = None;
    let mut sanitize = false;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("apidoc")) {
        match parse_annotation(attr)? {
            Annotation::Tag(lit) => {
                let tag = parse_tag(&lit)?;
                if tag.kind != Kind::Meta {
                    return Err(syn::Error::new(lit.span(), "only `meta` tags belong on the type"));
                }
                if tag.name.is_empty() {
                    return Err(syn::Error::new(lit.span(), "meta needs an element name"));
                }
                if meta.is_some() {
                    return Err(syn::Error::new(lit.span(), "more than one meta tag"));
                }
                meta = Some(tag);
            }
            Annotation::Sanitize => sanitize = true,
            Annotation::Flatten => {
                return Err(syn::Error::new_spanned(attr, "`flatten` belongs on a field"));
            }
        }
    }
    Ok(Container { meta, sanitize })
}

fn members(input: &DeriveInput) -> syn::Result<Vec<Member>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            Span::call_site(),
            "XmlNode can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "XmlNode needs named fields",
        ));
    };

    let mut members = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let mut member = None;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("apidoc")) {
            if member.is_some() {
                return Err(syn::Error::new_spanned(attr, "field has more than one apidoc attribute"));
            }
            member = match parse_annotation(attr)? {
                Annotation::Flatten => Some(Member::Flatten(ident.clone())),
                Annotation::Tag(lit) if lit.value() == "-" => None,
                Annotation::Tag(lit) => {
                    let mut tag = parse_tag(&lit)?;
                    if tag.kind == Kind::Meta {
                        return Err(syn::Error::new(lit.span(), "`meta` belongs on the type"));
                    }
                    if tag.name.is_empty() && matches!(tag.kind, Kind::Attr | Kind::Elem) {
                        tag.name = ident.unraw().to_string();
                    }
                    Some(Member::Slot {
                        ident: ident.clone(),
                        tag,
                    })
                }
                Annotation::Sanitize => {
                    return Err(syn::Error::new_spanned(attr, "`sanitize` belongs on the type"));
                }
            };
        }
        members.extend(member);
    }

    check_slots(&members)?;
    Ok(members)
}

/// Schema rules that can be checked within one struct.
fn check_slots(members: &[Member]) -> syn::Result<()> {
    let mut attrs: Vec<&str> = Vec::new();
    let mut elems: Vec<&str> = Vec::new();
    let mut char_data: Option<&Ident> = None;

    for member in members {
        let Member::Slot { ident, tag } = member else {
            continue;
        };
        match tag.kind {
            Kind::Attr => {
                if attrs.contains(&tag.name.as_str()) {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("duplicate attribute `{}`", tag.name),
                    ));
                }
                attrs.push(&tag.name);
            }
            Kind::Elem => {
                if elems.contains(&tag.name.as_str()) {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("duplicate element `{}`", tag.name),
                    ));
                }
                elems.push(&tag.name);
            }
            Kind::CData | Kind::Content => {
                if let Some(prev) = char_data {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("`{prev}` already holds the cdata or content"),
                    ));
                }
                char_data = Some(ident);
            }
            Kind::Meta => {}
        }
    }

    match (char_data, elems.first()) {
        (Some(ident), Some(elem)) => Err(syn::Error::new(
            ident.span(),
            format!("cdata and content cannot coexist with element `{elem}`"),
        )),
        _ => Ok(()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = container(input)?;
    let members = members(input)?;

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let meta = container.meta.as_ref().map(|tag| {
        let name = &tag.name;
        let usage = &tag.usage;
        quote! { node.set_meta(::apidoc_xmlenc::Meta::new(#name, #usage)); }
    });

    let node_mut = members.iter().map(|m| slot(m, true));
    let node = members.iter().map(|m| slot(m, false));

    let fields = members.iter().map(|m| match m {
        Member::Slot { ident, .. } | Member::Flatten(ident) => ident,
    });

    let flattened: Vec<&Ident> = members
        .iter()
        .filter_map(|m| match m {
            Member::Flatten(ident) => Some(ident),
            Member::Slot { .. } => None,
        })
        .collect();
    let set_tag = (!flattened.is_empty()).then(|| {
        quote! {
            fn set_tag(
                &mut self,
                usage: &'static str,
                start: &::apidoc_xmlenc::StartElement,
                end: ::core::option::Option<&::apidoc_xmlenc::EndElement>,
            ) {
                #( ::apidoc_xmlenc::Element::set_tag(&mut self.#flattened, usage, start, end); )*
            }
        }
    });

    let as_sanitizer = container.sanitize.then(|| {
        quote! {
            fn as_sanitizer(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::apidoc_xmlenc::Sanitizer> {
                ::core::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::apidoc_xmlenc::IsEmpty for #ident #ty_generics #where_clause {
            fn is_empty(&self) -> bool {
                true #( && ::apidoc_xmlenc::IsEmpty::is_empty(&self.#fields) )*
            }
        }

        impl #impl_generics ::apidoc_xmlenc::Element for #ident #ty_generics #where_clause {
            fn node_mut(&mut self) -> ::apidoc_xmlenc::DecodeNode<'_> {
                #[allow(unused_mut)]
                let mut node = ::apidoc_xmlenc::Node::new();
                #meta
                #( #node_mut )*
                node
            }

            fn node(&self) -> ::apidoc_xmlenc::EncodeNode<'_> {
                #[allow(unused_mut)]
                let mut node = ::apidoc_xmlenc::Node::new();
                #meta
                #( #node )*
                node
            }

            #set_tag
            #as_sanitizer
        }
    })
}

/// The statement adding one member to `node`, borrowing the field
/// mutably for decoding or shared for encoding.
fn slot(member: &Member, mutable: bool) -> TokenStream2 {
    let borrow = if mutable { quote!(&mut) } else { quote!(&) };

    let (ident, tag) = match member {
        Member::Flatten(ident) => {
            let method = if mutable { quote!(node_mut) } else { quote!(node) };
            return quote! {
                node.merge(::apidoc_xmlenc::Element::#method(#borrow self.#ident));
            };
        }
        Member::Slot { ident, tag } => (ident, tag),
    };

    let name = &tag.name;
    let usage = &tag.usage;
    let omitempty = tag.omitempty;
    let (method, capability) = match tag.kind {
        Kind::Attr => (quote!(append_attr), quote!(Attr)),
        Kind::Elem => (quote!(append_elem), quote!(Element)),
        Kind::CData => (quote!(set_cdata), quote!(CharData)),
        Kind::Content => (quote!(set_content), quote!(CharData)),
        Kind::Meta => return TokenStream2::new(),
    };

    quote! {
        node.#method(::apidoc_xmlenc::Slot::new(
            #name,
            #borrow self.#ident as #borrow dyn ::apidoc_xmlenc::#capability,
            #omitempty,
            #usage,
        ));
    }
}
