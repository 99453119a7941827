//! Markup Module
//!
//! Parses HTML with html5ever into the host arena and serializes subtrees back
//! to markup. Parsed custom elements are plain elements; upgrading them is the
//! registry's job.

use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_document, parse_fragment, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use tendril::StrTendril;

use crate::dom::{Dom, NodeData, NodeId};
use crate::error::DomError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a complete document and appends its nodes under `document`.
pub(crate) fn parse_document_into(
    dom: &mut Dom,
    document: NodeId,
    html: &str,
) -> Result<(), DomError> {
    let parsed = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| DomError::Markup(e.to_string()))?;

    for child in parsed.document.children.borrow().iter() {
        if let Some(id) = import_handle(dom, document, child) {
            dom.attach_raw(document, id);
        }
    }
    Ok(())
}

/// Parses `html` in a `<body>` context into detached nodes owned by `owner`.
pub(crate) fn parse_fragment_nodes(
    dom: &mut Dom,
    owner: NodeId,
    html: &str,
) -> Result<Vec<NodeId>, DomError> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let parsed = parse_fragment(RcDom::default(), Default::default(), context, Vec::new())
        .one(StrTendril::from_slice(html));

    // The fragment parser wraps its output in a synthetic <html> element.
    let document_children = parsed.document.children.borrow();
    let root = document_children
        .first()
        .ok_or_else(|| DomError::Markup("fragment parser produced no root".to_string()))?;

    let mut nodes = Vec::new();
    for child in root.children.borrow().iter() {
        if let Some(id) = import_handle(dom, owner, child) {
            nodes.push(id);
        }
    }
    Ok(nodes)
}

fn import_handle(dom: &mut Dom, owner: NodeId, handle: &Handle) -> Option<NodeId> {
    match &handle.data {
        RcNodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let element = dom.alloc(
                owner,
                NodeData::Element {
                    local_name: name.local.to_string(),
                    attrs: attrs
                        .borrow()
                        .iter()
                        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                        .collect(),
                    shadow_root: None,
                    template_content: None,
                },
            );

            if let Some(contents) = template_contents.borrow().as_ref() {
                let template_document = dom.template_document();
                let fragment = dom.alloc(template_document, NodeData::Fragment);
                import_children(dom, template_document, contents, fragment);
                dom.set_template_content(element, fragment);
            }

            import_children(dom, owner, handle, element);
            Some(element)
        }
        RcNodeData::Text { contents } => {
            Some(dom.alloc(owner, NodeData::Text(contents.borrow().to_string())))
        }
        RcNodeData::Comment { contents } => {
            Some(dom.alloc(owner, NodeData::Comment(contents.to_string())))
        }
        RcNodeData::Document
        | RcNodeData::Doctype { .. }
        | RcNodeData::ProcessingInstruction { .. } => None,
    }
}

fn import_children(dom: &mut Dom, owner: NodeId, handle: &Handle, parent: NodeId) {
    for child in handle.children.borrow().iter() {
        if let Some(id) = import_handle(dom, owner, child) {
            dom.attach_raw(parent, id);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) fn serialize_node(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

pub(crate) fn serialize_children(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_children(dom, id, &mut out);
    out
}

fn write_children(dom: &Dom, id: NodeId, out: &mut String) {
    let children = match dom.template_content(id) {
        Some(content) => dom.children(content),
        None => dom.children(id),
    };
    for child in children {
        write_node(dom, *child, out);
    }
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    match dom.data(id) {
        Some(NodeData::Element {
            local_name, attrs, ..
        }) => {
            out.push('<');
            out.push_str(local_name);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(value, true));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&local_name.as_str()) {
                return;
            }
            write_children(dom, id, out);
            out.push_str("</");
            out.push_str(local_name);
            out.push('>');
        }
        Some(NodeData::Text(text)) => out.push_str(&escape(text, false)),
        Some(NodeData::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeData::Document { .. } | NodeData::Fragment | NodeData::ShadowRoot { .. }) => {
            write_children(dom, id, out)
        }
        None => {}
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            '"' if attribute => escaped.push_str("&quot;"),
            '<' if !attribute => escaped.push_str("&lt;"),
            '>' if !attribute => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fragment_roundtrips_through_serializer() {
        let mut dom = Dom::new();
        let body = dom.create_element("div");
        dom.set_inner_html(body, r#"<x-foo id="a"><span>hi &amp; bye</span></x-foo><br>"#)
            .unwrap();
        assert_eq!(
            dom.inner_html(body),
            r#"<x-foo id="a"><span>hi &amp; bye</span></x-foo><br>"#
        );
    }

    #[test]
    fn test_document_parse_keeps_custom_elements_unbound() {
        let dom = Dom::parse("<!doctype html><html><body><x-foo></x-foo></body></html>").unwrap();
        let html = dom.children(dom.document())[0];
        assert_eq!(dom.local_name(html), Some("html"));
        let body = dom.children(html)[1];
        let foo = dom.children(body)[0];
        assert_eq!(dom.local_name(foo), Some("x-foo"));
        assert!(!dom.is_upgraded(foo));
        assert!(dom.is_connected(foo));
    }

    #[test]
    fn test_template_contents_are_inert() {
        let mut dom = Dom::new();
        let host = dom.create_element("div");
        dom.set_inner_html(host, "<template><x-foo></x-foo></template>")
            .unwrap();
        let template = dom.children(host)[0];
        assert!(dom.children(template).is_empty());
        let content = dom.template_content(template).unwrap();
        let foo = dom.children(content)[0];
        assert!(dom.is_inert(foo));
        assert_eq!(dom.inner_html(host), "<template><x-foo></x-foo></template>");
    }
}
