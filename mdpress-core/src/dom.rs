//! Mutable HTML trees for the process plugins
//!
//! Fragments are parsed with html5ever into an `RcDom`, rewritten in place, and serialized
//! back to a string. Everything here works on `Handle`s so the plugins can freely reparent
//! nodes between trees.
//!
//! `markup5ever_rcdom` clears the children of every descendant when a node is dropped, so a
//! node must be detached from its old parent before that parent goes away if it is going to
//! be reused.

use crate::error::{PressError, Result};
use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, parse_document, serialize, serialize::SerializeOpts, serialize::TraversalScope,
    Attribute, LocalName, QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A parsed HTML fragment rooted at a synthetic `<body>`
pub struct Fragment {
    // Keeps the document alive for as long as the body handle is used.
    _dom: RcDom,
    body: Handle,
}

impl Fragment {
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .one(format!("<html><head></head><body>{html}</body></html>"));
        let body = find_first(&dom.document, "body")
            .ok_or_else(|| PressError::Dom("parsed document has no body".to_string()))?;
        Ok(Fragment { _dom: dom, body })
    }

    /// The container whose children are the fragment's top-level nodes
    pub fn root(&self) -> &Handle {
        &self.body
    }

    pub fn to_html(&self) -> Result<String> {
        inner_html(&self.body)
    }
}

/// Parse `html` and return its top-level nodes, detached and ready to be inserted elsewhere
pub fn parse_nodes(html: &str) -> Result<Vec<Handle>> {
    let fragment = Fragment::parse(html)?;
    let nodes = children(fragment.root());
    for node in &nodes {
        detach(node);
    }
    Ok(nodes)
}

/// Create an HTML element with attributes
pub fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// True when `node` is an element with one of the given tag names
pub fn is_tag(node: &Handle, tags: &[&str]) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => tags.contains(&&*name.local),
        _ => false,
    }
}

pub fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

/// All descendant elements in document order, excluding `root` itself
pub fn elements(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_elements(root, &mut out);
    out
}

fn collect_elements(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if is_element(child) {
            out.push(child.clone());
            collect_elements(child, out);
        }
    }
}

pub fn elements_by_tag(root: &Handle, tags: &[&str]) -> Vec<Handle> {
    elements(root)
        .into_iter()
        .filter(|node| is_tag(node, tags))
        .collect()
}

fn find_first(node: &Handle, tag: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if is_tag(child, &[tag]) {
            return Some(child.clone());
        }
        if let Some(found) = find_first(child, tag) {
            return Some(found);
        }
    }
    None
}

pub fn find_by_id(root: &Handle, id: &str) -> Option<Handle> {
    elements(root)
        .into_iter()
        .find(|node| get_attr(node, "id").as_deref() == Some(id))
}

/// True when any ancestor of `node` (up to, not including, the fragment body) has one of `tags`
pub fn has_ancestor(node: &Handle, tags: &[&str]) -> bool {
    let mut current = parent(node);
    while let Some(ancestor) = current {
        if is_tag(&ancestor, &["body"]) {
            return false;
        }
        if is_tag(&ancestor, tags) {
            return true;
        }
        current = parent(&ancestor);
    }
    false
}

pub fn detach(node: &Handle) {
    let weak = node.parent.take();
    if let Some(parent) = weak.and_then(|w| w.upgrade()) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

pub fn append_child(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

pub fn prepend_child(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child.clone());
}

fn insert_at_offset(reference: &Handle, new_node: &Handle, offset: usize) -> Result<()> {
    let parent = parent(reference)
        .ok_or_else(|| PressError::Dom("cannot insert next to a detached node".to_string()))?;
    detach(new_node);
    let mut siblings = parent.children.borrow_mut();
    let index = siblings
        .iter()
        .position(|child| Rc::ptr_eq(child, reference))
        .ok_or_else(|| PressError::Dom("node missing from its parent".to_string()))?;
    new_node.parent.set(Some(Rc::downgrade(&parent)));
    siblings.insert(index + offset, new_node.clone());
    Ok(())
}

pub fn insert_before(reference: &Handle, new_node: &Handle) -> Result<()> {
    insert_at_offset(reference, new_node, 0)
}

pub fn insert_after(reference: &Handle, new_node: &Handle) -> Result<()> {
    insert_at_offset(reference, new_node, 1)
}

/// Put `new_node` where `old` was and detach `old`
pub fn replace_with(old: &Handle, new_node: &Handle) -> Result<()> {
    insert_before(old, new_node)?;
    detach(old);
    Ok(())
}

/// Move every child of `node` into its parent at its position, then drop `node`
pub fn unwrap(node: &Handle) -> Result<()> {
    for child in children(node) {
        insert_before(node, &child)?;
    }
    detach(node);
    Ok(())
}

pub fn remove_children(node: &Handle) {
    for child in children(node) {
        detach(&child);
    }
}

pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    get_attr(node, name).is_some()
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(attr) = attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            attr.value = value.to_string().into();
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: value.to_string().into(),
            });
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        attrs.borrow_mut().retain(|attr| &*attr.name.local != name);
    }
}

pub fn classes(node: &Handle) -> Vec<String> {
    get_attr(node, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    classes(node).iter().any(|c| c == class)
}

pub fn add_class(node: &Handle, class: &str) {
    let mut current = classes(node);
    if !current.iter().any(|c| c == class) {
        current.push(class.to_string());
        set_attr(node, "class", &current.join(" "));
    }
}

/// Append declarations to the inline style, keeping what is already there
pub fn append_style(node: &Handle, declarations: &str) {
    let declarations = declarations.trim();
    if declarations.is_empty() {
        return;
    }
    let existing = get_attr(node, "style").unwrap_or_default();
    let existing = existing.trim();
    let style = if existing.is_empty() {
        declarations.to_string()
    } else if existing.ends_with(';') {
        format!("{existing} {declarations}")
    } else {
        format!("{existing}; {declarations}")
    };
    set_attr(node, "style", &style);
}

pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Replace the text of a text node
pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = text.to_string().into();
    }
}

pub fn text_of(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

fn serialize_node(node: &Handle, scope: TraversalScope) -> Result<String> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    let serializable = SerializableHandle::from(node.clone());
    serialize(&mut output, &serializable, opts)
        .map_err(|e| PressError::Dom(format!("HTML serialization failed: {e}")))?;
    String::from_utf8(output).map_err(|e| PressError::Dom(format!("UTF-8 conversion failed: {e}")))
}

pub fn inner_html(node: &Handle) -> Result<String> {
    serialize_node(node, TraversalScope::ChildrenOnly(None))
}

pub fn outer_html(node: &Handle) -> Result<String> {
    if is_element(node) {
        serialize_node(node, TraversalScope::IncludeNode)
    } else {
        // Text and comments need a container for the serializer to escape them.
        let holder = create_element("div", vec![]);
        let copy = shallow_copy(node);
        append_child(&holder, &copy);
        inner_html(&holder)
    }
}

fn shallow_copy(node: &Handle) -> Handle {
    match &node.data {
        NodeData::Text { contents } => create_text(&contents.borrow()),
        NodeData::Comment { contents } => Rc::new(Node {
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            data: NodeData::Comment {
                contents: contents.clone(),
            },
        }),
        _ => create_text(""),
    }
}

/// Replace all children of `node` with the parsed `html`
pub fn set_inner_html(node: &Handle, html: &str) -> Result<()> {
    let nodes = parse_nodes(html)?;
    remove_children(node);
    for child in &nodes {
        append_child(node, child);
    }
    Ok(())
}

/// Patch the element with the given id in `html`; used by deferred sub-renderers
pub fn update_element_by_id(html: &str, id: &str, content: &str) -> Result<String> {
    let fragment = Fragment::parse(html)?;
    let target = find_by_id(fragment.root(), id).ok_or_else(|| PressError::NotFound {
        kind: "element",
        name: id.to_string(),
    })?;
    set_inner_html(&target, content)?;
    fragment.to_html()
}

/// Escape text for use in element content and double-quoted attributes
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_preserves_markup() {
        let html = r#"<p class="a">Hello <strong>world</strong></p><ul><li>x</li></ul>"#;
        let fragment = Fragment::parse(html).unwrap();
        assert_eq!(fragment.to_html().unwrap(), html);
    }

    #[test]
    fn style_elements_stay_in_place() {
        let html = "<style>p { color: red; }</style><p>x</p>";
        let fragment = Fragment::parse(html).unwrap();
        let styles = elements_by_tag(fragment.root(), &["style"]);
        assert_eq!(styles.len(), 1);
        assert_eq!(text_content(&styles[0]), "p { color: red; }");
    }

    #[test]
    fn reparenting_moves_nodes() {
        let fragment = Fragment::parse("<div id=\"a\"><span>1</span></div><div id=\"b\"></div>").unwrap();
        let a = find_by_id(fragment.root(), "a").unwrap();
        let b = find_by_id(fragment.root(), "b").unwrap();
        let span = element_children(&a).remove(0);
        append_child(&b, &span);
        assert_eq!(
            fragment.to_html().unwrap(),
            r#"<div id="a"></div><div id="b"><span>1</span></div>"#
        );
        assert!(Rc::ptr_eq(&parent(&span).unwrap(), &b));
    }

    #[test]
    fn insert_and_replace_siblings() {
        let fragment = Fragment::parse("<p>a</p><p>b</p>").unwrap();
        let paragraphs = elements_by_tag(fragment.root(), &["p"]);
        let hr = create_element("hr", vec![]);
        insert_after(&paragraphs[0], &hr).unwrap();
        let section = create_element("section", vec![("class", "x")]);
        replace_with(&paragraphs[1], &section).unwrap();
        assert_eq!(
            fragment.to_html().unwrap(),
            r#"<p>a</p><hr><section class="x"></section>"#
        );
    }

    #[test]
    fn append_style_is_additive() {
        let node = create_element("p", vec![("style", "color: red")]);
        append_style(&node, "font-size: 14px;");
        assert_eq!(
            get_attr(&node, "style").as_deref(),
            Some("color: red; font-size: 14px;")
        );
    }

    #[test]
    fn update_element_by_id_patches_content() {
        let html = r#"<p>before</p><span id="math-1" class="pending"></span>"#;
        let patched = update_element_by_id(html, "math-1", "<em>x</em>").unwrap();
        assert_eq!(
            patched,
            r#"<p>before</p><span id="math-1" class="pending"><em>x</em></span>"#
        );
        assert!(update_element_by_id(html, "missing", "x").is_err());
    }

    #[test]
    fn text_is_escaped_on_serialization() {
        let node = create_element("p", vec![]);
        append_child(&node, &create_text("a < b & c"));
        assert_eq!(outer_html(&node).unwrap(), "<p>a &lt; b &amp; c</p>");
    }
}
