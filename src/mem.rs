//! An in-memory document, for rendering without a browser.
//!
//! Nodes live in an [`indextree`] arena shared by all clones of a [`Document`] handle.
//! Removing a node only detaches it, so node handles held elsewhere stay valid until the document is dropped.

use crate::{
	dom::{Dom, NodeKind},
	markup::{self, is_void_element},
	Error, Value,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use indextree::Arena;
pub use indextree::NodeId;
use std::rc::Rc;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ElementData {
	name: String,
	attributes: Vec<(String, String)>,
	properties: HashMap<String, Value<Document>>,
	shadow_root: Option<NodeId>,
}

impl ElementData {
	pub(crate) fn new(name: String, attributes: Vec<(String, String)>) -> Self {
		Self {
			name,
			attributes,
			properties: HashMap::new(),
			shadow_root: None,
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn attributes(&self) -> &[(String, String)] {
		&self.attributes
	}
}

#[derive(Debug)]
pub enum NodeData {
	Fragment,
	Element(ElementData),
	Text(String),
	Comment(String),
}

impl NodeData {
	/// Like `cloneNode(false)`: Properties and shadow roots are not copied.
	fn shallow_clone(&self) -> Self {
		match self {
			NodeData::Fragment => NodeData::Fragment,
			NodeData::Element(element) => NodeData::Element(ElementData::new(element.name.clone(), element.attributes.clone())),
			NodeData::Text(text) => NodeData::Text(text.clone()),
			NodeData::Comment(comment) => NodeData::Comment(comment.clone()),
		}
	}
}

/// A cheaply clonable handle to an in-memory document.
///
/// [`Dom::remove`] only detaches, so the arena grows with every node ever created through this handle,
/// including replaced render output, until the last clone of the handle is dropped.
/// Use one document per rendering session rather than one for the whole program lifetime.
#[derive(Clone, Default)]
pub struct Document(Rc<RefCell<Arena<NodeData>>>);

impl Debug for Document {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document").field("nodes", &self.0.borrow().count()).finish()
	}
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses markup into a detached fragment.
	#[must_use]
	pub fn parse_fragment(&self, markup: &str) -> NodeId {
		markup::parse(&mut self.0.borrow_mut(), markup)
	}

	#[must_use]
	pub fn property(&self, element: &NodeId, name: &str) -> Option<Value<Document>> {
		match self.0.borrow()[*element].get() {
			NodeData::Element(element) => element.properties.get(name).cloned(),
			_ => None,
		}
	}

	#[must_use]
	pub fn shadow_root(&self, host: &NodeId) -> Option<NodeId> {
		match self.0.borrow()[*host].get() {
			NodeData::Element(element) => element.shadow_root,
			_ => None,
		}
	}

	/// Serializes the children of `node` the way `innerHTML` does.
	#[must_use]
	pub fn inner_html(&self, node: &NodeId) -> String {
		let guard = self.0.borrow();
		let arena: &Arena<NodeData> = &guard;
		let raw = match arena[*node].get() {
			NodeData::Element(element) => is_raw_text(&element.name),
			_ => false,
		};
		let mut html = String::new();
		for child in node.children(arena) {
			serialize(arena, child, raw, &mut html);
		}
		html
	}

	/// Serializes `node` itself the way `outerHTML` does.
	#[must_use]
	pub fn outer_html(&self, node: &NodeId) -> String {
		let guard = self.0.borrow();
		let mut html = String::new();
		serialize(&guard, *node, false, &mut html);
		html
	}
}

impl From<NodeId> for Value<Document> {
	fn from(node: NodeId) -> Self {
		Self::Node(node)
	}
}

fn is_raw_text(name: &str) -> bool {
	matches!(name, "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext")
}

fn escape_text(text: &str, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'\u{A0}' => html.push_str("&nbsp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			c => html.push(c),
		}
	}
}

/// Angle brackets are left alone in attribute values.
fn escape_attribute(value: &str, html: &mut String) {
	for c in value.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'\u{A0}' => html.push_str("&nbsp;"),
			'"' => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

fn serialize(arena: &Arena<NodeData>, node: NodeId, parent_is_raw: bool, html: &mut String) {
	match arena[node].get() {
		NodeData::Fragment => {
			for child in node.children(arena) {
				serialize(arena, child, false, html);
			}
		}
		NodeData::Element(element) => {
			html.push('<');
			html.push_str(&element.name);
			for (name, value) in &element.attributes {
				html.push(' ');
				html.push_str(name);
				html.push_str("=\"");
				escape_attribute(value, html);
				html.push('"');
			}
			html.push('>');
			if is_void_element(&element.name) {
				return;
			}
			let raw = is_raw_text(&element.name);
			for child in node.children(arena) {
				serialize(arena, child, raw, html);
			}
			html.push_str("</");
			html.push_str(&element.name);
			html.push('>');
		}
		NodeData::Text(text) if parent_is_raw => html.push_str(text),
		NodeData::Text(text) => escape_text(text, html),
		NodeData::Comment(comment) => {
			html.push_str("<!--");
			html.push_str(comment);
			html.push_str("-->");
		}
	}
}

fn clone_into(arena: &mut Arena<NodeData>, node: NodeId) -> NodeId {
	let data = arena[node].get().shallow_clone();
	let copy = arena.new_node(data);
	let children: Vec<NodeId> = node.children(arena).collect();
	for child in children {
		let child = clone_into(arena, child);
		copy.append(child, arena);
	}
	copy
}

impl Dom for Document {
	type Node = NodeId;

	fn parse_template(&self, markup: &str) -> Result<NodeId, Error> {
		Ok(self.parse_fragment(markup))
	}

	fn create_element(&self, name: &str) -> NodeId {
		self.0.borrow_mut().new_node(NodeData::Element(ElementData::new(name.to_ascii_lowercase(), Vec::new())))
	}

	fn create_text(&self, data: &str) -> NodeId {
		self.0.borrow_mut().new_node(NodeData::Text(data.to_owned()))
	}

	fn create_fragment(&self) -> NodeId {
		self.0.borrow_mut().new_node(NodeData::Fragment)
	}

	fn clone_subtree(&self, node: &NodeId) -> NodeId {
		clone_into(&mut self.0.borrow_mut(), *node)
	}

	fn kind(&self, node: &NodeId) -> NodeKind {
		match self.0.borrow()[*node].get() {
			NodeData::Fragment => NodeKind::Fragment,
			NodeData::Element(_) => NodeKind::Element,
			NodeData::Text(_) => NodeKind::Text,
			NodeData::Comment(_) => NodeKind::Comment,
		}
	}

	fn text(&self, node: &NodeId) -> Option<String> {
		match self.0.borrow()[*node].get() {
			NodeData::Text(data) | NodeData::Comment(data) => Some(data.clone()),
			_ => None,
		}
	}

	fn set_text(&self, node: &NodeId, data: &str) {
		match self.0.borrow_mut()[*node].get_mut() {
			NodeData::Text(existing) | NodeData::Comment(existing) => {
				existing.clear();
				existing.push_str(data);
			}
			other => error!("Expected character data but found {:?}. Ignoring.", other),
		}
	}

	fn text_content(&self, node: &NodeId) -> String {
		let guard = self.0.borrow();
		let arena: &Arena<NodeData> = &guard;
		match arena[*node].get() {
			NodeData::Text(data) | NodeData::Comment(data) => data.clone(),
			_ => node
				.descendants(arena)
				.filter_map(|descendant| match arena[descendant].get() {
					NodeData::Text(data) => Some(data.as_str()),
					_ => None,
				})
				.collect(),
		}
	}

	fn tag_name(&self, element: &NodeId) -> Option<String> {
		match self.0.borrow()[*element].get() {
			NodeData::Element(element) => Some(element.name.clone()),
			_ => None,
		}
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow()[*node].parent()
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow()[*node].first_child()
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow()[*node].next_sibling()
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		let mut guard = self.0.borrow_mut();
		let arena: &mut Arena<NodeData> = &mut guard;
		if reference == Some(node) || parent.ancestors(arena).any(|ancestor| ancestor == *node) {
			return error!("Can't insert {:?} into its own subtree at {:?}. Ignoring.", node, parent);
		}
		node.detach(arena);
		let inserted = match reference {
			Some(reference) => reference.checked_insert_before(*node, arena),
			None => parent.checked_append(*node, arena),
		};
		if let Err(error) = inserted {
			error!("Failed to insert {:?} into {:?}: {}", node, parent, error);
		}
	}

	fn remove(&self, node: &NodeId) {
		let mut guard = self.0.borrow_mut();
		node.detach(&mut *guard);
	}

	fn attribute_names(&self, element: &NodeId) -> Vec<String> {
		match self.0.borrow()[*element].get() {
			NodeData::Element(element) => element.attributes.iter().map(|(name, _)| name.clone()).collect(),
			_ => Vec::new(),
		}
	}

	fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
		match self.0.borrow()[*element].get() {
			NodeData::Element(element) => element.attributes.iter().find(|(existing, _)| existing == name).map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
		match self.0.borrow_mut()[*element].get_mut() {
			NodeData::Element(element) => match element.attributes.iter_mut().find(|(existing, _)| existing == name) {
				Some((_, existing)) => {
					existing.clear();
					existing.push_str(value);
				}
				None => element.attributes.push((name.to_owned(), value.to_owned())),
			},
			other => error!("Expected an element to set attribute `{}` on but found {:?}. Ignoring.", name, other),
		}
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) {
		if let NodeData::Element(element) = self.0.borrow_mut()[*element].get_mut() {
			element.attributes.retain(|(existing, _)| existing != name);
		}
	}

	fn set_property(&self, element: &NodeId, name: &str, value: &Value<Self>) {
		match self.0.borrow_mut()[*element].get_mut() {
			NodeData::Element(element) => {
				element.properties.insert(name.to_owned(), value.clone());
			}
			other => error!("Expected an element to set property `{}` on but found {:?}. Ignoring.", name, other),
		}
	}

	fn attach_shadow(&self, host: &NodeId) -> NodeId {
		if let Some(existing) = self.shadow_root(host) {
			warn!("{:?} already has a shadow root. Reusing it.", host);
			return existing;
		}
		let mut arena = self.0.borrow_mut();
		let root = arena.new_node(NodeData::Fragment);
		if let NodeData::Element(element) = arena[*host].get_mut() {
			element.shadow_root = Some(root);
		} else {
			error!("Shadow roots can only be attached to elements, not {:?}.", host);
		}
		root
	}
}
