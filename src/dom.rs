//! The host document contract.
//!
//! Everything in this crate mutates real nodes through a [`Dom`] implementation.
//! [`mem::Document`](`crate::mem::Document`) is always available, and on `wasm32` there is also [`web::WebDom`](`crate::web`).

use crate::{Error, Value};
use core::fmt::Debug;

/// Coarse node classification, as far as templates care about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	Fragment,
	Other,
}

/// A document host that templates are stamped into.
///
/// Handles are cheap to clone. Node handles compare by node identity.
///
/// Methods take `&self` since real DOM access is interiorly mutable anyway.
pub trait Dom: Sized + Clone + Debug + 'static {
	type Node: Clone + PartialEq + Debug;

	/// Parses template markup into a detached fragment.
	///
	/// # Errors
	///
	/// Iff the host rejects the markup.
	fn parse_template(&self, markup: &str) -> Result<Self::Node, Error>;

	fn create_element(&self, name: &str) -> Self::Node;
	fn create_text(&self, data: &str) -> Self::Node;
	fn create_fragment(&self) -> Self::Node;

	/// Deep-clones `node`. The clone is detached.
	fn clone_subtree(&self, node: &Self::Node) -> Self::Node;

	fn kind(&self, node: &Self::Node) -> NodeKind;

	/// Character data of text and comment nodes.
	fn text(&self, node: &Self::Node) -> Option<String>;

	/// Replaces the character data of a text or comment node.
	fn set_text(&self, node: &Self::Node, data: &str);

	/// Concatenated text of `node` and its descendants.
	fn text_content(&self, node: &Self::Node) -> String;

	/// Lowercase local name of an element.
	fn tag_name(&self, element: &Self::Node) -> Option<String>;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	#[must_use]
	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node> {
		let mut children = Vec::new();
		let mut next = self.first_child(node);
		while let Some(child) = next {
			next = self.next_sibling(&child);
			children.push(child);
		}
		children
	}

	/// Inserts `node` into `parent` before `reference`, or at the end if there is none.
	///
	/// Attached nodes are moved.
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);

	fn append_child(&self, parent: &Self::Node, node: &Self::Node) {
		self.insert_before(parent, node, None);
	}

	/// Detaches `node` from its parent, if any.
	fn remove(&self, node: &Self::Node);

	/// Attribute names in document order.
	fn attribute_names(&self, element: &Self::Node) -> Vec<String>;
	fn attribute(&self, element: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, element: &Self::Node, name: &str);

	/// Assigns an element property (as opposed to an attribute).
	fn set_property(&self, element: &Self::Node, name: &str, value: &Value<Self>);

	/// Attaches an open shadow root to `host` and returns it.
	fn attach_shadow(&self, host: &Self::Node) -> Self::Node;
}
