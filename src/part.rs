//! Live interpolation sites inside a stamped [`TemplateInstance`](`crate::TemplateInstance`).

use crate::{
	dom::Dom,
	instance::TemplateInstance,
	rule::{AttributeRule, NodeRule},
	value::Primitive,
};
use core::{
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::Rc;
use tracing::trace;

/// What a [`NodePart`] currently renders. This is the part's only record of its previous value,
/// so switching between modes always discards the previous mode's bookkeeping.
pub(crate) enum Committed<D: Dom> {
	/// Nothing between the markers.
	Empty,
	/// A single text node. `primitive` is [`None`] for values that aren't dirty-checked.
	Text { primitive: Option<Primitive>, node: D::Node },
	Instance(TemplateInstance<D>),
	/// One child part per item, reused by position.
	Items(Vec<NodePart<D>>),
	/// A host node that was moved in as-is.
	Node(D::Node),
}

impl<D: Dom> Default for Committed<D> {
	fn default() -> Self {
		Self::Empty
	}
}

impl<D: Dom> Debug for Committed<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Committed::Empty => f.write_str("Empty"),
			Committed::Text { primitive, node } => f.debug_struct("Text").field("primitive", primitive).field("node", node).finish(),
			Committed::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
			Committed::Items(items) => f.debug_tuple("Items").field(items).finish(),
			Committed::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

/// The sibling nodes strictly between a `start` and an `end` marker.
///
/// The markers themselves are not owned. Child parts of a list share their first marker with the list's part
/// or with the preceding item.
#[derive(Debug)]
pub struct NodePart<D: Dom> {
	start: D::Node,
	end: D::Node,
	pub(crate) committed: Committed<D>,
}

impl<D: Dom> NodePart<D> {
	/// `start` and `end` must be siblings with `start` first.
	#[must_use]
	pub fn new(start: D::Node, end: D::Node) -> Self {
		Self {
			start,
			end,
			committed: Committed::Empty,
		}
	}

	#[must_use]
	pub fn start(&self) -> &D::Node {
		&self.start
	}

	#[must_use]
	pub fn end(&self) -> &D::Node {
		&self.end
	}

	/// The primitive currently rendered, if it was dirty-checked.
	#[must_use]
	pub fn value(&self) -> Option<&Primitive> {
		match &self.committed {
			Committed::Text { primitive, .. } => primitive.as_ref(),
			_ => None,
		}
	}

	/// Whether nothing was committed since the part was created or last cleared.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self.committed, Committed::Empty)
	}

	/// The owned nodes, in order.
	#[must_use]
	pub fn nodes(&self, dom: &D) -> Vec<D::Node> {
		let mut nodes = Vec::new();
		let mut next = dom.next_sibling(&self.start);
		while let Some(node) = next.take().filter(|node| node != &self.end) {
			next = dom.next_sibling(&node);
			nodes.push(node);
		}
		nodes
	}

	fn parent(&self, dom: &D) -> D::Node {
		dom.parent(&self.start).expect("lti-dom bug: Node part marker without parent")
	}

	/// Removes all owned nodes.
	pub fn clear(&mut self, dom: &D) {
		self.clear_after(dom, &self.start);
		self.committed = Committed::Empty;
	}

	/// Removes the owned nodes that follow `boundary`, which must be `start` or an owned node.
	///
	/// This doesn't touch the committed state.
	pub fn clear_after(&self, dom: &D, boundary: &D::Node) {
		let mut removed = 0_usize;
		while let Some(node) = dom.next_sibling(boundary).filter(|node| node != &self.end) {
			dom.remove(&node);
			removed += 1;
		}
		trace!("Removed {} node(s).", removed);
	}

	/// Swaps the owned nodes for `nodes`, which are moved into place.
	pub fn replace(&mut self, dom: &D, nodes: impl IntoIterator<Item = D::Node>) {
		self.clear(dom);
		let parent = self.parent(dom);
		for node in nodes {
			dom.insert_before(&parent, &node, Some(&self.end));
		}
	}

	/// Renders a dirty-checked primitive as text.
	pub fn set_value(&mut self, dom: &D, primitive: Primitive) {
		let text = primitive.to_string();
		self.commit_text(dom, Some(primitive), &text);
	}

	/// Renders `text` without recording a value to dirty-check against.
	pub fn set_text(&mut self, dom: &D, text: &str) {
		self.commit_text(dom, None, text);
	}

	fn commit_text(&mut self, dom: &D, primitive: Option<Primitive>, text: &str) {
		let node = match mem::take(&mut self.committed) {
			Committed::Text { node, .. } => {
				dom.set_text(&node, text);
				node
			}
			_ => {
				let node = dom.create_text(text);
				self.replace(dom, Some(node.clone()));
				node
			}
		};
		self.committed = Committed::Text { primitive, node };
	}

	/// Clears this part and creates a child part spanning the whole region, for the first item of a list.
	#[must_use]
	pub fn enclose(&mut self, dom: &D) -> NodePart<D> {
		self.clear(dom);
		let marker = dom.create_text("");
		dom.insert_before(&self.parent(dom), &marker, Some(&self.end));
		NodePart::new(self.start.clone(), marker)
	}

	/// Creates a sibling part directly after this one, for the next item of a list.
	#[must_use]
	pub fn fork(&self, dom: &D) -> NodePart<D> {
		let marker = dom.create_text("");
		dom.insert_before(&self.parent(dom), &marker, dom.next_sibling(&self.end).as_ref());
		NodePart::new(self.end.clone(), marker)
	}

	/// Rebinds the start marker. Nodes between the old and new marker change ownership accordingly.
	pub fn set_start(&mut self, start: D::Node) {
		self.start = start;
	}
}

/// One attribute of one element.
#[derive(Debug)]
pub struct AttributePart<D: Dom> {
	element: D::Node,
	name: String,
}

impl<D: Dom> AttributePart<D> {
	#[must_use]
	pub fn new(element: D::Node, name: String) -> Self {
		Self { element, name }
	}

	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Always assigns, there is no dirty-checking for attributes.
	pub fn set_value(&self, dom: &D, value: &str) {
		dom.set_attribute(&self.element, &self.name, value);
	}
}

/// A [`Rule`](`crate::Rule`) bound to nodes of one instance.
#[derive(Debug)]
pub enum Part<D: Dom> {
	Node { rule: NodeRule, part: NodePart<D> },
	Attribute { rule: Rc<AttributeRule>, part: AttributePart<D> },
}

impl<D: Dom> Part<D> {
	#[must_use]
	pub fn expressions(&self) -> &[usize] {
		match self {
			Part::Node { rule, .. } => core::slice::from_ref(&rule.expression),
			Part::Attribute { rule, .. } => rule.expressions(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mem::Document;

	fn fixture() -> (Document, <Document as Dom>::Node, NodePart<Document>) {
		let document = Document::new();
		let parent = document.parse_fragment("<i>a</i><b>b</b>");
		let children = document.child_nodes(&parent);
		let part = NodePart::new(children[0], children[1]);
		(document, parent, part)
	}

	#[test]
	fn text_is_updated_in_place() {
		let (document, parent, mut part) = fixture();
		part.set_value(&document, Primitive::Int(1));
		let node = part.nodes(&document);
		part.set_text(&document, "two");
		assert_eq!(part.nodes(&document), node);
		assert_eq!(part.value(), None);
		assert_eq!(document.inner_html(&parent), "<i>a</i>two<b>b</b>");
	}

	#[test]
	fn forked_parts_follow_each_other() {
		let (document, parent, mut part) = fixture();
		let mut first = part.enclose(&document);
		let mut second = first.fork(&document);
		second.set_text(&document, "2");
		first.set_text(&document, "1");
		assert_eq!(document.text_content(&parent), "a12b");

		part.clear_after(&document, first.end());
		assert_eq!(document.text_content(&parent), "a1b");
		part.clear(&document);
		assert!(part.nodes(&document).is_empty());
	}

	#[test]
	fn moving_the_start_marker_changes_ownership() {
		let (document, _, mut part) = fixture();
		part.replace(&document, vec![document.create_text("x"), document.create_text("y")]);
		let nodes = part.nodes(&document);
		part.set_start(nodes[0]);
		assert_eq!(part.nodes(&document), &nodes[1..]);
	}
}
