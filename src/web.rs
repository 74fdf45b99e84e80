//! The browser host, on top of [`web_sys`].
//!
//! Template markup is parsed by the browser itself through a `<template>` element.
//! Failures of the underlying DOM calls are thrown into JavaScript.

use crate::{
	dom::{Dom, NodeKind},
	Error, Value,
};
use js_sys::{Array, Reflect};
use tracing::{error, warn};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};
use web_sys::{CharacterData, Element, HtmlTemplateElement, Node, ShadowRootInit, ShadowRootMode};

#[derive(Debug, Clone)]
pub struct WebDom {
	document: web_sys::Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	fn element<'a>(node: &'a Node, operation: &str) -> Option<&'a Element> {
		let element = node.dyn_ref::<Element>();
		if element.is_none() {
			error!("Expected an element to {} but found {:?}. Ignoring.", operation, node);
		}
		element
	}

	#[allow(clippy::cast_precision_loss)]
	fn js_value(&self, value: &Value<Self>) -> JsValue {
		match value {
			Value::Null => JsValue::NULL,
			Value::Primitive(crate::Primitive::Str(s)) => JsValue::from_str(s),
			Value::Primitive(crate::Primitive::Int(i)) => JsValue::from_f64(*i as f64),
			Value::Primitive(crate::Primitive::Float(x)) => JsValue::from_f64(*x),
			Value::Primitive(crate::Primitive::Bool(b)) => JsValue::from_bool(*b),
			Value::Node(node) => node.clone().into(),
			Value::Sequence(items) => items.iter().map(|item| self.js_value(item)).collect::<Array>().into(),
			Value::Template(_) | Value::Opaque(_) => JsValue::from_str(&value.to_text(self)),
		}
	}
}

impl Dom for WebDom {
	type Node = Node;

	fn parse_template(&self, markup: &str) -> Result<Node, Error> {
		let template = self
			.document
			.create_element("template")
			.map_err(|error| Error::Parse(format!("{:?}", error)))?
			.dyn_into::<HtmlTemplateElement>()
			.map_err(|element| Error::Parse(format!("Expected `HtmlTemplateElement` but found {:?}", element)))?;
		template.set_inner_html(markup);
		Ok(template.content().into())
	}

	fn create_element(&self, name: &str) -> Node {
		self.document.create_element(name).expect_throw("lti-dom: Failed to create element.").into()
	}

	fn create_text(&self, data: &str) -> Node {
		self.document.create_text_node(data).into()
	}

	fn create_fragment(&self) -> Node {
		self.document.create_document_fragment().into()
	}

	fn clone_subtree(&self, node: &Node) -> Node {
		node.clone_node_with_deep(true).expect_throw("lti-dom: Failed to clone node.")
	}

	fn kind(&self, node: &Node) -> NodeKind {
		match node.node_type() {
			Node::ELEMENT_NODE => NodeKind::Element,
			Node::TEXT_NODE => NodeKind::Text,
			Node::COMMENT_NODE => NodeKind::Comment,
			Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Other,
		}
	}

	fn text(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<CharacterData>().map(CharacterData::data)
	}

	fn set_text(&self, node: &Node, data: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => error!("Expected character data but found {:?}. Ignoring.", node),
		}
	}

	fn text_content(&self, node: &Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn tag_name(&self, element: &Node) -> Option<String> {
		element.dyn_ref::<Element>().map(Element::local_name)
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) {
		parent.insert_before(node, reference).expect_throw("lti-dom: Failed to insert node.");
	}

	fn remove(&self, node: &Node) {
		if let Some(parent) = node.parent_node() {
			parent.remove_child(node).expect_throw("lti-dom: Failed to remove node.");
		}
	}

	fn attribute_names(&self, element: &Node) -> Vec<String> {
		element
			.dyn_ref::<Element>()
			.map(|element| element.get_attribute_names().iter().filter_map(|name| name.as_string()).collect())
			.unwrap_or_default()
	}

	fn attribute(&self, element: &Node, name: &str) -> Option<String> {
		element.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) {
		if let Some(element) = Self::element(element, "set an attribute on") {
			element.set_attribute(name, value).expect_throw("lti-dom: Failed to set attribute.");
		}
	}

	fn remove_attribute(&self, element: &Node, name: &str) {
		if let Some(element) = Self::element(element, "remove an attribute from") {
			element.remove_attribute(name).expect_throw("lti-dom: Failed to remove attribute.");
		}
	}

	fn set_property(&self, element: &Node, name: &str, value: &Value<Self>) {
		Reflect::set(element, &JsValue::from_str(name), &self.js_value(value)).expect_throw("lti-dom: Failed to set property.");
	}

	fn attach_shadow(&self, host: &Node) -> Node {
		let host = host.dyn_ref::<Element>().expect_throw("lti-dom: Shadow roots can only be attached to elements.");
		if let Some(existing) = host.shadow_root() {
			warn!("{:?} already has a shadow root. Reusing it.", host);
			return existing.into();
		}
		host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))
			.expect_throw("lti-dom: Failed to attach shadow root.")
			.into()
	}
}
