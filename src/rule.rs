//! Parsed interpolation sites and the placeholder syntax they are parsed from.

use core::{mem, slice};
use std::rc::Rc;

/// A value inserted as child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRule {
	pub expression: usize,
}

/// One attribute, interpolated from one or more expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRule {
	attribute_name: String,
	expressions: Vec<usize>,
	/// Literal text around the expressions. Always one longer than `expressions`.
	strings: Vec<String>,
}

impl AttributeRule {
	pub(crate) fn new(attribute_name: String, expressions: Vec<usize>, strings: Vec<String>) -> Self {
		debug_assert_eq!(strings.len(), expressions.len() + 1);
		Self { attribute_name, expressions, strings }
	}

	#[must_use]
	pub fn attribute_name(&self) -> &str {
		&self.attribute_name
	}

	#[must_use]
	pub fn expressions(&self) -> &[usize] {
		&self.expressions
	}

	#[must_use]
	pub fn strings(&self) -> &[String] {
		&self.strings
	}

	/// Interleaves the literal strings with each expression's text.
	///
	/// Adjacent expressions are joined without separator.
	pub fn interpolate(&self, mut text: impl FnMut(usize) -> String) -> String {
		let mut strings = self.strings.iter();
		let mut value = strings.next().cloned().unwrap_or_default();
		for (&expression, literal) in self.expressions.iter().zip(strings) {
			value.push_str(&text(expression));
			value.push_str(literal);
		}
		value
	}
}

/// Declares where one interpolation lands. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
	Node(NodeRule),
	Attribute(Rc<AttributeRule>),
}

impl Rule {
	/// [`None`] for node rules.
	#[must_use]
	pub fn attribute_name(&self) -> Option<&str> {
		match self {
			Rule::Node(_) => None,
			Rule::Attribute(rule) => Some(rule.attribute_name()),
		}
	}

	#[must_use]
	pub fn expressions(&self) -> &[usize] {
		match self {
			Rule::Node(rule) => slice::from_ref(&rule.expression),
			Rule::Attribute(rule) => rule.expressions(),
		}
	}
}

/// Text split at its placeholders.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Interpolation {
	pub strings: Vec<String>,
	pub tokens: Vec<String>,
}

/// The token written into markup for positional expression `index`.
pub(crate) fn placeholder(marker: &str, index: usize) -> String {
	format!("{{{{{}{}}}}}", marker, index)
}

/// Whether `token` is shaped like a placeholder name.
pub(crate) fn is_token(token: &str) -> bool {
	!token.is_empty() && token.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '.'))
}

/// Finds `{{token}}` placeholders in `text`, where `is_placeholder` accepts the (trimmed) token.
///
/// Returns [`None`] if there are none. Braces that don't form a placeholder stay literal.
pub(crate) fn scan(text: &str, is_placeholder: &dyn Fn(&str) -> bool) -> Option<Interpolation> {
	let mut strings = Vec::new();
	let mut tokens = Vec::new();
	let mut literal = String::new();
	let mut rest = text;
	while let Some(open) = rest.find("{{") {
		let after = &rest[open + 2..];
		let token = after.find("}}").map(|close| (after[..close].trim(), close)).filter(|(token, _)| is_placeholder(token));
		match token {
			Some((token, close)) => {
				literal.push_str(&rest[..open]);
				strings.push(mem::take(&mut literal));
				tokens.push(token.to_owned());
				rest = &after[close + 2..];
			}
			None => {
				literal.push_str(&rest[..=open]);
				rest = &rest[open + 1..];
			}
		}
	}

	if tokens.is_empty() {
		return None;
	}
	literal.push_str(rest);
	strings.push(literal);
	Some(Interpolation { strings, tokens })
}
