use crate::{
	dom::{Dom, NodeKind},
	rule::{is_token, scan, AttributeRule, Interpolation, NodeRule, Rule},
	Error,
};
use core::{
	fmt::{self, Debug, Formatter},
	iter,
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// A parsed template: a detached fragment plus one [`Rule`] per interpolation site.
///
/// Definitions are created once per [`CallSite`](`crate::CallSite`) and shared by every
/// [`TemplateAssembly`](`crate::TemplateAssembly`) built there.
///
/// Each text node with placeholders is split into its literal segments (which may be empty).
/// A node part then spans exactly the nodes between two adjacent segments,
/// so `n` placeholders in one text node turn it into `n + 1` text nodes.
pub struct TemplateDefinition<D: Dom> {
	fragment: D::Node,
	rules: Vec<Rule>,
	/// Child index paths from `fragment` to each rule's start marker or element.
	locations: Vec<Box<[usize]>>,
	names: Vec<String>,
	expression_count: usize,
}

impl<D: Dom> Debug for TemplateDefinition<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateDefinition")
			.field("fragment", &self.fragment)
			.field("rules", &self.rules)
			.field("names", &self.names)
			.field("expression_count", &self.expression_count)
			.finish()
	}
}

impl<D: Dom> TemplateDefinition<D> {
	/// Parses markup with positional placeholders `{{0}}` through `{{expression_count - 1}}`.
	///
	/// # Errors
	///
	/// - [`Error::UnknownPlaceholder`] for placeholders that aren't in range,
	/// - [`Error::UnboundExpression`] if an expression doesn't appear in a node or attribute position,
	/// - [`Error::PlaceholderInAttributeName`],
	/// - or whatever the host raises while parsing.
	pub fn positional(dom: &D, markup: &str, expression_count: usize) -> Result<Self, Error> {
		Self::marked(dom, markup, "", expression_count)
	}

	/// Like [`positional`](`TemplateDefinition::positional`), but placeholders are `{{<marker>0}}` and so on.
	/// Tokens without the marker stay literal text.
	#[instrument(skip(dom))]
	pub(crate) fn marked(dom: &D, markup: &str, marker: &str, expression_count: usize) -> Result<Self, Error> {
		let is_placeholder = |token: &str| token.starts_with(marker) && is_token(token);
		let mut resolve = |token: &str| {
			token[marker.len()..]
				.parse::<usize>()
				.ok()
				.filter(|&index| index < expression_count)
				.ok_or_else(|| Error::UnknownPlaceholder { token: token.to_owned() })
		};
		let (fragment, rules, locations) = parse(dom, markup, &is_placeholder, &mut resolve)?;

		let mut bound = vec![false; expression_count];
		for &expression in rules.iter().flat_map(Rule::expressions) {
			bound[expression] = true;
		}
		if let Some(index) = bound.iter().position(|&bound| !bound) {
			return Err(Error::UnboundExpression { index });
		}

		Ok(Self {
			fragment,
			rules,
			locations,
			names: Vec::new(),
			expression_count,
		})
	}

	/// Parses markup with named placeholders like `{{title}}`.
	///
	/// Each distinct name becomes one expression, numbered in order of first appearance (see [`names`](`TemplateDefinition::names`)).
	///
	/// # Errors
	///
	/// [`Error::PlaceholderInAttributeName`], or whatever the host raises while parsing.
	#[instrument(skip(dom))]
	pub fn named(dom: &D, markup: &str) -> Result<Self, Error> {
		let mut names: Vec<String> = Vec::new();
		let mut resolve = |token: &str| {
			Ok::<_, Error>(names.iter().position(|name| name == token).unwrap_or_else(|| {
				names.push(token.to_owned());
				names.len() - 1
			}))
		};
		let (fragment, rules, locations) = parse(dom, markup, &is_token, &mut resolve)?;
		let expression_count = names.len();
		Ok(Self {
			fragment,
			rules,
			locations,
			names,
			expression_count,
		})
	}

	/// The parsed fragment that instances are cloned from. Don't mutate it.
	#[must_use]
	pub fn fragment(&self) -> &D::Node {
		&self.fragment
	}

	#[must_use]
	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Placeholder names by expression index. Empty for positional definitions.
	#[must_use]
	pub fn names(&self) -> &[String] {
		&self.names
	}

	#[must_use]
	pub fn expression_count(&self) -> usize {
		self.expression_count
	}

	pub(crate) fn locations(&self) -> &[Box<[usize]>] {
		&self.locations
	}
}

type Resolve<'a> = dyn FnMut(&str) -> Result<usize, Error> + 'a;

#[allow(clippy::type_complexity)]
fn parse<D: Dom>(
	dom: &D,
	markup: &str,
	is_placeholder: &dyn Fn(&str) -> bool,
	resolve: &mut Resolve<'_>,
) -> Result<(D::Node, Vec<Rule>, Vec<Box<[usize]>>), Error> {
	let fragment = dom.parse_template(markup)?;
	let mut walker = Walker {
		dom,
		is_placeholder,
		resolve,
		rules: Vec::new(),
		locations: Vec::new(),
		path: Vec::new(),
	};
	walker.walk(&fragment)?;
	trace!("Parsed {} rule(s).", walker.rules.len());
	Ok((fragment, walker.rules, walker.locations))
}

struct Walker<'a, 'r, D: Dom> {
	dom: &'a D,
	is_placeholder: &'a dyn Fn(&str) -> bool,
	resolve: &'a mut Resolve<'r>,
	rules: Vec<Rule>,
	locations: Vec<Box<[usize]>>,
	path: Vec<usize>,
}

impl<'a, 'r, D: Dom> Walker<'a, 'r, D> {
	fn location(&self, index: usize) -> Box<[usize]> {
		self.path.iter().copied().chain(iter::once(index)).collect()
	}

	/// Attribute rules come before the rules of the element's children.
	fn walk(&mut self, parent: &D::Node) -> Result<(), Error> {
		let mut index = 0;
		let mut next = self.dom.first_child(parent);
		while let Some(node) = next {
			next = self.dom.next_sibling(&node);
			match self.dom.kind(&node) {
				NodeKind::Element => {
					self.path.push(index);
					self.attributes(&node)?;
					self.walk(&node)?;
					self.path.pop();
					index += 1;
				}
				NodeKind::Text => match self.dom.text(&node).and_then(|text| scan(&text, self.is_placeholder)) {
					None => index += 1,
					Some(Interpolation { strings, tokens }) => {
						for (i, segment) in strings.iter().enumerate() {
							let segment = self.dom.create_text(segment);
							self.dom.insert_before(parent, &segment, Some(&node));
							if let Some(token) = tokens.get(i) {
								let expression = (self.resolve)(token)?;
								self.rules.push(Rule::Node(NodeRule { expression }));
								self.locations.push(self.location(index));
							}
							index += 1;
						}
						self.dom.remove(&node);
					}
				},
				_ => index += 1,
			}
		}
		Ok(())
	}

	fn attributes(&mut self, element: &D::Node) -> Result<(), Error> {
		for name in self.dom.attribute_names(element) {
			if scan(&name, self.is_placeholder).is_some() {
				return Err(Error::PlaceholderInAttributeName { name });
			}
			let interpolation = match self.dom.attribute(element, &name).and_then(|value| scan(&value, self.is_placeholder)) {
				Some(interpolation) => interpolation,
				None => continue,
			};
			let expressions = interpolation.tokens.iter().map(|token| (self.resolve)(token)).collect::<Result<Vec<_>, _>>()?;
			self.rules.push(Rule::Attribute(Rc::new(AttributeRule::new(name, expressions, interpolation.strings))));
			self.locations.push(self.path.clone().into_boxed_slice());
		}
		Ok(())
	}
}
