//! Processors push interpolated values into the [`Part`]s of a [`TemplateInstance`].

use crate::{
	case::dash_to_camel_case,
	dom::Dom,
	instance::TemplateInstance,
	part::{AttributePart, Committed, NodePart, Part},
	rule::AttributeRule,
	template::TemplateAssembly,
	value::{Primitive, Value},
};
use tracing::{debug, error, instrument, trace, trace_span, warn};

/// Decides how values are applied to parts.
///
/// Processors are compared by [`Rc`](`std::rc::Rc`) identity: an instance is only updated in place by the processor it was created with.
pub trait TemplateProcessor<D: Dom> {
	/// Called once while an instance is created, before its nodes are moved anywhere.
	fn create_callback(&self, dom: &D, parts: &mut [Part<D>], state: &[Value<D>]) {
		self.process_callback(dom, parts, state);
	}

	/// Called on every update with the new values.
	fn process_callback(&self, dom: &D, parts: &mut [Part<D>], state: &[Value<D>]);
}

fn expression_value<'a, D: Dom>(state: &'a [Value<D>], expression: usize, null: &'a Value<D>) -> &'a Value<D> {
	state.get(expression).unwrap_or_else(|| {
		warn!("Missing value for expression {}. Rendering `Null`.", expression);
		null
	})
}

/// The reconciling processor used by [`html!`](`crate::html!`) templates by default.
///
/// Node parts are updated with minimal disruption:
///
/// - primitives are dirty-checked against what the part currently shows,
/// - nested templates update their previous instance in place if definition and processor match,
/// - sequences are reconciled by position (never by key),
/// - host nodes are moved into place,
/// - anything else renders its [`Display`](`core::fmt::Display`) text.
///
/// `Null` clears a part, but an empty part stays untouched by `Null`.
///
/// Attribute parts are always assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
	depth_limit: usize,
}

impl Default for Reconciler {
	fn default() -> Self {
		Self::new()
	}
}

impl Reconciler {
	pub const DEFAULT_DEPTH_LIMIT: usize = 512;

	#[must_use]
	pub const fn new() -> Self {
		Self::with_depth_limit(Self::DEFAULT_DEPTH_LIMIT)
	}

	/// `depth_limit` bounds how deeply sequences may nest. Parts past it are cleared.
	#[must_use]
	pub const fn with_depth_limit(depth_limit: usize) -> Self {
		Self { depth_limit }
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	pub fn process_attribute_part<D: Dom>(&self, dom: &D, rule: &AttributeRule, part: &AttributePart<D>, state: &[Value<D>]) {
		let null = Value::Null;
		let value = rule.interpolate(|expression| expression_value(state, expression, &null).to_text(dom));
		#[cfg(feature = "dangerous-logging")]
		trace!("Setting attribute {} to {:?}.", part.name(), value);
		#[cfg(not(feature = "dangerous-logging"))]
		trace!("Setting attribute {}.", part.name());
		part.set_value(dom, &value);
	}

	pub fn process_node_part<D: Dom>(&self, dom: &D, part: &mut NodePart<D>, value: &Value<D>) {
		self.process_node_part_at(dom, part, value, self.depth_limit);
	}

	fn process_node_part_at<D: Dom>(&self, dom: &D, part: &mut NodePart<D>, value: &Value<D>, depth_limit: usize) {
		#[cfg(feature = "dangerous-logging")]
		let span = trace_span!("Processing node part", ?value);
		#[cfg(not(feature = "dangerous-logging"))]
		let span = trace_span!("Processing node part", value = value.shape());
		let _enter = span.enter();

		if depth_limit == 0 {
			error!("Depth limit reached. Clearing part.");
			return part.clear(dom);
		}

		match value {
			Value::Null if part.is_empty() => trace!("Already empty."),
			Value::Null => part.clear(dom),
			Value::Primitive(primitive) => {
				if part.value() == Some(primitive) {
					return trace!("Clean.");
				}
				part.set_value(dom, primitive.clone());
			}
			Value::Template(assembly) => Self::assign_template(dom, part, assembly),
			Value::Sequence(items) => self.assign_iterable(dom, part, items, depth_limit),
			Value::Node(node) => {
				part.replace(dom, Some(node.clone()));
				part.committed = Committed::Node(node.clone());
			}
			Value::Opaque(opaque) => part.set_text(dom, &opaque.to_string()),
		}
	}

	fn assign_template<D: Dom>(dom: &D, part: &mut NodePart<D>, assembly: &TemplateAssembly<D>) {
		if let Committed::Instance(instance) = &mut part.committed {
			if instance.is_instance_of(assembly) {
				trace!("Updating nested instance in place.");
				return instance.update(dom, assembly.state());
			}
		}

		debug!("Stamping nested instance.");
		let instance = TemplateInstance::from_assembly(dom, assembly);
		part.replace(dom, instance.child_nodes(dom));
		part.committed = Committed::Instance(instance);
	}

	fn assign_iterable<D: Dom>(&self, dom: &D, part: &mut NodePart<D>, items: &[Value<D>], depth_limit: usize) {
		let mut item_parts = match &mut part.committed {
			Committed::Items(item_parts) => std::mem::take(item_parts),
			_ => Vec::new(),
		};

		for (index, item) in items.iter().enumerate() {
			if index == item_parts.len() {
				let item_part = match item_parts.last() {
					None => part.enclose(dom),
					Some(previous) => previous.fork(dom),
				};
				item_parts.push(item_part);
			}
			self.process_node_part_at(dom, &mut item_parts[index], item, depth_limit - 1);
		}

		if items.is_empty() {
			trace!("No items.");
			return part.clear(dom);
		}

		trace!("Keeping {} of {} item part(s).", items.len(), item_parts.len());
		item_parts.truncate(items.len());
		let last = item_parts.last().expect("lti-dom bug: No item parts after processing items");
		part.clear_after(dom, last.end());
		part.committed = Committed::Items(item_parts);
	}
}

impl<D: Dom> TemplateProcessor<D> for Reconciler {
	#[instrument(skip(dom, parts, state), fields(part_count = parts.len()))]
	fn process_callback(&self, dom: &D, parts: &mut [Part<D>], state: &[Value<D>]) {
		let null = Value::Null;
		for part in parts {
			match part {
				Part::Node { rule, part } => self.process_node_part(dom, part, expression_value(state, rule.expression, &null)),
				Part::Attribute { rule, part } => self.process_attribute_part(dom, rule, part, state),
			}
		}
	}
}

/// Assigns values to element properties instead of reconciling them.
///
/// An attribute part targets the property named like its attribute in camel case
/// (`some-prop` becomes `someProp`). A single expression is assigned as-is,
/// several are concatenated as text. Node parts show their value's text.
///
/// The binding attributes themselves are removed when an instance is created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PropertyProcessor;

impl<D: Dom> TemplateProcessor<D> for PropertyProcessor {
	fn create_callback(&self, dom: &D, parts: &mut [Part<D>], state: &[Value<D>]) {
		for part in parts.iter() {
			if let Part::Attribute { part, .. } = part {
				dom.remove_attribute(part.element(), part.name());
			}
		}
		self.process_callback(dom, parts, state);
	}

	#[instrument(skip(dom, parts, state), fields(part_count = parts.len()))]
	fn process_callback(&self, dom: &D, parts: &mut [Part<D>], state: &[Value<D>]) {
		let null = Value::Null;
		for part in parts {
			match part {
				Part::Node { rule, part } => part.set_text(dom, &expression_value(state, rule.expression, &null).to_text(dom)),
				Part::Attribute { rule, part } => {
					let property = dash_to_camel_case(part.name());
					let value = match rule.expressions() {
						[expression] => expression_value(state, *expression, &null).clone(),
						expressions => Value::Primitive(Primitive::Str(
							expressions.iter().map(|&expression| expression_value(state, expression, &null).to_text(dom)).collect(),
						)),
					};
					trace!("Setting property {}.", property);
					dom.set_property(part.element(), &property, &value);
				}
			}
		}
	}
}
