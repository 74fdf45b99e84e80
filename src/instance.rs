use crate::{
	definition::TemplateDefinition,
	dom::Dom,
	part::{AttributePart, NodePart, Part},
	processor::TemplateProcessor,
	rule::Rule,
	template::TemplateAssembly,
	Value,
};
use core::{
	fmt::{self, Debug, Formatter},
	iter,
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// A stamped copy of a [`TemplateDefinition`]'s fragment with one [`Part`] per rule, bound to one processor.
///
/// The instance's nodes start out inside [`fragment`](`TemplateInstance::fragment`) and are usually moved out
/// into a container or a node part right after stamping. Parts keep working after that.
pub struct TemplateInstance<D: Dom> {
	definition: Rc<TemplateDefinition<D>>,
	processor: Rc<dyn TemplateProcessor<D>>,
	fragment: D::Node,
	parts: Vec<Part<D>>,
}

impl<D: Dom> Debug for TemplateInstance<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateInstance")
			.field("definition", &Rc::as_ptr(&self.definition))
			.field("processor", &(Rc::as_ptr(&self.processor) as *const ()))
			.field("fragment", &self.fragment)
			.field("parts", &self.parts)
			.finish()
	}
}

impl<D: Dom> TemplateInstance<D> {
	/// Clones the definition's fragment, binds its parts and runs the processor's
	/// [`create_callback`](`TemplateProcessor::create_callback`) with `state`.
	#[instrument(skip(dom, definition, processor, state))]
	pub fn new(dom: &D, definition: Rc<TemplateDefinition<D>>, processor: Rc<dyn TemplateProcessor<D>>, state: &[Value<D>]) -> Self {
		let fragment = dom.clone_subtree(definition.fragment());
		let parts = definition
			.rules()
			.iter()
			.zip(definition.locations())
			.map(|(rule, location)| {
				let node = locate(dom, &fragment, location);
				match rule {
					Rule::Node(rule) => {
						let end = dom.next_sibling(&node).expect("lti-dom bug: Node part start marker without end marker");
						Part::Node {
							rule: *rule,
							part: NodePart::new(node, end),
						}
					}
					Rule::Attribute(rule) => Part::Attribute {
						rule: Rc::clone(rule),
						part: AttributePart::new(node, rule.attribute_name().to_owned()),
					},
				}
			})
			.collect::<Vec<_>>();
		trace!("Bound {} part(s).", parts.len());

		let mut instance = Self {
			definition,
			processor,
			fragment,
			parts,
		};
		instance.processor.create_callback(dom, &mut instance.parts, state);
		instance
	}

	#[must_use]
	pub fn from_assembly(dom: &D, assembly: &TemplateAssembly<D>) -> Self {
		Self::new(dom, Rc::clone(assembly.definition()), Rc::clone(assembly.processor()), assembly.state())
	}

	/// Pushes new values through the processor.
	pub fn update(&mut self, dom: &D, state: &[Value<D>]) {
		self.processor.process_callback(dom, &mut self.parts, state);
	}

	/// Whether `assembly` can be rendered by [`update`](`TemplateInstance::update`)
	/// (same definition and same processor, by identity).
	#[must_use]
	pub fn is_instance_of(&self, assembly: &TemplateAssembly<D>) -> bool {
		Rc::ptr_eq(&self.definition, assembly.definition())
			&& Rc::as_ptr(&self.processor).cast::<()>() == Rc::as_ptr(assembly.processor()).cast::<()>()
	}

	/// The nodes still inside the stamping fragment.
	#[must_use]
	pub fn child_nodes(&self, dom: &D) -> Vec<D::Node> {
		dom.child_nodes(&self.fragment)
	}

	#[must_use]
	pub fn fragment(&self) -> &D::Node {
		&self.fragment
	}

	#[must_use]
	pub fn parts(&self) -> &[Part<D>] {
		&self.parts
	}

	#[must_use]
	pub fn definition(&self) -> &Rc<TemplateDefinition<D>> {
		&self.definition
	}

	#[must_use]
	pub fn processor(&self) -> &Rc<dyn TemplateProcessor<D>> {
		&self.processor
	}
}

fn locate<D: Dom>(dom: &D, fragment: &D::Node, location: &[usize]) -> D::Node {
	location.iter().fold(fragment.clone(), |parent, &index| {
		iter::successors(dom.first_child(&parent), |node| dom.next_sibling(node))
			.nth(index)
			.expect("lti-dom bug: Part location outside of cloned fragment")
	})
}
