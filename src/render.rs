use crate::{dom::Dom, instance::TemplateInstance, template::TemplateAssembly};
use tracing::{debug, instrument, trace};

/// A container element together with the instance last rendered into it.
#[derive(Debug)]
pub struct Container<D: Dom> {
	element: D::Node,
	instance: Option<TemplateInstance<D>>,
}

impl<D: Dom> Container<D> {
	/// `element`'s existing children are kept until the first [`render`].
	#[must_use]
	pub fn new(element: D::Node) -> Self {
		Self { element, instance: None }
	}

	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	#[must_use]
	pub fn instance(&self) -> Option<&TemplateInstance<D>> {
		self.instance.as_ref()
	}
}

/// Makes `container`'s children reflect `assembly`.
///
/// If the current instance was stamped from the same definition by the same processor, it's updated in place.
/// Otherwise all children are replaced by a new instance.
#[instrument(skip(dom, assembly, container))]
pub fn render<D: Dom>(dom: &D, assembly: &TemplateAssembly<D>, container: &mut Container<D>) {
	if let Some(instance) = container.instance.as_mut().filter(|instance| instance.is_instance_of(assembly)) {
		trace!("Updating instance in place.");
		return instance.update(dom, assembly.state());
	}

	debug!("Replacing container content.");
	for child in dom.child_nodes(&container.element) {
		dom.remove(&child);
	}
	let instance = TemplateInstance::from_assembly(dom, assembly);
	for child in instance.child_nodes(dom) {
		dom.append_child(&container.element, &child);
	}
	container.instance = Some(instance);
}
