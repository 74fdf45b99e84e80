use crate::{definition::TemplateDefinition, dom::Dom, processor::TemplateProcessor, rule::placeholder, Error, Reconciler, Value};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::{debug, instrument, warn};

/// The identity of one [`html!`](`crate::html!`) invocation in the source code.
///
/// Each expansion of the macro declares its own `static`, so two textually identical templates at different
/// call sites are distinct, while repeated evaluation of one call site always yields the same [`CallSiteId`].
///
/// The markup uses `{}` for interpolations and `{{` and `}}` for literal braces, like [`format!`].
#[derive(Debug)]
pub struct CallSite {
	markup: &'static str,
}

/// See [`CallSite::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSiteId(usize);

impl CallSite {
	#[must_use]
	pub const fn new(markup: &'static str) -> Self {
		Self { markup }
	}

	#[must_use]
	pub fn markup(&self) -> &'static str {
		self.markup
	}

	/// The address of this `static`.
	#[must_use]
	pub fn id(&'static self) -> CallSiteId {
		CallSiteId(self as *const Self as usize)
	}

	/// The literal segments between interpolations, with escaped braces resolved.
	///
	/// There is always one more segment than there are interpolations.
	#[must_use]
	pub fn segments(&self) -> Vec<String> {
		let mut segments = Vec::new();
		let mut current = String::new();
		let mut chars = self.markup.chars().peekable();
		while let Some(c) = chars.next() {
			match (c, chars.peek()) {
				('{', Some('{')) | ('}', Some('}')) => {
					chars.next();
					current.push(c);
				}
				('{', Some('}')) => {
					chars.next();
					segments.push(current.split_off(0));
				}
				(c, _) => current.push(c),
			}
		}
		segments.push(current);
		segments
	}

	/// A token prefix that doesn't occur in the markup, so literal text can't spell a placeholder.
	fn marker(&self) -> String {
		let mut marker = String::from("lti$");
		while self.markup.contains(marker.as_str()) {
			marker.push('$');
		}
		marker
	}

	/// The markup with a marked positional placeholder in each interpolation, the marker,
	/// and the number of interpolations.
	fn template_markup(&self) -> (String, String, usize) {
		let marker = self.marker();
		let segments = self.segments();
		let mut markup = String::new();
		for (index, segment) in segments.iter().enumerate() {
			if index > 0 {
				markup.push_str(&placeholder(&marker, index - 1));
			}
			markup.push_str(segment);
		}
		(markup, marker, segments.len() - 1)
	}
}

/// An immutable pairing of a definition, a processor and the values of one builder invocation.
///
/// Assemblies are cheap and recreated on each render.
pub struct TemplateAssembly<D: Dom> {
	definition: Rc<TemplateDefinition<D>>,
	processor: Rc<dyn TemplateProcessor<D>>,
	state: Vec<Value<D>>,
}

impl<D: Dom> TemplateAssembly<D> {
	#[must_use]
	pub fn new(definition: Rc<TemplateDefinition<D>>, processor: Rc<dyn TemplateProcessor<D>>, state: Vec<Value<D>>) -> Self {
		Self { definition, processor, state }
	}

	/// Compare with [`Rc::ptr_eq`].
	#[must_use]
	pub fn definition(&self) -> &Rc<TemplateDefinition<D>> {
		&self.definition
	}

	/// Compare with [`Rc::ptr_eq`].
	#[must_use]
	pub fn processor(&self) -> &Rc<dyn TemplateProcessor<D>> {
		&self.processor
	}

	/// The interpolated values, in order.
	#[must_use]
	pub fn state(&self) -> &[Value<D>] {
		&self.state
	}
}

impl<D: Dom> Clone for TemplateAssembly<D> {
	fn clone(&self) -> Self {
		Self {
			definition: Rc::clone(&self.definition),
			processor: Rc::clone(&self.processor),
			state: self.state.clone(),
		}
	}
}

impl<D: Dom> Debug for TemplateAssembly<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateAssembly")
			.field("definition", &Rc::as_ptr(&self.definition))
			.field("processor", &(Rc::as_ptr(&self.processor) as *const ()))
			.field("state", &self.state)
			.finish()
	}
}

/// The template builder: a host handle, a shared processor and the definition cache.
///
/// The cache is keyed by [`CallSiteId`] and never evicts anything, since call sites are finite.
pub struct Templates<D: Dom> {
	dom: D,
	processor: Rc<dyn TemplateProcessor<D>>,
	definitions: RefCell<HashMap<CallSiteId, Rc<TemplateDefinition<D>>>>,
}

impl<D: Dom> Debug for Templates<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Templates")
			.field("processor", &(Rc::as_ptr(&self.processor) as *const ()))
			.field("definitions", &self.definitions.borrow().len())
			.finish()
	}
}

impl<D: Dom> Templates<D> {
	/// Uses a default [`Reconciler`].
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self::with_processor(dom, Rc::new(Reconciler::default()))
	}

	#[must_use]
	pub fn with_processor(dom: D, processor: Rc<dyn TemplateProcessor<D>>) -> Self {
		Self {
			dom,
			processor,
			definitions: RefCell::default(),
		}
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn processor(&self) -> &Rc<dyn TemplateProcessor<D>> {
		&self.processor
	}

	/// How many definitions are cached.
	#[must_use]
	pub fn len(&self) -> usize {
		self.definitions.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Looks up or parses the definition for `site`.
	///
	/// # Errors
	///
	/// Iff the markup can't be parsed into a definition. Failures aren't cached.
	pub fn definition(&self, site: &'static CallSite) -> Result<Rc<TemplateDefinition<D>>, Error> {
		let id = site.id();
		if let Some(definition) = self.definitions.borrow().get(&id) {
			return Ok(Rc::clone(definition));
		}

		let (markup, marker, expression_count) = site.template_markup();
		let definition = Rc::new(TemplateDefinition::marked(&self.dom, &markup, &marker, expression_count)?);
		debug!("Cached a new definition for {:?}.", id);
		match self.definitions.borrow_mut().entry(id) {
			// Only reachable through reentrant hosts.
			Entry::Occupied(occupied) => Ok(Rc::clone(occupied.get())),
			Entry::Vacant(vacant) => Ok(Rc::clone(vacant.insert(definition))),
		}
	}

	/// Builds a [`TemplateAssembly`] for `site`. This is what [`html!`](`crate::html!`) expands to.
	///
	/// `values` become the assembly's state as passed. While rendering, missing values count as [`Value::Null`]
	/// and surplus values are ignored.
	///
	/// # Errors
	///
	/// See [`definition`](`Templates::definition`).
	#[instrument(skip(self, values), fields(markup = site.markup()))]
	pub fn html(&self, site: &'static CallSite, values: Vec<Value<D>>) -> Result<TemplateAssembly<D>, Error> {
		let definition = self.definition(site)?;
		let expected = definition.expression_count();
		if values.len() != expected {
			warn!("Expected {} value(s) but got {}.", expected, values.len());
		}
		Ok(TemplateAssembly::new(definition, Rc::clone(&self.processor), values))
	}
}
