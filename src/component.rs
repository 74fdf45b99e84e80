//! Custom-element style components whose properties are wired into a shadow-root template.
//!
//! A component is declared once per tag name with a [`ComponentPrototype`] and then stamped any number of times
//! with [`ComponentRegistry::create`]. Every property assignment re-runs the component's template through
//! [`PropertyProcessor`], which assigns element properties (not attributes) for attribute bindings.
//!
//! ```
//! use lti_dom::{component::{ComponentPrototype, ComponentRegistry, PropertyConfig}, mem::Document};
//!
//! let document = Document::new();
//! let registry = ComponentRegistry::new(document.clone());
//! registry.define(ComponentPrototype {
//! 	is: "x-greeting".to_owned(),
//! 	properties: vec![("name".to_owned(), PropertyConfig::with_value("world"))],
//! 	template: Some("<p>Hello, {{name}}!</p>".to_owned()),
//! })?;
//!
//! let mut greeting = registry.create("x-greeting")?;
//! greeting.set("name", "you")?;
//! let shadow_root = greeting.shadow_root().unwrap();
//! assert_eq!(document.inner_html(shadow_root), "<p>Hello, you!</p>");
//! # Ok::<(), lti_dom::Error>(())
//! ```

use crate::{
	case::{camel_to_dash_case, capitalize},
	definition::TemplateDefinition,
	dom::Dom,
	instance::TemplateInstance,
	processor::{PropertyProcessor, TemplateProcessor},
	Error, Value,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// A property's initial value.
pub enum DefaultValue<D: Dom> {
	/// Cloned into each new element.
	Constant(Value<D>),
	/// Called once per new element.
	Factory(Rc<dyn Fn() -> Value<D>>),
}

impl<D: Dom> Clone for DefaultValue<D> {
	fn clone(&self) -> Self {
		match self {
			DefaultValue::Constant(value) => DefaultValue::Constant(value.clone()),
			DefaultValue::Factory(factory) => DefaultValue::Factory(Rc::clone(factory)),
		}
	}
}

impl<D: Dom> Debug for DefaultValue<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			DefaultValue::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			DefaultValue::Factory(factory) => f.debug_tuple("Factory").field(&(Rc::as_ptr(factory) as *const ())).finish(),
		}
	}
}

/// How one property behaves, as declared.
#[derive(Debug, Clone)]
pub struct PropertyConfig<D: Dom> {
	/// If set, public assignments are ignored and only [`ComponentElement::set_read_only`] changes the value.
	pub read_only: Option<bool>,
	/// If set, changes are reported to [`ComponentElement::on_property_changed`] listeners.
	pub notify: Option<bool>,
	pub value: Option<DefaultValue<D>>,
}

impl<D: Dom> Default for PropertyConfig<D> {
	fn default() -> Self {
		Self {
			read_only: None,
			notify: None,
			value: None,
		}
	}
}

impl<D: Dom> PropertyConfig<D> {
	#[must_use]
	pub fn with_value(value: impl Into<Value<D>>) -> Self {
		Self {
			value: Some(DefaultValue::Constant(value.into())),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_factory(factory: impl Fn() -> Value<D> + 'static) -> Self {
		Self {
			value: Some(DefaultValue::Factory(Rc::new(factory))),
			..Self::default()
		}
	}

	#[must_use]
	pub fn read_only(mut self) -> Self {
		self.read_only = Some(true);
		self
	}

	#[must_use]
	pub fn notify(mut self) -> Self {
		self.notify = Some(true);
		self
	}
}

/// A [`PropertyConfig`] with all defaults filled in.
#[derive(Clone)]
pub struct NormalizedPropertyConfig<D: Dom> {
	pub read_only: bool,
	pub notify: bool,
	/// Produces the initial value of each new element. Missing defaults produce [`Value::Null`].
	pub value: Rc<dyn Fn() -> Value<D>>,
}

impl<D: Dom> Debug for NormalizedPropertyConfig<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("NormalizedPropertyConfig")
			.field("read_only", &self.read_only)
			.field("notify", &self.notify)
			.field("value", &(Rc::as_ptr(&self.value) as *const ()))
			.finish()
	}
}

/// Fills in `false` for unset flags and turns constant defaults into factories.
#[must_use]
pub fn normalize_property_config<D: Dom>(config: PropertyConfig<D>) -> NormalizedPropertyConfig<D> {
	NormalizedPropertyConfig {
		read_only: config.read_only.unwrap_or(false),
		notify: config.notify.unwrap_or(false),
		value: match config.value {
			Some(DefaultValue::Factory(factory)) => factory,
			Some(DefaultValue::Constant(value)) => Rc::new(move || value.clone()),
			None => Rc::new(|| Value::Null),
		},
	}
}

/// The declaration of a component.
#[derive(Debug)]
pub struct ComponentPrototype<D: Dom> {
	/// The tag name.
	pub is: String,
	/// Property names (in `camelCase`) and their configuration, in order.
	pub properties: Vec<(String, PropertyConfig<D>)>,
	/// Shadow root markup with named placeholders like `{{name}}`.
	/// Components without template have no shadow root.
	pub template: Option<String>,
}

#[derive(Debug)]
pub struct Property<D: Dom> {
	name: String,
	attribute: String,
	config: NormalizedPropertyConfig<D>,
}

impl<D: Dom> Property<D> {
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The observed attribute, the property name in `dash-case`.
	#[must_use]
	pub fn attribute(&self) -> &str {
		&self.attribute
	}

	#[must_use]
	pub fn config(&self) -> &NormalizedPropertyConfig<D> {
		&self.config
	}

	/// The name under which scripts would find the private setter, like `_setValue`. Only read-only properties have one.
	#[must_use]
	pub fn private_setter(&self) -> Option<String> {
		self.config.read_only.then(|| format!("_set{}", capitalize(&self.name)))
	}
}

/// A finalized component declaration.
pub struct Component<D: Dom> {
	is: String,
	properties: Vec<Property<D>>,
	definition: Option<Rc<TemplateDefinition<D>>>,
	processor: Rc<dyn TemplateProcessor<D>>,
}

impl<D: Dom> Debug for Component<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("is", &self.is)
			.field("properties", &self.properties)
			.field("definition", &self.definition)
			.finish_non_exhaustive()
	}
}

impl<D: Dom> Component<D> {
	/// # Errors
	///
	/// Iff the template can't be parsed.
	#[instrument(skip(dom, prototype), fields(is = %prototype.is))]
	pub fn finalize(dom: &D, prototype: ComponentPrototype<D>) -> Result<Self, Error> {
		let definition = match &prototype.template {
			Some(template) => Some(Rc::new(TemplateDefinition::named(dom, template)?)),
			None => None,
		};
		let properties = prototype
			.properties
			.into_iter()
			.map(|(name, config)| Property {
				attribute: camel_to_dash_case(&name),
				name,
				config: normalize_property_config(config),
			})
			.collect::<Vec<_>>();
		trace!("Finalized with {} properties.", properties.len());
		Ok(Self {
			is: prototype.is,
			properties,
			definition,
			processor: Rc::new(PropertyProcessor),
		})
	}

	#[must_use]
	pub fn is(&self) -> &str {
		&self.is
	}

	#[must_use]
	pub fn properties(&self) -> &[Property<D>] {
		&self.properties
	}

	#[must_use]
	pub fn property(&self, name: &str) -> Option<&Property<D>> {
		self.properties.iter().find(|property| property.name == name)
	}

	/// The `dash-case` names of all properties, in declaration order.
	#[must_use]
	pub fn observed_attributes(&self) -> Vec<&str> {
		self.properties.iter().map(Property::attribute).collect()
	}

	#[must_use]
	pub fn definition(&self) -> Option<&Rc<TemplateDefinition<D>>> {
		self.definition.as_ref()
	}
}

/// Known components by tag name. Each name can be defined only once.
pub struct ComponentRegistry<D: Dom> {
	dom: D,
	components: RefCell<HashMap<String, Rc<Component<D>>>>,
}

impl<D: Dom> Debug for ComponentRegistry<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentRegistry").field("components", &self.components.borrow().keys().collect::<Vec<_>>()).finish()
	}
}

impl<D: Dom> ComponentRegistry<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			components: RefCell::default(),
		}
	}

	/// # Errors
	///
	/// - [`Error::AlreadyDefined`] if there already is a component with the same name,
	/// - or if the template can't be parsed.
	pub fn define(&self, prototype: ComponentPrototype<D>) -> Result<Rc<Component<D>>, Error> {
		if self.components.borrow().contains_key(&prototype.is) {
			return Err(Error::AlreadyDefined(prototype.is));
		}
		let component = Rc::new(Component::finalize(&self.dom, prototype)?);
		match self.components.borrow_mut().entry(component.is.clone()) {
			Entry::Occupied(occupied) => Err(Error::AlreadyDefined(occupied.key().clone())),
			Entry::Vacant(vacant) => Ok(Rc::clone(vacant.insert(component))),
		}
	}

	#[must_use]
	pub fn get(&self, is: &str) -> Option<Rc<Component<D>>> {
		self.components.borrow().get(is).cloned()
	}

	/// Creates a new element of a defined component.
	///
	/// # Errors
	///
	/// [`Error::UndefinedComponent`] if there is no component named `is`.
	pub fn create(&self, is: &str) -> Result<ComponentElement<D>, Error> {
		let component = self.get(is).ok_or_else(|| Error::UndefinedComponent(is.to_owned()))?;
		Ok(ComponentElement::new(&self.dom, component))
	}
}

/// The notification sent for changes of `notify` properties.
#[derive(Debug, Clone)]
pub struct PropertyChange<D: Dom> {
	/// `<attribute>-changed`.
	pub event: String,
	pub property: String,
	pub value: Value<D>,
	pub old_value: Value<D>,
}

type Listener<D> = Box<dyn FnMut(&PropertyChange<D>)>;

/// One element of a [`Component`].
pub struct ComponentElement<D: Dom> {
	dom: D,
	component: Rc<Component<D>>,
	host: D::Node,
	shadow_root: Option<D::Node>,
	data: HashMap<String, Value<D>>,
	instance: Option<TemplateInstance<D>>,
	listeners: Vec<Listener<D>>,
}

impl<D: Dom> Debug for ComponentElement<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentElement")
			.field("is", &self.component.is)
			.field("host", &self.host)
			.field("shadow_root", &self.shadow_root)
			.field("data", &self.data)
			.field("instance", &self.instance)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl<D: Dom> ComponentElement<D> {
	/// Defaults are applied through the private setter, so read-only properties receive theirs too.
	#[instrument(skip(dom, component), fields(is = %component.is))]
	fn new(dom: &D, component: Rc<Component<D>>) -> Self {
		let host = dom.create_element(&component.is);
		let mut element = Self {
			dom: dom.clone(),
			host,
			shadow_root: None,
			data: HashMap::new(),
			instance: None,
			listeners: Vec::new(),
			component,
		};

		if let Some(definition) = element.component.definition.clone() {
			let shadow_root = dom.attach_shadow(&element.host);
			let instance = TemplateInstance::new(dom, definition, Rc::clone(&element.component.processor), &element.state());
			for child in instance.child_nodes(dom) {
				dom.append_child(&shadow_root, &child);
			}
			element.shadow_root = Some(shadow_root);
			element.instance = Some(instance);
		}

		let component = Rc::clone(&element.component);
		for property in &component.properties {
			element.assign(property, (property.config.value)());
		}
		element
	}

	#[must_use]
	pub fn component(&self) -> &Rc<Component<D>> {
		&self.component
	}

	/// The element that hosts the shadow root.
	#[must_use]
	pub fn host(&self) -> &D::Node {
		&self.host
	}

	#[must_use]
	pub fn shadow_root(&self) -> Option<&D::Node> {
		self.shadow_root.as_ref()
	}

	#[must_use]
	pub fn instance(&self) -> Option<&TemplateInstance<D>> {
		self.instance.as_ref()
	}

	/// [`None`] for undeclared properties.
	#[must_use]
	pub fn get(&self, property: &str) -> Option<&Value<D>> {
		self.data.get(property)
	}

	/// Public assignment. Read-only properties ignore it.
	///
	/// # Errors
	///
	/// [`Error::UnknownProperty`] if `property` isn't declared.
	pub fn set(&mut self, property: &str, value: impl Into<Value<D>>) -> Result<(), Error> {
		let component = Rc::clone(&self.component);
		let property = self.declared(&component, property)?;
		if property.config.read_only {
			debug!(
				"Ignoring public assignment to read-only property `{}`. Use the private setter (`{}`) instead.",
				property.name,
				property.private_setter().unwrap_or_default()
			);
			return Ok(());
		}
		self.assign(property, value.into());
		Ok(())
	}

	/// Private assignment, which also works for read-only properties.
	///
	/// # Errors
	///
	/// [`Error::UnknownProperty`] if `property` isn't declared.
	pub fn set_read_only(&mut self, property: &str, value: impl Into<Value<D>>) -> Result<(), Error> {
		let component = Rc::clone(&self.component);
		let property = self.declared(&component, property)?;
		self.assign(property, value.into());
		Ok(())
	}

	/// Applies an observed attribute change as public assignment of the matching property.
	/// A removed attribute assigns [`Value::Null`].
	///
	/// # Errors
	///
	/// [`Error::UnknownProperty`] if `attribute` isn't observed.
	pub fn attribute_changed(&mut self, attribute: &str, value: Option<&str>) -> Result<(), Error> {
		let property = self
			.component
			.properties
			.iter()
			.find(|property| property.attribute == attribute)
			.map(|property| property.name.clone())
			.ok_or_else(|| Error::UnknownProperty {
				is: self.component.is.clone(),
				property: attribute.to_owned(),
			})?;
		self.set(&property, value)
	}

	/// Registers a listener for changes of properties declared with `notify`.
	pub fn on_property_changed(&mut self, listener: impl FnMut(&PropertyChange<D>) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	fn declared<'a>(&self, component: &'a Component<D>, property: &str) -> Result<&'a Property<D>, Error> {
		component.property(property).ok_or_else(|| Error::UnknownProperty {
			is: self.component.is.clone(),
			property: property.to_owned(),
		})
	}

	/// Template state in the order of the definition's placeholder names.
	fn state(&self) -> Vec<Value<D>> {
		self.component.definition.as_ref().map_or_else(Vec::new, |definition| {
			definition.names().iter().map(|name| self.data.get(name).cloned().unwrap_or(Value::Null)).collect()
		})
	}

	fn assign(&mut self, property: &Property<D>, value: Value<D>) {
		let old_value = self.data.insert(property.name.clone(), value.clone()).unwrap_or(Value::Null);

		if property.config.notify {
			let change = PropertyChange {
				event: format!("{}-changed", property.attribute),
				property: property.name.clone(),
				value,
				old_value,
			};
			trace!("Dispatching {} to {} listener(s).", change.event, self.listeners.len());
			for listener in &mut self.listeners {
				listener(&change);
			}
		}

		let state = self.state();
		if let Some(instance) = &mut self.instance {
			instance.update(&self.dom, &state);
		}
	}
}
