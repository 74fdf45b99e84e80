use lti_dom::{
	component::{normalize_property_config, ComponentPrototype, ComponentRegistry, PropertyChange, PropertyConfig},
	mem::Document,
	Dom, Error, Primitive, Value,
};
use std::{cell::RefCell, rc::Rc, sync::Once};

static INIT: Once = Once::new();

fn init_tracing() {
	INIT.call_once(|| {
		tracing_subscriber::fmt()
			.with_test_writer()
			.with_max_level(tracing::Level::TRACE)
			.with_target(false)
			.init();
	});
}

fn registry() -> (Document, ComponentRegistry<Document>) {
	init_tracing();
	let document = Document::new();
	let registry = ComponentRegistry::new(document.clone());
	registry
		.define(ComponentPrototype {
			is: "x-counter".to_owned(),
			properties: vec![
				("label".to_owned(), PropertyConfig::with_value("Count")),
				("count".to_owned(), PropertyConfig::with_value(0).notify()),
				("maxValue".to_owned(), PropertyConfig::with_factory(|| Value::from(10)).read_only()),
			],
			template: Some(r#"<input max-value="{{maxValue}}" aria-label="{{label}}: {{count}}"><span>{{label}}: {{count}}</span>"#.to_owned()),
		})
		.unwrap();
	(document, registry)
}

fn text(document: &Document, element: &<Document as Dom>::Node) -> String {
	let shadow_root = document.shadow_root(element).unwrap();
	document.text_content(&shadow_root)
}

#[test]
fn normalizes_configs() {
	let config = normalize_property_config(PropertyConfig::<Document>::with_value("x"));
	assert!(!config.read_only);
	assert!(!config.notify);
	assert!(matches!((config.value)(), Value::Primitive(Primitive::Str(x)) if x == "x"));

	let config = normalize_property_config(PropertyConfig::<Document>::default().read_only());
	assert!(config.read_only);
	assert!((config.value)().is_null());
}

#[test]
fn finalization_observes_dash_case_attributes() {
	let (_, registry) = registry();
	let component = registry.get("x-counter").unwrap();
	assert_eq!(component.is(), "x-counter");
	assert_eq!(component.observed_attributes(), ["label", "count", "max-value"]);
	assert_eq!(component.property("maxValue").unwrap().private_setter().as_deref(), Some("_setMaxValue"));
	assert_eq!(component.property("count").unwrap().private_setter(), None);
	assert_eq!(component.definition().unwrap().names(), ["maxValue", "label", "count"]);
}

#[test]
fn components_are_defined_once() {
	let (_, registry) = registry();
	let again = registry.define(ComponentPrototype {
		is: "x-counter".to_owned(),
		properties: Vec::new(),
		template: None,
	});
	assert!(matches!(again, Err(Error::AlreadyDefined(is)) if is == "x-counter"));
	assert!(matches!(registry.create("x-unknown"), Err(Error::UndefinedComponent(is)) if is == "x-unknown"));
}

#[test]
fn defaults_are_rendered_into_the_shadow_root() {
	let (document, registry) = registry();
	let counter = registry.create("x-counter").unwrap();
	assert_eq!(document.tag_name(counter.host()).as_deref(), Some("x-counter"));
	assert_eq!(text(&document, counter.host()), "Count: 0");
	assert!(matches!(counter.get("maxValue"), Some(Value::Primitive(Primitive::Int(10)))));
	assert!(counter.get("undeclared").is_none());
}

#[test]
fn attribute_bindings_become_properties() {
	let (document, registry) = registry();
	let mut counter = registry.create("x-counter").unwrap();
	counter.set("count", 3).unwrap();

	let shadow_root = counter.shadow_root().unwrap();
	let input = document.first_child(shadow_root).unwrap();
	assert_eq!(document.attribute_names(&input), Vec::<String>::new());
	assert!(matches!(document.property(&input, "maxValue"), Some(Value::Primitive(Primitive::Int(10)))));
	assert!(matches!(document.property(&input, "ariaLabel"), Some(Value::Primitive(Primitive::Str(label))) if label == "Count3"));
}

#[test]
fn read_only_properties_ignore_public_assignment() {
	let (_, registry) = registry();
	let mut counter = registry.create("x-counter").unwrap();

	counter.set("maxValue", 20).unwrap();
	assert!(matches!(counter.get("maxValue"), Some(Value::Primitive(Primitive::Int(10)))));

	counter.set_read_only("maxValue", 20).unwrap();
	assert!(matches!(counter.get("maxValue"), Some(Value::Primitive(Primitive::Int(20)))));
}

#[test]
fn unknown_properties_are_errors() {
	let (_, registry) = registry();
	let mut counter = registry.create("x-counter").unwrap();
	match counter.set("missing", 1) {
		Err(Error::UnknownProperty { is, property }) => {
			assert_eq!(is, "x-counter");
			assert_eq!(property, "missing");
		}
		other => panic!("Unexpected result: {:?}", other),
	}
	assert!(counter.attribute_changed("maxValue", Some("1")).is_err());
}

#[test]
fn notifying_properties_report_changes() {
	let (document, registry) = registry();
	let mut counter = registry.create("x-counter").unwrap();
	let changes: Rc<RefCell<Vec<PropertyChange<Document>>>> = Rc::default();
	counter.on_property_changed({
		let changes = Rc::clone(&changes);
		move |change| changes.borrow_mut().push(change.clone())
	});

	counter.set("label", "Total").unwrap();
	counter.set("count", 1).unwrap();
	counter.attribute_changed("count", Some("2")).unwrap();

	let changes = changes.borrow();
	assert_eq!(changes.len(), 2);
	assert_eq!(changes[0].event, "count-changed");
	assert_eq!(changes[0].property, "count");
	assert!(matches!(changes[0].old_value, Value::Primitive(Primitive::Int(0))));
	assert!(matches!(changes[0].value, Value::Primitive(Primitive::Int(1))));
	assert!(matches!(&changes[1].value, Value::Primitive(Primitive::Str(two)) if two == "2"));
	assert_eq!(text(&document, counter.host()), "Total: 2");
}

#[test]
fn components_without_template_have_no_shadow_root() {
	let (document, registry) = registry();
	registry
		.define(ComponentPrototype {
			is: "x-plain".to_owned(),
			properties: vec![("value".to_owned(), PropertyConfig::default())],
			template: None,
		})
		.unwrap();
	let mut plain = registry.create("x-plain").unwrap();
	plain.set("value", "v").unwrap();
	assert!(plain.shadow_root().is_none());
	assert!(plain.instance().is_none());
	assert_eq!(document.shadow_root(plain.host()), None);
}
