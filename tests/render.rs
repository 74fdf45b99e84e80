use lti_dom::{html, mem::Document, render, Container, Dom, Error, Reconciler, TemplateAssembly, Templates, Value};
use std::{rc::Rc, sync::Once};

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

struct Fixture {
	document: Document,
	templates: Templates<Document>,
	container: Container<Document>,
}

impl Fixture {
	fn new() -> Self {
		init_tracing();
		let document = Document::new();
		Self {
			templates: Templates::new(document.clone()),
			container: Container::new(document.create_element("div")),
			document,
		}
	}

	fn render(&mut self, assembly: &TemplateAssembly<Document>) {
		render(&self.document, assembly, &mut self.container);
	}

	fn inner_html(&self) -> String {
		self.document.inner_html(self.container.element())
	}

	fn first_child(&self) -> <Document as Dom>::Node {
		self.document.first_child(self.container.element()).unwrap()
	}
}

#[test]
fn element_less_text() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, "test").unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), "test");
}

#[test]
fn two_child_parts_of_one_element() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, "<div>{} {}</div>", 1, 2).unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), "<div>1 2</div>");
}

#[test]
fn two_attributes_of_one_element() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, r#"<div a="{}" b="{}"></div>"#, 1, 2).unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), r#"<div a="1" b="2"></div>"#);
}

#[test]
fn attribute_values_keep_literal_text() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, r#"<p class="a {} b{}"></p>"#, "x", Value::Null).unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), r#"<p class="a x b"></p>"#);
}

#[test]
fn updates_lists_of_templates() -> Result<(), Error> {
	let mut fixture = Fixture::new();
	let ul = |templates: &Templates<Document>, list: &[&str]| -> Result<TemplateAssembly<Document>, Error> {
		let items = list.iter().map(|&item| html!(templates, "<li>{}</li>", item)).collect::<Result<Vec<_>, _>>()?;
		html!(templates, "<ul>{}</ul>", items)
	};

	let assembly = ul(&fixture.templates, &["a", "b", "c"])?;
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), "<ul><li>a</li><li>b</li><li>c</li></ul>");

	let assembly = ul(&fixture.templates, &["x", "y"])?;
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), "<ul><li>x</li><li>y</li></ul>");
	Ok(())
}

fn elements(document: &Document, parent: &<Document as Dom>::Node) -> Vec<<Document as Dom>::Node> {
	document.child_nodes(parent).into_iter().filter(|node| document.tag_name(node).is_some()).collect()
}

#[test]
fn list_items_are_reused_by_position() -> Result<(), Error> {
	let mut fixture = Fixture::new();
	let ul = |templates: &Templates<Document>, list: &[&str]| -> Result<TemplateAssembly<Document>, Error> {
		let items = list.iter().map(|&item| html!(templates, "<li>{}</li>", item)).collect::<Result<Vec<_>, _>>()?;
		html!(templates, "<ul>{}</ul>", items)
	};

	fixture.render(&ul(&fixture.templates, &["a", "b", "c"])?);
	let list = fixture.first_child();
	let items = elements(&fixture.document, &list);
	assert_eq!(items.len(), 3);

	fixture.render(&ul(&fixture.templates, &["c", "b"])?);
	assert_eq!(fixture.inner_html(), "<ul><li>c</li><li>b</li></ul>");
	assert_eq!(fixture.first_child(), list);
	assert_eq!(elements(&fixture.document, &list), &items[..2]);
	Ok(())
}

#[test]
fn resists_xss_in_node_values() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, "<div>{}</div>", r#"<script>alert("boo");</script>"#).unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), r#"<div>&lt;script&gt;alert("boo");&lt;/script&gt;</div>"#);
}

#[test]
fn resists_xss_in_attribute_values() {
	let mut fixture = Fixture::new();
	let assembly = html!(fixture.templates, r#"<div foo="{}"></div>"#, r#""><script>alert("boo");</script><div foo=""#).unwrap();
	fixture.render(&assembly);
	assert_eq!(fixture.inner_html(), r#"<div foo="&quot;><script>alert(&quot;boo&quot;);</script><div foo=&quot;"></div>"#);
}

fn assemble(templates: &Templates<Document>, content: impl Into<Value<Document>>) -> TemplateAssembly<Document> {
	html!(templates, "<div>{}</div>", content.into()).unwrap()
}

#[test]
fn dirty_checks_simple_values() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, "aaa"));
	assert_eq!(fixture.inner_html(), "<div>aaa</div>");

	let text = fixture.document.child_nodes(&fixture.first_child())[1];
	assert_eq!(fixture.document.text(&text).as_deref(), Some("aaa"));

	// Dirty-checking is against the previous value, not against the document.
	fixture.document.set_text(&text, "bbb");
	fixture.render(&assemble(&fixture.templates, "aaa"));
	assert_eq!(fixture.inner_html(), "<div>bbb</div>");
	assert_eq!(fixture.document.child_nodes(&fixture.first_child())[1], text);
}

#[test]
fn changed_primitives_update_the_text_node_in_place() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, 1.5));
	let text = fixture.document.child_nodes(&fixture.first_child())[1];

	fixture.render(&assemble(&fixture.templates, true));
	assert_eq!(fixture.inner_html(), "<div>true</div>");
	assert_eq!(fixture.document.child_nodes(&fixture.first_child())[1], text);
}

#[test]
fn updates_a_container_in_place() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, "aaa"));
	let div = fixture.first_child();
	assert_eq!(fixture.document.tag_name(&div).as_deref(), Some("div"));

	fixture.render(&assemble(&fixture.templates, "bbb"));
	assert_eq!(fixture.inner_html(), "<div>bbb</div>");
	assert_eq!(fixture.first_child(), div);
}

#[test]
fn replaces_container_content_for_other_templates() {
	let mut fixture = Fixture::new();
	let existing = fixture.document.create_text("existing");
	fixture.document.append_child(fixture.container.element(), &existing);

	fixture.render(&assemble(&fixture.templates, "aaa"));
	assert_eq!(fixture.inner_html(), "<div>aaa</div>");
	let div = fixture.first_child();

	let other = html!(fixture.templates, "<p>{}</p>", "aaa").unwrap();
	fixture.render(&other);
	assert_eq!(fixture.inner_html(), "<p>aaa</p>");
	assert_ne!(fixture.first_child(), div);
}

#[test]
fn other_processors_cause_replacement() {
	let mut fixture = Fixture::new();
	let reconciled = html!(fixture.templates, "<b>{}</b>", 1).unwrap();
	let reprocessed = TemplateAssembly::new(Rc::clone(reconciled.definition()), Rc::new(Reconciler::default()), reconciled.state().to_vec());

	fixture.render(&reconciled);
	let b = fixture.first_child();
	fixture.render(&reprocessed);
	assert_eq!(fixture.inner_html(), "<b>1</b>");
	assert_ne!(fixture.first_child(), b);
}

#[test]
fn updates_sibling_parts() {
	let mut fixture = Fixture::new();
	let assemble = |templates: &Templates<Document>, foo: &str, bar: &str| html!(templates, "<div>{}{}</div>", foo, bar).unwrap();

	fixture.render(&assemble(&fixture.templates, "aaa", "bbb"));
	assert_eq!(fixture.inner_html(), "<div>aaabbb</div>");

	fixture.render(&assemble(&fixture.templates, "bbb", "aaa"));
	assert_eq!(fixture.inner_html(), "<div>bbbaaa</div>");
}

#[test]
fn updates_nested_templates() {
	let mut fixture = Fixture::new();
	let assemble = |templates: &Templates<Document>, foo: &str, bar: &str, primary: bool| {
		let partial = if primary {
			html!(templates, "<h1>{}</h1>", foo)
		} else {
			html!(templates, "<h2>{}</h2>", bar)
		}
		.unwrap();
		html!(templates, "{}{}", partial, "suffix").unwrap()
	};

	fixture.render(&assemble(&fixture.templates, "aaa", "bbb", true));
	assert_eq!(fixture.inner_html(), "<h1>aaa</h1>suffix");
	let h1 = fixture.document.child_nodes(fixture.container.element())[1];

	fixture.render(&assemble(&fixture.templates, "bbb", "aaa", true));
	assert_eq!(fixture.inner_html(), "<h1>bbb</h1>suffix");
	assert_eq!(fixture.document.child_nodes(fixture.container.element())[1], h1);

	fixture.render(&assemble(&fixture.templates, "aaa", "bbb", false));
	assert_eq!(fixture.inner_html(), "<h2>bbb</h2>suffix");
}

#[test]
fn null_leaves_an_empty_part_alone() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, Value::<Document>::Null));
	assert_eq!(fixture.inner_html(), "<div></div>");

	let div = fixture.first_child();
	let markers = fixture.document.child_nodes(&div);
	assert_eq!(markers.len(), 2);
	let foreign = fixture.document.create_text("foreign");
	fixture.document.insert_before(&div, &foreign, Some(&markers[1]));

	fixture.render(&assemble(&fixture.templates, Value::<Document>::Null));
	assert_eq!(fixture.inner_html(), "<div>foreign</div>");
	assert_eq!(fixture.document.child_nodes(&div), [markers[0], foreign, markers[1]]);
}

#[test]
fn null_clears_content_and_resets_dirty_checking() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, "a"));
	assert_eq!(fixture.inner_html(), "<div>a</div>");

	fixture.render(&assemble(&fixture.templates, Value::<Document>::Null));
	assert_eq!(fixture.inner_html(), "<div></div>");
	assert_eq!(fixture.document.child_nodes(&fixture.first_child()).len(), 2);

	fixture.render(&assemble(&fixture.templates, "a"));
	assert_eq!(fixture.inner_html(), "<div>a</div>");
}

#[test]
fn overwrites_same_length_arrays_by_position() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, vec![1, 2, 3]));
	assert_eq!(fixture.inner_html(), "<div>123</div>");

	fixture.render(&assemble(&fixture.templates, vec![3, 2, 1]));
	assert_eq!(fixture.inner_html(), "<div>321</div>");
}

#[test]
fn updates_when_arrays_shrink_and_grow() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, vec![1, 2, 3]));
	assert_eq!(fixture.inner_html(), "<div>123</div>");

	fixture.render(&assemble(&fixture.templates, vec![4]));
	assert_eq!(fixture.inner_html(), "<div>4</div>");

	fixture.render(&assemble(&fixture.templates, vec![5, 6, 7]));
	assert_eq!(fixture.inner_html(), "<div>567</div>");

	fixture.render(&assemble(&fixture.templates, Vec::<i32>::new()));
	assert_eq!(fixture.inner_html(), "<div></div>");
}

#[test]
fn updates_a_changing_array_of_nodes() {
	let mut fixture = Fixture::new();
	let nodes = vec![fixture.document.create_element("p"), fixture.document.create_element("a"), fixture.document.create_element("span")];
	fixture.render(&assemble(&fixture.templates, nodes));
	assert_eq!(fixture.inner_html(), "<div><p></p><a></a><span></span></div>");

	fixture.render(&assemble(&fixture.templates, Value::<Document>::Null));
	assert_eq!(fixture.inner_html(), "<div></div>");

	fixture.render(&assemble(&fixture.templates, fixture.document.create_text("foo")));
	assert_eq!(fixture.inner_html(), "<div>foo</div>");
}

#[test]
fn null_list_items_render_nothing() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, vec![Value::<Document>::from("a"), Value::Null, Value::from("c")]));
	assert_eq!(fixture.inner_html(), "<div>ac</div>");

	fixture.render(&assemble(&fixture.templates, vec![Value::<Document>::Null, Value::from("b"), Value::Null]));
	assert_eq!(fixture.inner_html(), "<div>b</div>");
}

#[test]
fn nested_sequences_and_mode_switches() {
	let mut fixture = Fixture::new();
	let nested: Value<Document> = Value::Sequence(vec![Value::from(vec![1, 2]), Value::from(3)]);
	fixture.render(&assemble(&fixture.templates, nested));
	assert_eq!(fixture.inner_html(), "<div>123</div>");

	fixture.render(&assemble(&fixture.templates, "text"));
	assert_eq!(fixture.inner_html(), "<div>text</div>");

	let inner = html!(fixture.templates, "<i>{}</i>", 4).unwrap();
	fixture.render(&assemble(&fixture.templates, inner));
	assert_eq!(fixture.inner_html(), "<div><i>4</i></div>");

	fixture.render(&assemble(&fixture.templates, vec![5]));
	assert_eq!(fixture.inner_html(), "<div>5</div>");
}

#[test]
fn opaque_values_render_their_text() {
	let mut fixture = Fixture::new();
	fixture.render(&assemble(&fixture.templates, Value::<Document>::opaque('x')));
	assert_eq!(fixture.inner_html(), "<div>x</div>");
}

#[test]
fn sequences_past_the_depth_limit_are_cleared() {
	init_tracing();
	let document = Document::new();
	let templates = Templates::with_processor(document.clone(), Rc::new(Reconciler::with_depth_limit(2)));
	let mut container = Container::new(document.create_element("div"));

	let nested: Value<Document> = Value::Sequence(vec![Value::from(vec![1]), Value::from(2)]);
	render(&document, &html!(templates, "<p>{}</p>", nested).unwrap(), &mut container);
	assert_eq!(document.inner_html(container.element()), "<p>2</p>");
}
