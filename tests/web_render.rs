#![cfg(target_arch = "wasm32")]

use lti_dom::{html, render, web::WebDom, Container, Dom, Templates, Value};
use std::sync::Once;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, HtmlBodyElement};

wasm_bindgen_test_configure!(run_in_browser);

static INIT: Once = Once::new();

fn setup() -> (WebDom, Templates<WebDom>, Container<WebDom>, Element) {
	INIT.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let div = document.create_element("div").unwrap();
	body.append_child(&div).unwrap();

	let dom = WebDom::new(document);
	let templates = Templates::new(dom.clone());
	(dom, templates, Container::new(div.clone().into()), div)
}

#[wasm_bindgen_test]
fn renders_text_and_attributes() {
	let (dom, templates, mut container, div) = setup();
	render(&dom, &html!(templates, r#"<p class="a {}">{}</p>"#, "b", "text").unwrap(), &mut container);
	assert_eq!(div.inner_html(), r#"<p class="a b">text</p>"#);
}

#[wasm_bindgen_test]
fn updates_in_place() {
	let (dom, templates, mut container, div) = setup();
	let view = |value: i64| html!(templates, "<h1>{}</h1>", value).unwrap();

	render(&dom, &view(1), &mut container);
	let h1 = div.first_element_child().unwrap();
	render(&dom, &view(2), &mut container);

	assert_eq!(div.inner_html(), "<h1>2</h1>");
	assert!(div.first_element_child().unwrap().is_same_node(Some(&h1)));
}

#[wasm_bindgen_test]
fn reconciles_lists() {
	let (dom, templates, mut container, div) = setup();
	let list = |items: &[&str]| {
		let items = items.iter().map(|item| html!(templates, "<li>{}</li>", *item)).collect::<Result<Vec<_>, _>>().unwrap();
		html!(templates, "<ul>{}</ul>", items).unwrap()
	};

	render(&dom, &list(&["a", "b", "c"]), &mut container);
	assert_eq!(div.inner_html(), "<ul><li>a</li><li>b</li><li>c</li></ul>");

	render(&dom, &list(&["x", "y"]), &mut container);
	assert_eq!(div.inner_html(), "<ul><li>x</li><li>y</li></ul>");
}

#[wasm_bindgen_test]
fn text_is_not_parsed_as_markup() {
	let (dom, templates, mut container, div) = setup();
	render(&dom, &html!(templates, "<div>{}</div>", "<script>alert(1)</script>").unwrap(), &mut container);
	assert_eq!(div.inner_html(), "<div>&lt;script&gt;alert(1)&lt;/script&gt;</div>");
}

#[wasm_bindgen_test]
fn nodes_are_inserted_directly() {
	let (dom, templates, mut container, div) = setup();
	let span = dom.create_element("span");
	render(&dom, &html!(templates, "<div>{}</div>", Value::node(span.clone())).unwrap(), &mut container);
	assert_eq!(div.inner_html(), "<div><span></span></div>");
	assert!(dom.parent(&span).is_some());
}
