//! Conversions between `dash-case` attribute names and `camelCase` property names.
//!
//! Both directions are memoized per thread.

use core::cell::RefCell;
use hashbrown::HashMap;

thread_local! {
	static DASH_TO_CAMEL: RefCell<HashMap<String, String>> = RefCell::default();
	static CAMEL_TO_DASH: RefCell<HashMap<String, String>> = RefCell::default();
}

fn memoized(cache: &'static std::thread::LocalKey<RefCell<HashMap<String, String>>>, key: &str, convert: impl FnOnce(&str) -> String) -> String {
	cache.with(|cache| {
		if let Some(converted) = cache.borrow().get(key) {
			return converted.clone();
		}
		let converted = convert(key);
		cache.borrow_mut().insert(key.to_owned(), converted.clone());
		converted
	})
}

/// `some-prop` becomes `someProp`. Only a dash followed by a lowercase ASCII letter is folded.
#[must_use]
pub fn dash_to_camel_case(dash: &str) -> String {
	memoized(&DASH_TO_CAMEL, dash, |dash| {
		if !dash.contains('-') {
			return dash.to_owned();
		}
		let mut camel = String::with_capacity(dash.len());
		let mut chars = dash.chars().peekable();
		while let Some(c) = chars.next() {
			match chars.peek() {
				Some(next) if c == '-' && next.is_ascii_lowercase() => {
					camel.push(next.to_ascii_uppercase());
					chars.next();
				}
				_ => camel.push(c),
			}
		}
		camel
	})
}

/// `someProp` becomes `some-prop`. The result is lowercase throughout.
#[must_use]
pub fn camel_to_dash_case(camel: &str) -> String {
	memoized(&CAMEL_TO_DASH, camel, |camel| {
		let mut dash = String::with_capacity(camel.len() + 2);
		for c in camel.chars() {
			if c.is_ascii_uppercase() {
				dash.push('-');
			}
			dash.extend(c.to_lowercase());
		}
		dash
	})
}

/// Uppercases the first character.
#[must_use]
pub fn capitalize(name: &str) -> String {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
