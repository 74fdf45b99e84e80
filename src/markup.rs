//! A forgiving HTML fragment parser for [`mem::Document`](`crate::mem::Document`).
//!
//! This covers what template markup needs, not the full HTML5 tree construction algorithm:
//!
//! - Tag and attribute names are ASCII-lowercased. Attribute names may contain any character except whitespace, `/`, `>` and `=`.
//! - Attribute values may be double-quoted, single-quoted or unquoted. The first of duplicate attributes wins.
//! - Void elements never have content. `/>` is ignored on other elements, just like browsers do.
//! - `script` and `style` contain raw text, `textarea` and `title` contain text with character references.
//! - A small set of end tags is implied (`li`, `p`, `option`, `dt`/`dd`, `tr`, `td`/`th`).
//! - Stray end tags are ignored and unclosed elements are closed at the end of input.
//!
//! Parsing never fails.

use crate::mem::{ElementData, NodeData};
use indextree::{Arena, NodeId};
use memchr::memchr;
use std::borrow::Cow;
use tracing::trace;

pub(crate) fn is_void_element(name: &str) -> bool {
	matches!(
		name,
		"area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
	)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawText {
	/// No character references.
	Raw,
	/// Character references, but no tags.
	Escapable,
}

fn raw_text_kind(name: &str) -> Option<RawText> {
	match name {
		"script" | "style" => Some(RawText::Raw),
		"textarea" | "title" => Some(RawText::Escapable),
		_ => None,
	}
}

fn closes_paragraph(name: &str) -> bool {
	matches!(
		name,
		"address"
			| "article" | "aside"
			| "blockquote"
			| "div" | "dl" | "fieldset"
			| "footer" | "form"
			| "h1" | "h2" | "h3"
			| "h4" | "h5" | "h6"
			| "header" | "hr"
			| "main" | "nav" | "ol"
			| "p" | "pre" | "section"
			| "table" | "ul"
	)
}

fn is_whitespace(byte: u8) -> bool {
	matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// Decodes the character references this parser knows. Unknown ones stay literal.
pub(crate) fn decode_entities(text: &str) -> Cow<'_, str> {
	let bytes = text.as_bytes();
	let mut i = match memchr(b'&', bytes) {
		Some(i) => i,
		None => return Cow::Borrowed(text),
	};

	let mut decoded = String::with_capacity(text.len());
	decoded.push_str(&text[..i]);
	while i < bytes.len() {
		if bytes[i] != b'&' {
			let next = memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
			decoded.push_str(&text[i..next]);
			i = next;
			continue;
		}

		let rest = &text[i + 1..];
		let reference = rest.find(';').map(|end| (&rest[..end], end));
		let character = reference.and_then(|(name, _)| match name {
			"amp" => Some('&'),
			"lt" => Some('<'),
			"gt" => Some('>'),
			"quot" => Some('"'),
			"apos" => Some('\''),
			"nbsp" => Some('\u{A0}'),
			_ => {
				let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
					u32::from_str_radix(hex, 16).ok()
				} else if let Some(decimal) = name.strip_prefix('#') {
					decimal.parse().ok()
				} else {
					None
				};
				code.and_then(char::from_u32)
			}
		});

		match (character, reference) {
			(Some(character), Some((_, end))) => {
				decoded.push(character);
				i += end + 2;
			}
			_ => {
				decoded.push('&');
				i += 1;
			}
		}
	}
	Cow::Owned(decoded)
}

struct Tag {
	name: String,
	attributes: Vec<(String, String)>,
}

/// Parses a start tag. `input` starts right after the `<`.
///
/// Returns the tag and the number of bytes consumed.
fn start_tag(input: &str) -> (Tag, usize) {
	let bytes = input.as_bytes();
	let len = bytes.len();
	let skip_whitespace = |i: &mut usize| {
		while *i < len && is_whitespace(bytes[*i]) {
			*i += 1;
		}
	};

	let mut i = 0;
	while i < len && !is_whitespace(bytes[i]) && !matches!(bytes[i], b'/' | b'>') {
		i += 1;
	}
	let name = input[..i].to_ascii_lowercase();

	let mut attributes: Vec<(String, String)> = Vec::new();
	loop {
		skip_whitespace(&mut i);
		if i >= len {
			break;
		}
		match bytes[i] {
			b'>' => {
				i += 1;
				break;
			}
			b'/' | b'=' => {
				i += 1;
				continue;
			}
			_ => (),
		}

		let start = i;
		while i < len && !is_whitespace(bytes[i]) && !matches!(bytes[i], b'/' | b'>' | b'=') {
			i += 1;
		}
		let attribute_name = input[start..i].to_ascii_lowercase();

		skip_whitespace(&mut i);
		let mut value = String::new();
		if i < len && bytes[i] == b'=' {
			i += 1;
			skip_whitespace(&mut i);
			if i < len && matches!(bytes[i], b'"' | b'\'') {
				let quote = bytes[i];
				i += 1;
				let end = memchr(quote, &bytes[i..]).map_or(len, |rel| i + rel);
				value = decode_entities(&input[i..end]).into_owned();
				i = (end + 1).min(len);
			} else {
				let start = i;
				while i < len && !is_whitespace(bytes[i]) && bytes[i] != b'>' {
					i += 1;
				}
				value = decode_entities(&input[start..i]).into_owned();
			}
		}

		if attributes.iter().all(|(existing, _)| *existing != attribute_name) {
			attributes.push((attribute_name, value));
		}
	}

	(Tag { name, attributes }, i)
}

/// Finds `</name` followed by whitespace, `/` or `>`, ignoring ASCII case.
///
/// Returns the start of the close tag and the position right after it.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
	let bytes = haystack.as_bytes();
	let mut i = 0;
	while let Some(rel) = memchr(b'<', &bytes[i..]) {
		i += rel;
		let name_start = i + 2;
		let name_end = name_start + name.len();
		if bytes.get(i + 1) == Some(&b'/')
			&& bytes.get(name_start..name_end).map_or(false, |candidate| candidate.eq_ignore_ascii_case(name.as_bytes()))
			&& bytes.get(name_end).map_or(true, |&b| is_whitespace(b) || matches!(b, b'/' | b'>'))
		{
			let end = memchr(b'>', &bytes[name_end..]).map_or(bytes.len(), |rel| name_end + rel + 1);
			return Some((i, end));
		}
		i += 1;
	}
	None
}

struct TreeBuilder<'a> {
	arena: &'a mut Arena<NodeData>,
	/// Open elements, with the fragment at the bottom.
	open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
	fn current(&self) -> NodeId {
		*self.open.last().expect("lti-dom bug: The fragment was popped.")
	}

	fn current_name(&self) -> Option<&str> {
		match self.arena[self.current()].get() {
			NodeData::Element(element) => Some(element.name()),
			_ => None,
		}
	}

	fn text(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		let current = self.current();
		if let Some(last) = self.arena[current].last_child() {
			if let NodeData::Text(existing) = self.arena[last].get_mut() {
				existing.push_str(text);
				return;
			}
		}
		let node = self.arena.new_node(NodeData::Text(text.to_owned()));
		current.append(node, self.arena);
	}

	fn comment(&mut self, comment: &str) {
		let node = self.arena.new_node(NodeData::Comment(comment.to_owned()));
		self.current().append(node, self.arena);
	}

	fn close_implied(&mut self, name: &str) {
		let implied: &[&str] = match name {
			"li" => &["li"],
			"dt" | "dd" => &["dt", "dd"],
			"option" => &["option"],
			"tr" => &["tr", "td", "th"],
			"td" | "th" => &["td", "th"],
			_ if closes_paragraph(name) => &["p"],
			_ => &[],
		};
		while self.open.len() > 1 && self.current_name().map_or(false, |current| implied.contains(&current)) {
			self.open.pop();
		}
	}

	fn start_tag(&mut self, tag: Tag) -> Option<RawText> {
		self.close_implied(&tag.name);
		let raw_text = raw_text_kind(&tag.name);
		let void = is_void_element(&tag.name);
		let element = self.arena.new_node(NodeData::Element(ElementData::new(tag.name, tag.attributes)));
		self.current().append(element, self.arena);
		if void {
			None
		} else {
			self.open.push(element);
			raw_text
		}
	}

	fn end_tag(&mut self, name: &str) {
		let position = self.open.iter().rposition(|&open| match self.arena[open].get() {
			NodeData::Element(element) => element.name() == name,
			_ => false,
		});
		match position {
			Some(position) => self.open.truncate(position),
			None => trace!("Ignoring stray end tag </{}>.", name),
		}
	}
}

/// Parses `markup` into a new detached fragment.
pub(crate) fn parse(arena: &mut Arena<NodeData>, markup: &str) -> NodeId {
	let fragment = arena.new_node(NodeData::Fragment);
	let mut builder = TreeBuilder { arena, open: vec![fragment] };

	let bytes = markup.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		let next = memchr(b'<', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
		if next > i {
			builder.text(&decode_entities(&markup[i..next]));
			i = next;
			continue;
		}

		let rest = &markup[i..];
		if let Some(body) = rest.strip_prefix("<!--") {
			match body.find("-->") {
				Some(end) => {
					builder.comment(&body[..end]);
					i += 4 + end + 3;
				}
				None => {
					builder.comment(body);
					i = bytes.len();
				}
			}
		} else if rest.starts_with("<!") || rest.starts_with("<?") {
			// Doctypes and bogus comments have no place in templates.
			i = memchr(b'>', &bytes[i..]).map_or(bytes.len(), |rel| i + rel + 1);
		} else if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
			let end = memchr(b'>', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
			let name_end = markup[i + 2..end].find(|c: char| c.is_ascii_whitespace() || c == '/').map_or(end, |rel| i + 2 + rel);
			builder.end_tag(&markup[i + 2..name_end].to_ascii_lowercase());
			i = (end + 1).min(bytes.len());
		} else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
			let (tag, consumed) = start_tag(&rest[1..]);
			i += 1 + consumed;
			let name = tag.name.clone();
			if let Some(raw_text) = builder.start_tag(tag) {
				let (content_end, resume) = find_close_tag(&markup[i..], &name).map_or((bytes.len(), bytes.len()), |(start, end)| (i + start, i + end));
				let content = &markup[i..content_end];
				match raw_text {
					RawText::Raw => builder.text(content),
					RawText::Escapable => builder.text(&decode_entities(content)),
				}
				builder.end_tag(&name);
				i = resume;
			}
		} else {
			builder.text("<");
			i += 1;
		}
	}

	fragment
}
