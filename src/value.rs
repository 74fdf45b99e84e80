//! Interpolated values, resolved into a closed set of shapes once at the builder boundary.

use crate::{dom::Dom, template::TemplateAssembly};
use core::{
	convert::TryFrom,
	fmt::{self, Debug, Display, Formatter},
	iter::FromIterator,
};
use std::rc::Rc;
use tracing::warn;

/// Values that are dirty-checked by equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
	Str(String),
	Int(i64),
	Float(f64),
	Bool(bool),
}

impl Display for Primitive {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Primitive::Str(s) => f.write_str(s),
			Primitive::Int(i) => write!(f, "{}", i),
			Primitive::Bool(b) => write!(f, "{}", b),
			Primitive::Float(x) if x.is_nan() => f.write_str("NaN"),
			Primitive::Float(x) if x.is_infinite() => f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" }),
			// Also normalizes `-0`.
			Primitive::Float(x) if *x == 0.0 => f.write_str("0"),
			Primitive::Float(x) => write!(f, "{}", x),
		}
	}
}

/// Anything that can be interpolated into a template.
pub enum Value<D: Dom> {
	Null,
	Primitive(Primitive),
	/// A nested template, rendered as its own [`TemplateInstance`](`crate::TemplateInstance`).
	Template(TemplateAssembly<D>),
	/// Reconciled by position, never by key.
	Sequence(Vec<Value<D>>),
	/// A host node that is moved into place as-is.
	Node(D::Node),
	/// Fallback that renders through [`Display`] and is never dirty-checked.
	Opaque(Rc<dyn Display>),
}

impl<D: Dom> Value<D> {
	#[must_use]
	pub fn node(node: D::Node) -> Self {
		Self::Node(node)
	}

	#[must_use]
	pub fn opaque(value: impl Display + 'static) -> Self {
		Self::Opaque(Rc::new(value))
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// A name for the variant, for log records that mustn't contain content.
	#[must_use]
	pub fn shape(&self) -> &'static str {
		match self {
			Value::Null => "Null",
			Value::Primitive(_) => "Primitive",
			Value::Template(_) => "Template",
			Value::Sequence(_) => "Sequence",
			Value::Node(_) => "Node",
			Value::Opaque(_) => "Opaque",
		}
	}

	/// String coercion as used for attribute values and plain text positions.
	///
	/// `Null` becomes empty, sequences join their items with `,` and nodes contribute their text content.
	#[must_use]
	pub fn to_text(&self, dom: &D) -> String {
		match self {
			Value::Null => String::new(),
			Value::Primitive(primitive) => primitive.to_string(),
			Value::Template(_) => {
				warn!("A nested template can't be rendered as text. Rendering nothing instead.");
				String::new()
			}
			Value::Sequence(items) => items.iter().map(|item| item.to_text(dom)).collect::<Vec<_>>().join(","),
			Value::Node(node) => dom.text_content(node),
			Value::Opaque(opaque) => opaque.to_string(),
		}
	}
}

impl<D: Dom> Clone for Value<D> {
	fn clone(&self) -> Self {
		match self {
			Value::Null => Value::Null,
			Value::Primitive(primitive) => Value::Primitive(primitive.clone()),
			Value::Template(assembly) => Value::Template(assembly.clone()),
			Value::Sequence(items) => Value::Sequence(items.clone()),
			Value::Node(node) => Value::Node(node.clone()),
			Value::Opaque(opaque) => Value::Opaque(Rc::clone(opaque)),
		}
	}
}

impl<D: Dom> Debug for Value<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("Null"),
			Value::Primitive(primitive) => f.debug_tuple("Primitive").field(primitive).finish(),
			Value::Template(assembly) => f.debug_tuple("Template").field(assembly).finish(),
			Value::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
			Value::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Value::Opaque(opaque) => f.debug_tuple("Opaque").field(&format_args!("{}", opaque)).finish(),
		}
	}
}

impl<D: Dom> From<Primitive> for Value<D> {
	fn from(primitive: Primitive) -> Self {
		Self::Primitive(primitive)
	}
}

impl<'a, D: Dom> From<&'a str> for Value<D> {
	fn from(s: &'a str) -> Self {
		Self::Primitive(Primitive::Str(s.to_owned()))
	}
}

impl<D: Dom> From<String> for Value<D> {
	fn from(s: String) -> Self {
		Self::Primitive(Primitive::Str(s))
	}
}

impl<D: Dom> From<char> for Value<D> {
	fn from(c: char) -> Self {
		Self::Primitive(Primitive::Str(c.to_string()))
	}
}

impl<D: Dom> From<bool> for Value<D> {
	fn from(b: bool) -> Self {
		Self::Primitive(Primitive::Bool(b))
	}
}

macro_rules! from_lossless_int {
	($($int:ty),*$(,)?) => {$(
		impl<D: Dom> From<$int> for Value<D> {
			fn from(i: $int) -> Self {
				Self::Primitive(Primitive::Int(i.into()))
			}
		}
	)*};
}
from_lossless_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! from_wide_int {
	($($int:ty),*$(,)?) => {$(
		impl<D: Dom> From<$int> for Value<D> {
			#[allow(clippy::cast_precision_loss)]
			fn from(i: $int) -> Self {
				Self::Primitive(i64::try_from(i).map_or(Primitive::Float(i as f64), Primitive::Int))
			}
		}
	)*};
}
from_wide_int!(u64, usize, isize);

impl<D: Dom> From<f32> for Value<D> {
	fn from(x: f32) -> Self {
		Self::Primitive(Primitive::Float(x.into()))
	}
}

impl<D: Dom> From<f64> for Value<D> {
	fn from(x: f64) -> Self {
		Self::Primitive(Primitive::Float(x))
	}
}

impl<D: Dom> From<TemplateAssembly<D>> for Value<D> {
	fn from(assembly: TemplateAssembly<D>) -> Self {
		Self::Template(assembly)
	}
}

impl<D: Dom, T: Into<Value<D>>> From<Option<T>> for Value<D> {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Null, Into::into)
	}
}

impl<D: Dom, T: Into<Value<D>>> From<Vec<T>> for Value<D> {
	fn from(items: Vec<T>) -> Self {
		items.into_iter().collect()
	}
}

impl<D: Dom, T: Into<Value<D>>> FromIterator<T> for Value<D> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::Sequence(iter.into_iter().map(Into::into).collect())
	}
}
