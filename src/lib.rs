#![doc(html_root_url = "https://docs.rs/lti-dom/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod case;
pub mod component;
mod definition;
mod dom;
mod error;
mod instance;
mod markup;
pub mod mem;
mod part;
mod processor;
mod render;
mod rule;
mod template;
mod value;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use definition::TemplateDefinition;
pub use dom::{Dom, NodeKind};
pub use error::Error;
pub use instance::TemplateInstance;
pub use part::{AttributePart, NodePart, Part};
pub use processor::{PropertyProcessor, Reconciler, TemplateProcessor};
pub use render::{render, Container};
pub use rule::{AttributeRule, NodeRule, Rule};
pub use template::{CallSite, CallSiteId, TemplateAssembly, Templates};
pub use value::{Primitive, Value};

/// Builds a [`TemplateAssembly`] through a [`Templates`] builder.
///
/// `{}` marks an interpolation, `{{` and `}}` are literal braces.
/// Each value is converted with [`Value::from`].
///
/// Every invocation site caches its own [`TemplateDefinition`], so repeated evaluation never parses the markup again.
///
/// # Errors
///
/// The expansion evaluates to a [`Result`] from [`Templates::html`].
#[macro_export]
macro_rules! html {
	($templates:expr, $markup:literal $(, $value:expr)* $(,)?) => {{
		static CALL_SITE: $crate::CallSite = $crate::CallSite::new($markup);
		$templates.html(&CALL_SITE, ::std::vec![$($crate::Value::from($value)),*])
	}};
}
