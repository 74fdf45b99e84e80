use thiserror::Error;

/// Failures raised while building template definitions or wiring components.
///
/// The reconciler itself never fails: every value has a rendering.
#[derive(Debug, Error)]
pub enum Error {
	#[error("expression {index} is not bound to a node or attribute position (placeholders in comments or tag names are not supported)")]
	UnboundExpression { index: usize },

	#[error("placeholder `{token}` does not name an expression")]
	UnknownPlaceholder { token: String },

	#[error("placeholders are not supported in attribute names (found in `{name}`)")]
	PlaceholderInAttributeName { name: String },

	#[error("the host could not parse template markup: {0}")]
	Parse(String),

	#[error("a component named `{0}` is already defined")]
	AlreadyDefined(String),

	#[error("no component named `{0}` is defined")]
	UndefinedComponent(String),

	#[error("`{property}` is not a declared property of `{is}`")]
	UnknownProperty { is: String, property: String },
}
