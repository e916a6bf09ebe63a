//! Placeholder resolution for vigil
//!
//! Trigger expressions and action properties may embed `{...}` placeholders
//! that pull in live data: item history selectors, environment variables,
//! host identity, and fields of the owning trigger. This crate owns the
//! token scanner, the provider registry, the history selectors, and the
//! caret-diagram error positions that make resolution failures point at the
//! exact offending span.

mod error;
mod position;
mod providers;
mod resolver;
mod selector;
mod value;

pub use error::{PlaceholderError, SelectorError, TemplateResult};
pub use position::{Cursor, Highlight, SourceText};
pub use providers::{FnProvider, ProviderContext, ProviderRegistry, VariableProvider};
pub use resolver::{resolve_placeholders, ResolveContext, Transform};
pub use selector::Selector;
pub use value::{quote_value, render_value};
