//! Errors raised during placeholder resolution

use thiserror::Error;

use crate::position::Highlight;

pub type TemplateResult<T> = Result<T, PlaceholderError>;

/// A placeholder that could not be resolved.
///
/// Every variant carries a caret diagram pointing into the template text; the
/// rendered message is written verbatim into the owning document's error
/// record, so the wording here is part of the persisted format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    /// The token matches no registered provider
    #[error("Unsupported expression: '{token}'{pos}")]
    UnsupportedExpression { token: String, pos: Highlight },

    /// An item reference names an item missing from the context
    #[error("Unknown item '{name}'{pos}")]
    UnknownItem { name: String, pos: Highlight },

    /// An item reference names a selector that does not exist
    #[error("Unsupported selector '{name}'{pos}")]
    UnsupportedSelector { name: String, pos: Highlight },

    /// A selector rejected its parameter
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A custom provider failed on its own terms
    #[error("{message}{pos}")]
    Provider { message: String, pos: Highlight },
}

/// A history selector's parameter was malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// Position arguments are 1-based; `#0` is meaningless
    #[error("Position must be greater than 0\n{pos}")]
    NonPositivePosition { pos: Highlight },

    /// The parameter is not a `#N` position
    #[error("Unknown parameter: '{param}'\n{pos}")]
    UnknownParameter { param: String, pos: Highlight },
}
