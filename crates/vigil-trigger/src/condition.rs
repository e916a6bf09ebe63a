//! Condition evaluation: from trigger expression to boolean

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use vigil_core::{ItemHistories, TriggerDoc};
use vigil_template::{
    resolve_placeholders, Highlight, PlaceholderError, ProviderRegistry, ResolveContext,
    SourceText,
};

use crate::expr::{self, ExprError};

pub type ConditionResult<T> = Result<T, EvaluationError>;

/// A trigger condition that could not be evaluated.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A placeholder in the expression failed to resolve
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    /// The resolved text is not a valid expression; the diagram points into
    /// the resolved form, after substitution
    #[error("{source}{pos}")]
    Expression {
        #[source]
        source: ExprError,
        pos: Highlight,
    },
}

/// Evaluates trigger conditions against an item history snapshot.
///
/// String-valued placeholders are quoted on substitution so that a check
/// value like `95` becomes the string operand `'95'` and survives tokenizing;
/// numeric coercion then happens inside the evaluator.
pub struct ConditionEvaluator {
    providers: Arc<ProviderRegistry>,
}

impl ConditionEvaluator {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    /// Evaluate a trigger's condition to a boolean.
    pub fn evaluate(&self, trigger: &TriggerDoc, items: &ItemHistories) -> ConditionResult<bool> {
        let snapshot = serde_json::to_value(trigger).unwrap_or(serde_json::Value::Null);
        let ctx = ResolveContext::new(&self.providers, items)
            .with_trigger(&snapshot)
            .for_field("expression")
            .quoted();
        let condition = resolve_placeholders(&trigger.expression, &ctx)?;
        debug!(trigger = %trigger.name, condition = %condition, "evaluating condition");

        match expr::evaluate(&condition) {
            Ok(value) => Ok(value.truthy()),
            Err(source) => {
                let text = SourceText::new(&condition, Some("expression"));
                let start = source.offset().min(condition.len());
                let end = (start + source.width()).min(condition.len());
                let pos = text.cursor(start).highlight(&condition[start..end]);
                Err(EvaluationError::Expression { source, pos })
            }
        }
    }
}
