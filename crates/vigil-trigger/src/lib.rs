//! Trigger processing for the vigil monitoring agent
//!
//! A trigger is a boolean condition over item check histories. Each cycle
//! the [`TriggerProcessor`] resolves the condition's placeholders, evaluates
//! the resulting expression, and on a status transition dispatches the
//! trigger's matching action list.

mod condition;
mod cycle;
mod expr;

pub use condition::{ConditionEvaluator, ConditionResult, EvaluationError};
pub use cycle::TriggerProcessor;
pub use expr::{ExprError, ExprResult, ExprValue};
