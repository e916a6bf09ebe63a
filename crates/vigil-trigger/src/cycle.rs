//! The per-trigger processing cycle

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use vigil_actions::{ActionDispatcher, ActionRegistry, DispatchResult};
use vigil_core::{timestamp, ActionList, ErrorInfo, ItemHistories, TriggerDoc, TriggerStatus};
use vigil_template::ProviderRegistry;

use crate::condition::ConditionEvaluator;

/// Drives one trigger through a processing cycle: evaluate the condition,
/// detect a status transition, run the matching action list.
///
/// Cycle failures (a condition that cannot be evaluated, a transition list
/// that cannot be dispatched) are recorded on the trigger and answered with
/// its `error-actions`. Only a failure of the error list itself escalates;
/// at that point there is nowhere left to report it.
pub struct TriggerProcessor {
    evaluator: ConditionEvaluator,
    dispatcher: ActionDispatcher,
}

impl TriggerProcessor {
    pub fn new(providers: Arc<ProviderRegistry>, registry: Arc<ActionRegistry>) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(providers.clone()),
            dispatcher: ActionDispatcher::new(registry, providers),
        }
    }

    /// Run one cycle for `trigger` against the current item histories.
    pub async fn process(
        &self,
        trigger: &mut TriggerDoc,
        items: &ItemHistories,
    ) -> DispatchResult<()> {
        trigger.error = None;
        trigger.last_processing_time = Some(timestamp());

        let status = match self.evaluator.evaluate(trigger, items) {
            Ok(holds) => {
                if holds {
                    TriggerStatus::Up
                } else {
                    TriggerStatus::Down
                }
            }
            Err(err) => return self.fail(trigger, items, &err).await,
        };

        if trigger.status == Some(status) {
            debug!(trigger = %trigger.name, status = %status, "status unchanged");
            return Ok(());
        }
        trigger.status = Some(status);
        trigger.since = trigger.last_processing_time.clone();
        info!(trigger = %trigger.name, status = %status, "trigger transitioned");

        match self.run_list(trigger, items, status.into()).await {
            Ok(()) => Ok(()),
            Err(err) => self.fail(trigger, items, &err).await,
        }
    }

    /// Record a cycle failure on the trigger and run its error list.
    async fn fail(
        &self,
        trigger: &mut TriggerDoc,
        items: &ItemHistories,
        err: &(dyn std::error::Error + 'static),
    ) -> DispatchResult<()> {
        warn!(trigger = %trigger.name, error = %err, "trigger cycle failed");
        trigger.error = Some(ErrorInfo::from_error(err));
        self.run_list(trigger, items, ActionList::Error).await
    }

    async fn run_list(
        &self,
        trigger: &mut TriggerDoc,
        items: &ItemHistories,
        list: ActionList,
    ) -> DispatchResult<()> {
        let Some(mut actions) = trigger.take_actions(list) else {
            return Ok(());
        };
        debug!(trigger = %trigger.name, list = %list, count = actions.len(), "running action list");
        // actions see the trigger as of this transition, bookkeeping included
        let snapshot = serde_json::to_value(&*trigger).unwrap_or(Value::Null);
        let outcome = self.dispatcher.run_actions(&mut actions, &snapshot, items).await;
        trigger.restore_actions(list, Some(actions));
        outcome
    }
}
