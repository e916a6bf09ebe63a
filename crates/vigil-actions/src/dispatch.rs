//! Concurrent execution of a trigger's action lists

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use vigil_core::{ActionDoc, ErrorInfo, ItemHistories};
use vigil_template::ProviderRegistry;

use crate::error::{DispatchError, DispatchResult};
use crate::registry::{ActionContext, ActionKind, ActionRegistry};

/// Runs action lists against the kind registry.
///
/// Dispatch is all-or-nothing at the lookup stage and isolated after it:
/// every `type` in the list must be registered before any attempt launches,
/// and once the attempts are in flight a failure lands on its own action's
/// `error` field without touching the siblings.
pub struct ActionDispatcher {
    registry: Arc<ActionRegistry>,
    providers: Arc<ProviderRegistry>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ActionRegistry>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            providers,
        }
    }

    /// Run every action in `actions` concurrently against the trigger
    /// snapshot and the item histories.
    pub async fn run_actions(
        &self,
        actions: &mut [ActionDoc],
        trigger: &Value,
        items: &ItemHistories,
    ) -> DispatchResult<()> {
        if actions.is_empty() {
            return Ok(());
        }

        // Resolve every kind up front; an unknown type anywhere means no
        // action in the list runs.
        let kinds = actions
            .iter()
            .map(|action| {
                self.registry
                    .get(&action.kind)
                    .ok_or_else(|| DispatchError::UnknownActionType(action.kind.clone()))
            })
            .collect::<DispatchResult<Vec<_>>>()?;

        let ctx = ActionContext {
            providers: self.providers.as_ref(),
            trigger,
            items,
        };
        let attempts = actions
            .iter_mut()
            .zip(kinds)
            .map(|(action, kind)| Self::attempt(action, kind, &ctx));
        join_all(attempts).await;
        Ok(())
    }

    async fn attempt(action: &mut ActionDoc, kind: Arc<dyn ActionKind>, ctx: &ActionContext<'_>) {
        action.error = None;
        match kind.execute(action, ctx).await {
            Ok(Some(receipt)) => debug!(kind = %action.kind, %receipt, "action finished"),
            Ok(None) => debug!(kind = %action.kind, "action finished"),
            Err(err) => {
                warn!(kind = %action.kind, error = %err, "action failed");
                action.error = Some(ErrorInfo::from_error(&err));
            }
        }
    }
}
