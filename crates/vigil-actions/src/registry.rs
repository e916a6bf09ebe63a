//! The action-kind registry
//!
//! Action documents carry a `type` naming the kind that executes them. Kinds
//! live in an open, name-keyed registry; the built-ins (`notification`,
//! `command`) are registered the same way a deployment-specific kind would
//! be.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use vigil_core::{ActionDoc, ItemHistories, MailTransport, ProcessExecutor};
use vigil_template::ProviderRegistry;

use crate::command::CommandKind;
use crate::error::ActionResult;
use crate::notification::NotificationKind;

/// Resolution context shared by every action in one list run.
pub struct ActionContext<'a> {
    /// Providers for resolving the action's placeholder-bearing fields
    pub providers: &'a ProviderRegistry,

    /// JSON snapshot of the owning trigger, as of the transition
    pub trigger: &'a Value,

    /// Item histories, newest first
    pub items: &'a ItemHistories,
}

/// One kind of action.
///
/// `execute` owns the whole attempt: resolving fields, performing the
/// effect, and updating the action's bookkeeping fields. A returned error is
/// recorded on the action by the dispatcher; it never affects siblings.
#[async_trait]
pub trait ActionKind: Send + Sync {
    /// Run one attempt, returning an optional human-readable receipt.
    async fn execute(
        &self,
        action: &mut ActionDoc,
        ctx: &ActionContext<'_>,
    ) -> ActionResult<Option<String>>;
}

/// Registry of action kinds, keyed by the document `type` value.
pub struct ActionRegistry {
    kinds: DashMap<String, Arc<dyn ActionKind>>,
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            kinds: DashMap::new(),
        }
    }

    /// A registry with the built-in kinds wired to the given collaborators.
    /// `config_dir` anchors relative working directories of command actions.
    pub fn standard(
        mailer: Arc<dyn MailTransport>,
        executor: Arc<dyn ProcessExecutor>,
        config_dir: PathBuf,
    ) -> Self {
        let registry = Self::new();
        registry.register("notification", Arc::new(NotificationKind::new(mailer)));
        registry.register("command", Arc::new(CommandKind::new(executor, config_dir)));
        registry
    }

    /// Register a kind under a type name, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, kind: Arc<dyn ActionKind>) {
        let name = name.into();
        debug!(kind = %name, "registering action kind");
        self.kinds.insert(name, kind);
    }

    /// Look up the kind for a type name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionKind>> {
        self.kinds.get(name).map(|entry| entry.value().clone())
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
