//! The `command` action kind: run an external command on a transition

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vigil_core::{
    resolve_cwd, timestamp, ActionDoc, ErrorInfo, ErrorRecord, ExecutionRecord, ProcessExecutor,
    TextLines,
};
use vigil_template::{resolve_placeholders, ResolveContext};

use crate::error::{ActionError, ActionResult};
use crate::registry::{ActionContext, ActionKind};

/// Runs the action's `command` token vector through the process executor
/// and records the outcome in `lastExecution`.
///
/// With the `expand` flag set, each token is placeholder-resolved before the
/// spawn; otherwise tokens run verbatim. A relative `cwd` resolves against
/// the configuration file's directory.
pub struct CommandKind {
    executor: Arc<dyn ProcessExecutor>,
    config_dir: PathBuf,
}

impl CommandKind {
    pub fn new(executor: Arc<dyn ProcessExecutor>, config_dir: PathBuf) -> Self {
        Self {
            executor,
            config_dir,
        }
    }
}

#[async_trait]
impl ActionKind for CommandKind {
    async fn execute(
        &self,
        action: &mut ActionDoc,
        ctx: &ActionContext<'_>,
    ) -> ActionResult<Option<String>> {
        action.last_execution = None;
        let tokens = command_tokens(action)?;

        let argv = if action.flag("expand") {
            let rctx = ResolveContext::new(ctx.providers, ctx.items)
                .with_trigger(ctx.trigger)
                .for_field("command");
            // resolve the whole vector first: a syntax error then reports
            // its position with one line per token
            resolve_placeholders(&TextLines::from(tokens.clone()), &rctx)?;
            let mut resolved = Vec::with_capacity(tokens.len());
            for token in tokens {
                resolved.push(resolve_placeholders(&TextLines::from(token), &rctx)?);
            }
            resolved
        } else {
            tokens
        };

        let cwd = action
            .field("cwd")
            .and_then(Value::as_str)
            .map(|dir| resolve_cwd(&self.config_dir, dir));

        let record = match self.executor.run(&argv, cwd.as_deref()).await {
            Ok(result) => ExecutionRecord::Finished(result),
            Err(err) => ExecutionRecord::Failure(ErrorRecord {
                error: ErrorInfo::from_error(&err),
                time: timestamp(),
            }),
        };
        action.last_execution = Some(record);
        Ok(None)
    }
}

fn command_tokens(action: &ActionDoc) -> ActionResult<Vec<String>> {
    let Some(value) = action.field("command") else {
        return Err(ActionError::MissingField("command"));
    };
    match TextLines::from_value(value) {
        Some(TextLines::Many(tokens)) => Ok(tokens),
        _ => Err(ActionError::InvalidField {
            field: "command",
            expected: "an array of strings",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use serde_json::json;

    use vigil_core::{CheckResult, ItemHistories, ProcessError};
    use vigil_template::ProviderRegistry;

    /// Records spawn requests and returns a canned result.
    struct RecordingExecutor {
        calls: Mutex<Vec<(Vec<String>, Option<PathBuf>)>>,
    }

    impl RecordingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProcessExecutor for RecordingExecutor {
        async fn run(
            &self,
            argv: &[String],
            cwd: Option<&Path>,
        ) -> Result<CheckResult, ProcessError> {
            if argv.is_empty() {
                return Err(ProcessError::EmptyCommand);
            }
            self.calls
                .lock()
                .unwrap()
                .push((argv.to_vec(), cwd.map(Path::to_path_buf)));
            let mut result = CheckResult::at("2026-01-01 00:00:00.000".to_string());
            result.stdout = Some(vec!["done".to_string()]);
            Ok(result)
        }
    }

    fn context<'a>(
        providers: &'a ProviderRegistry,
        trigger: &'a Value,
        items: &'a ItemHistories,
    ) -> ActionContext<'a> {
        ActionContext {
            providers,
            trigger,
            items,
        }
    }

    #[tokio::test]
    async fn test_runs_tokens_verbatim_without_expand() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut action = ActionDoc::of_kind("command")
            .with_field("command", json!(["notify", "{trigger:name}"]));
        kind.execute(&mut action, &ctx).await.unwrap();

        let calls = executor.calls.lock().unwrap();
        // without expand the placeholder is part of the literal argument
        assert_eq!(calls[0].0, vec!["notify", "{trigger:name}"]);
        assert_eq!(calls[0].1, None);
        assert!(matches!(
            action.last_execution,
            Some(ExecutionRecord::Finished(_))
        ));
    }

    #[tokio::test]
    async fn test_expand_resolves_each_token() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = json!({"name": "cpu high", "status": "up"});
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut action = ActionDoc::of_kind("command")
            .with_field("command", json!(["notify", "{trigger:name}", "{trigger:status}"]))
            .with_field("expand", json!(true));
        kind.execute(&mut action, &ctx).await.unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].0, vec!["notify", "cpu high", "up"]);
    }

    #[tokio::test]
    async fn test_expand_failure_reports_token_line() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut action = ActionDoc::of_kind("command")
            .with_field("command", json!(["notify", "{item:gone}"]))
            .with_field("expand", json!(true));
        let err = kind.execute(&mut action, &ctx).await.unwrap_err();
        // the check pass resolves the joined vector, so the second token is line 2
        assert!(err.to_string().contains(" at line#2:"));
        assert_eq!(action.last_execution, None);
        assert!(executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cwd_resolves_against_config_dir() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut action = ActionDoc::of_kind("command")
            .with_field("command", json!(["true"]))
            .with_field("cwd", json!("scripts"));
        kind.execute(&mut action, &ctx).await.unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_deref(), Some(Path::new("/etc/vigil/scripts")));
    }

    #[tokio::test]
    async fn test_setup_failure_records_error_with_time() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut action = ActionDoc::of_kind("command").with_field("command", json!([]));
        kind.execute(&mut action, &ctx).await.unwrap();

        match &action.last_execution {
            Some(ExecutionRecord::Failure(record)) => {
                assert_eq!(record.error.msg.join(), "cannot execute an empty command");
                assert!(!record.time.is_empty());
            }
            other => panic!("expected a failure record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_must_be_an_array_of_strings() {
        let executor = RecordingExecutor::new();
        let kind = CommandKind::new(executor.clone(), PathBuf::from("/etc/vigil"));
        let registry = ProviderRegistry::standard();
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let mut missing = ActionDoc::of_kind("command");
        let err = kind.execute(&mut missing, &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field 'command'");

        let mut stringly = ActionDoc::of_kind("command").with_field("command", json!("true"));
        let err = kind.execute(&mut stringly, &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Field 'command' must be an array of strings");
    }
}
