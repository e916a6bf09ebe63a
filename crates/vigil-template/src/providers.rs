//! Variable providers: the open registry behind `{...}` placeholders
//!
//! A placeholder is either a bare provider name (`{whoami}`) or a
//! prefix:argument pair (`{env:HOME}`, `{item:cpu.last(#2)}`). The registry
//! maps prefixes to providers; anything can be registered, the built-ins are
//! not special.

use std::env;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use vigil_core::{host, ItemHistories};

use crate::error::PlaceholderError;
use crate::position::Cursor;
use crate::selector::Selector;

/// Everything a provider may consult while resolving.
pub struct ProviderContext<'a> {
    /// JSON snapshot of the trigger that owns the template, when there is one
    pub trigger: Option<&'a Value>,

    /// Item histories visible to selectors, newest first
    pub items: &'a ItemHistories,

    /// Cursor at the provider's argument (or at the whole token for
    /// argument-less placeholders), for error reporting
    pub at: Cursor<'a>,
}

/// Resolves one placeholder prefix to a value.
pub trait VariableProvider: Send + Sync {
    /// Resolve with the argument text after the `:`, or `None` when the
    /// placeholder was just the bare provider name.
    fn resolve(&self, arg: Option<&str>, ctx: &ProviderContext<'_>)
        -> Result<Value, PlaceholderError>;
}

/// Adapter turning a plain function or closure into a provider.
pub struct FnProvider<F>(pub F);

impl<F> VariableProvider for FnProvider<F>
where
    F: Fn(Option<&str>, &ProviderContext<'_>) -> Result<Value, PlaceholderError> + Send + Sync,
{
    fn resolve(
        &self,
        arg: Option<&str>,
        ctx: &ProviderContext<'_>,
    ) -> Result<Value, PlaceholderError> {
        (self.0)(arg, ctx)
    }
}

/// Registry of placeholder providers, keyed by prefix.
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn VariableProvider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    /// A registry with the built-in providers: `whoami`, `hostname`, `env`,
    /// `trigger` and `item`.
    pub fn standard() -> Self {
        let registry = Self::new();
        registry.register("whoami", Arc::new(Whoami));
        registry.register("hostname", Arc::new(Hostname));
        registry.register("env", Arc::new(EnvVar));
        registry.register("trigger", Arc::new(TriggerField));
        registry.register("item", Arc::new(ItemQuery));
        registry
    }

    /// Register a provider under a prefix, replacing any previous one.
    pub fn register(&self, prefix: impl Into<String>, provider: Arc<dyn VariableProvider>) {
        let prefix = prefix.into();
        debug!(prefix = %prefix, "registering placeholder provider");
        self.providers.insert(prefix, provider);
    }

    /// Look up the provider for a prefix.
    pub fn get(&self, prefix: &str) -> Option<Arc<dyn VariableProvider>> {
        self.providers.get(prefix).map(|entry| entry.value().clone())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// --- built-in providers ---

/// `{whoami}`: the login name of the user running the agent.
struct Whoami;

impl VariableProvider for Whoami {
    fn resolve(&self, _: Option<&str>, _: &ProviderContext<'_>) -> Result<Value, PlaceholderError> {
        Ok(Value::String(host::username()))
    }
}

/// `{hostname}`: the local host name.
struct Hostname;

impl VariableProvider for Hostname {
    fn resolve(&self, _: Option<&str>, _: &ProviderContext<'_>) -> Result<Value, PlaceholderError> {
        Ok(Value::String(host::hostname()))
    }
}

/// `{env:NAME}`: an environment variable; unset variables resolve to `null`.
struct EnvVar;

impl VariableProvider for EnvVar {
    fn resolve(&self, arg: Option<&str>, _: &ProviderContext<'_>) -> Result<Value, PlaceholderError> {
        Ok(arg
            .and_then(|name| env::var(name).ok())
            .map(Value::String)
            .unwrap_or(Value::Null))
    }
}

/// `{trigger:field}`: a field of the owning trigger's JSON snapshot, `null`
/// when there is no owning trigger or no such field.
struct TriggerField;

impl VariableProvider for TriggerField {
    fn resolve(&self, arg: Option<&str>, ctx: &ProviderContext<'_>) -> Result<Value, PlaceholderError> {
        Ok(arg
            .and_then(|key| ctx.trigger.and_then(|t| t.get(key)))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// `{item:name.selector(param)}`: a selector applied to an item's history.
///
/// Selector and parameter default to `last(#1)` when the suffix is omitted,
/// so `{item:cpu}` reads the newest value.
struct ItemQuery;

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.(\w+)\((.*)\)$").expect("static pattern"))
}

impl VariableProvider for ItemQuery {
    fn resolve(&self, arg: Option<&str>, ctx: &ProviderContext<'_>) -> Result<Value, PlaceholderError> {
        let expr = arg.unwrap_or("");
        let (name, selector_name, param, selector_at, param_at) =
            match item_pattern().captures(expr) {
                Some(caps) => match (caps.get(0), caps.get(1), caps.get(2)) {
                    (Some(whole), Some(sel), Some(par)) => (
                        &expr[..whole.start()],
                        sel.as_str(),
                        par.as_str(),
                        sel.start(),
                        par.start(),
                    ),
                    _ => (expr, "last", "#1", 0, 0),
                },
                None => (expr, "last", "#1", 0, 0),
            };

        let Some(history) = ctx.items.get(name) else {
            return Err(PlaceholderError::UnknownItem {
                name: name.to_string(),
                pos: ctx.at.highlight(name),
            });
        };
        let Some(selector) = Selector::parse(selector_name) else {
            return Err(PlaceholderError::UnsupportedSelector {
                name: selector_name.to_string(),
                pos: ctx.at.advance(selector_at).highlight(selector_name),
            });
        };
        Ok(selector.evaluate(history, param, ctx.at.advance(param_at))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceText;
    use vigil_core::CheckResult;

    fn histories() -> ItemHistories {
        let mut map = ItemHistories::new();
        map.insert(
            "cpu".to_string(),
            vec![
                CheckResult {
                    time: "t".to_string(),
                    exit_code: None,
                    stdout: None,
                    stderr: None,
                    value: Some(Some("95".to_string())),
                },
                CheckResult {
                    time: "t".to_string(),
                    exit_code: None,
                    stdout: None,
                    stderr: None,
                    value: Some(Some("40".to_string())),
                },
            ],
        );
        map.insert("disk".to_string(), Vec::new());
        map
    }

    fn resolve_item(expr: &str) -> Result<Value, PlaceholderError> {
        let items = histories();
        let source = SourceText::new(expr, Some("expression"));
        let ctx = ProviderContext {
            trigger: None,
            items: &items,
            at: source.cursor(0),
        };
        ItemQuery.resolve(Some(expr), &ctx)
    }

    #[test]
    fn test_item_defaults_to_newest_value() {
        assert_eq!(resolve_item("cpu").unwrap(), "95");
    }

    #[test]
    fn test_item_with_explicit_selector() {
        assert_eq!(resolve_item("cpu.last(#2)").unwrap(), "40");
        assert_eq!(resolve_item("cpu.is_same(#2)").unwrap(), false);
    }

    #[test]
    fn test_item_with_empty_history_reads_null() {
        assert_eq!(resolve_item("disk").unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_item_reports_name_and_position() {
        let err = resolve_item("swap.last(#1)").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Unknown item 'swap' in expression\n"));
        assert!(message.contains(" at line#1:1-4: "));
    }

    #[test]
    fn test_unsupported_selector_points_at_selector() {
        let err = resolve_item("cpu.first(#1)").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Unsupported selector 'first' in expression\n"));
        assert!(message.contains(" at line#1:5-9: "));
    }

    #[test]
    fn test_selector_parameter_errors_point_at_parameter() {
        let err = resolve_item("cpu.last(#0)").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Position must be greater than 0\n in expression\n"));
        assert!(message.contains(" at line#1:11: "));
    }

    #[test]
    fn test_env_provider() {
        let items = ItemHistories::new();
        let source = SourceText::new("x", None);
        let ctx = ProviderContext {
            trigger: None,
            items: &items,
            at: source.cursor(0),
        };
        env::set_var("VIGIL_TEST_ENV", "present");
        assert_eq!(EnvVar.resolve(Some("VIGIL_TEST_ENV"), &ctx).unwrap(), "present");
        env::remove_var("VIGIL_TEST_ENV");
        assert_eq!(EnvVar.resolve(Some("VIGIL_TEST_ENV"), &ctx).unwrap(), Value::Null);
        assert_eq!(EnvVar.resolve(None, &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_trigger_field_reads_snapshot() {
        let items = ItemHistories::new();
        let snapshot = serde_json::json!({"name": "cpu high", "status": "up"});
        let source = SourceText::new("x", None);
        let ctx = ProviderContext {
            trigger: Some(&snapshot),
            items: &items,
            at: source.cursor(0),
        };
        assert_eq!(TriggerField.resolve(Some("status"), &ctx).unwrap(), "up");
        assert_eq!(TriggerField.resolve(Some("missing"), &ctx).unwrap(), Value::Null);
        assert_eq!(TriggerField.resolve(None, &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_identity_providers_return_non_empty_strings() {
        let items = ItemHistories::new();
        let source = SourceText::new("x", None);
        let ctx = ProviderContext {
            trigger: None,
            items: &items,
            at: source.cursor(0),
        };
        assert!(matches!(Whoami.resolve(None, &ctx).unwrap(), Value::String(s) if !s.is_empty()));
        assert!(matches!(Hostname.resolve(None, &ctx).unwrap(), Value::String(s) if !s.is_empty()));
    }

    #[test]
    fn test_registry_standard_set() {
        let registry = ProviderRegistry::standard();
        for prefix in ["whoami", "hostname", "env", "trigger", "item"] {
            assert!(registry.get(prefix).is_some(), "missing provider {prefix}");
        }
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_registry_accepts_custom_closures() {
        let registry = ProviderRegistry::new();
        registry.register(
            "answer",
            Arc::new(FnProvider(|_: Option<&str>, _: &ProviderContext<'_>| {
                Ok(Value::from(42))
            })),
        );
        let items = ItemHistories::new();
        let source = SourceText::new("x", None);
        let ctx = ProviderContext {
            trigger: None,
            items: &items,
            at: source.cursor(0),
        };
        let provider = registry.get("answer").unwrap();
        assert_eq!(provider.resolve(None, &ctx).unwrap(), 42);
    }
}
