//! Per-attempt memoized resolution of action properties

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use vigil_core::TextLines;
use vigil_template::{render_value, resolve_placeholders, ResolveContext, TemplateResult};

use crate::registry::ActionContext;

/// Lazily resolves an action's fields, at most once each per attempt.
///
/// Text fields (strings or arrays of strings) go through placeholder
/// resolution; anything else passes through as plain JSON. Repeated reads of
/// one field within an attempt see the same resolved value, so a field used
/// twice cannot resolve to two different things mid-attempt. The cache lives
/// and dies with the attempt.
pub struct ActionProps<'a> {
    fields: &'a serde_json::Map<String, Value>,
    ctx: &'a ActionContext<'a>,
    cache: RefCell<HashMap<String, Value>>,
}

impl<'a> ActionProps<'a> {
    pub fn new(fields: &'a serde_json::Map<String, Value>, ctx: &'a ActionContext<'a>) -> Self {
        Self {
            fields,
            ctx,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The resolved value of a field; `null` when the field is absent.
    pub fn get(&self, name: &str) -> TemplateResult<Value> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }
        let raw = self.fields.get(name);
        let value = match raw.and_then(TextLines::from_value) {
            Some(lines) => {
                let rctx = ResolveContext::new(self.ctx.providers, self.ctx.items)
                    .with_trigger(self.ctx.trigger)
                    .for_field(name);
                Value::String(resolve_placeholders(&lines, &rctx)?)
            }
            None => raw.cloned().unwrap_or(Value::Null),
        };
        self.cache
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// The resolved value as text; `None` when the field is absent.
    pub fn text(&self, name: &str) -> TemplateResult<Option<String>> {
        Ok(match self.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(render_value(&other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use vigil_core::{ActionDoc, ItemHistories};
    use vigil_template::{FnProvider, ProviderContext, ProviderRegistry};

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

    #[test]
    fn test_each_field_resolves_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ProviderRegistry::new();
        let counter = calls.clone();
        registry.register(
            "count",
            Arc::new(FnProvider(move |_: Option<&str>, _: &ProviderContext<'_>| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Value::from(n))
            })),
        );
        let action = ActionDoc::of_kind("notification")
            .with_field("subject", json!("run {count}"));
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let props = ActionProps::new(&action.fields, &ctx);
        assert_eq!(props.text("subject").unwrap().as_deref(), Some("run 1"));
        assert_eq!(props.text("subject").unwrap().as_deref(), Some("run 1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_array_fields_resolve_as_joined_lines() {
        let registry = ProviderRegistry::standard();
        let action = ActionDoc::of_kind("notification")
            .with_field("body", json!(["status: {trigger:status}", "done"]));
        let trigger = json!({"status": "up"});
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let props = ActionProps::new(&action.fields, &ctx);
        assert_eq!(
            props.text("body").unwrap().as_deref(),
            Some("status: up\ndone")
        );
    }

    #[test]
    fn test_non_text_fields_pass_through() {
        let registry = ProviderRegistry::standard();
        let action = ActionDoc::of_kind("notification").with_field("retries", json!(3));
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let props = ActionProps::new(&action.fields, &ctx);
        assert_eq!(props.get("retries").unwrap(), json!(3));
        assert_eq!(props.text("retries").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_absent_fields_are_null() {
        let registry = ProviderRegistry::standard();
        let action = ActionDoc::of_kind("notification");
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let props = ActionProps::new(&action.fields, &ctx);
        assert_eq!(props.get("subject").unwrap(), Value::Null);
        assert_eq!(props.text("subject").unwrap(), None);
    }

    #[test]
    fn test_resolution_errors_carry_the_field_name() {
        let registry = ProviderRegistry::standard();
        let action = ActionDoc::of_kind("notification")
            .with_field("subject", json!("value: {item:gone}"));
        let trigger = Value::Null;
        let items = ItemHistories::new();
        let ctx = context(&registry, &trigger, &items);

        let props = ActionProps::new(&action.fields, &ctx);
        let err = props.get("subject").unwrap_err();
        assert!(err.to_string().contains(" in subject\n"));
    }
}
