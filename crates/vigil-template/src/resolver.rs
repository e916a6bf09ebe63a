//! The placeholder substitution pass
//!
//! Scans template text for `{...}` tokens and replaces each with the value
//! its provider resolves. A token body is either a bare provider name or
//! `prefix:argument`; the first `:` splits them, so arguments may themselves
//! contain colons.

use serde_json::Value;

use vigil_core::{ItemHistories, TextLines};

use crate::error::{PlaceholderError, TemplateResult};
use crate::position::SourceText;
use crate::providers::{ProviderContext, ProviderRegistry};
use crate::value::{quote_value, render_value};

/// How resolved values are rendered into the surrounding text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transform {
    /// Substitute the value's plain text form
    #[default]
    Plain,
    /// Quote string values, for templates that feed the condition evaluator
    Quote,
}

impl Transform {
    fn apply(self, value: Value) -> Value {
        match self {
            Transform::Plain => value,
            Transform::Quote => quote_value(value),
        }
    }
}

/// Everything one resolution pass needs: the provider registry, the data
/// providers read from, and how the result is rendered.
pub struct ResolveContext<'a> {
    registry: &'a ProviderRegistry,
    items: &'a ItemHistories,
    trigger: Option<&'a Value>,
    field: Option<&'a str>,
    transform: Transform,
}

impl<'a> ResolveContext<'a> {
    pub fn new(registry: &'a ProviderRegistry, items: &'a ItemHistories) -> Self {
        Self {
            registry,
            items,
            trigger: None,
            field: None,
            transform: Transform::Plain,
        }
    }

    /// Attach the owning trigger's JSON snapshot for `{trigger:...}`.
    pub fn with_trigger(mut self, trigger: &'a Value) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Name the field being resolved; error diagrams carry it as
    /// `in <field>`.
    pub fn for_field(mut self, field: &'a str) -> Self {
        self.field = Some(field);
        self
    }

    /// Quote string values on substitution.
    pub fn quoted(mut self) -> Self {
        self.transform = Transform::Quote;
        self
    }
}

/// Resolve every placeholder in `template` and return the substituted text.
pub fn resolve_placeholders(
    template: &TextLines,
    ctx: &ResolveContext<'_>,
) -> TemplateResult<String> {
    let text = template.join();
    let source = SourceText::new(&text, ctx.field);

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(found) = text[pos..].find('{') {
        let open = pos + found;
        let Some(len) = text[open + 1..].find('}') else {
            // no closing brace ahead; the rest is literal
            break;
        };
        if len == 0 {
            // "{}" has an empty body and stays verbatim
            out.push_str(&text[pos..open + 2]);
            pos = open + 2;
            continue;
        }
        let close = open + 1 + len;
        out.push_str(&text[pos..open]);
        out.push_str(&resolve_token(&text[open + 1..close], open + 1, &source, ctx)?);
        pos = close + 1;
    }
    out.push_str(&text[pos..]);
    Ok(out)
}

/// Resolve one token body; `at` is its byte offset in the template text.
fn resolve_token(
    body: &str,
    at: usize,
    source: &SourceText<'_>,
    ctx: &ResolveContext<'_>,
) -> TemplateResult<String> {
    // Escape tokens; both of them yield an opening brace, and there is no
    // escape that yields a closing one.
    if body == "<" || body == ">" {
        return Ok("{".to_string());
    }

    if let Some(split) = body.find(':') {
        let (prefix, arg) = (&body[..split], &body[split + 1..]);
        if let Some(provider) = ctx.registry.get(prefix) {
            let call = ProviderContext {
                trigger: ctx.trigger,
                items: ctx.items,
                at: source.cursor(at + prefix.len() + 1),
            };
            let value = provider.resolve(Some(arg), &call)?;
            return Ok(render_value(&ctx.transform.apply(value)));
        }
    } else if let Some(provider) = ctx.registry.get(body) {
        let call = ProviderContext {
            trigger: ctx.trigger,
            items: ctx.items,
            at: source.cursor(at),
        };
        let value = provider.resolve(None, &call)?;
        return Ok(render_value(&ctx.transform.apply(value)));
    }

    Err(PlaceholderError::UnsupportedExpression {
        token: body.to_string(),
        pos: source.cursor(at).highlight(body),
    })
}
