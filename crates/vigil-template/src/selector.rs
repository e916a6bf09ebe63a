//! History selectors: how an item reference reads a result sequence
//!
//! A selector takes the item's history (newest first) and a parameter string
//! and produces a value for the surrounding template. The parameter is a
//! 1-based position of the form `#N`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use vigil_core::CheckResult;

use crate::error::SelectorError;
use crate::position::Cursor;

fn position_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#(\d+)").expect("static pattern"))
}

/// A built-in history selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The value of the N-th most recent result, `null` when the history is
    /// shorter than N
    Last,
    /// Whether the N most recent results all carry the same value; `false`
    /// when the history is shorter than N. With `#1` there is nothing to
    /// compare against, so a single result always counts as "same".
    IsSame,
}

impl Selector {
    /// Look up a selector by its name in the item expression.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "last" => Some(Selector::Last),
            "is_same" => Some(Selector::IsSame),
            _ => None,
        }
    }

    /// Apply the selector. `at` points at the parameter text inside the
    /// template, for error reporting.
    pub fn evaluate(
        &self,
        history: &[CheckResult],
        param: &str,
        at: Cursor<'_>,
    ) -> Result<Value, SelectorError> {
        let position = parse_position(param, at)?;
        match self {
            Selector::Last => Ok(history
                .get(position - 1)
                .map(CheckResult::value_json)
                .unwrap_or(Value::Null)),
            Selector::IsSame => {
                let same = position <= history.len()
                    && history[..position]
                        .windows(2)
                        .all(|pair| pair[0].value() == pair[1].value());
                Ok(Value::Bool(same))
            }
        }
    }
}

/// Parse a `#N` position parameter. Trailing text after the digits is
/// tolerated and ignored.
fn parse_position(param: &str, at: Cursor<'_>) -> Result<usize, SelectorError> {
    let digits = position_pattern()
        .captures(param)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| SelectorError::UnknownParameter {
            param: param.to_string(),
            pos: at.highlight(param),
        })?;
    // Digits beyond usize saturate; any such position is simply out of range.
    let position: usize = digits.as_str().parse().unwrap_or(usize::MAX);
    if position == 0 {
        return Err(SelectorError::NonPositivePosition {
            pos: at.advance(1).highlight(digits.as_str()),
        });
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceText;

    fn entry(value: Option<&str>) -> CheckResult {
        CheckResult {
            time: "2026-01-01 00:00:00.000".to_string(),
            exit_code: None,
            stdout: None,
            stderr: None,
            value: Some(value.map(String::from)),
        }
    }

    fn eval(selector: Selector, history: &[CheckResult], param: &str) -> Result<Value, SelectorError> {
        let source = SourceText::new(param, None);
        selector.evaluate(history, param, source.cursor(0))
    }

    #[test]
    fn test_last_reads_newest_first() {
        let history = [entry(Some("95")), entry(Some("40"))];
        assert_eq!(eval(Selector::Last, &history, "#1").unwrap(), "95");
        assert_eq!(eval(Selector::Last, &history, "#2").unwrap(), "40");
    }

    #[test]
    fn test_last_beyond_history_is_null() {
        let history = [entry(Some("95"))];
        assert_eq!(eval(Selector::Last, &history, "#2").unwrap(), Value::Null);
        assert_eq!(eval(Selector::Last, &[], "#1").unwrap(), Value::Null);
    }

    #[test]
    fn test_last_null_value_stays_null() {
        let history = [entry(None)];
        assert_eq!(eval(Selector::Last, &history, "#1").unwrap(), Value::Null);
    }

    #[test]
    fn test_is_same_compares_recent_values() {
        let stable = [entry(Some("ok")), entry(Some("ok")), entry(Some("bad"))];
        assert_eq!(eval(Selector::IsSame, &stable, "#2").unwrap(), true);
        assert_eq!(eval(Selector::IsSame, &stable, "#3").unwrap(), false);
    }

    #[test]
    fn test_is_same_single_result_counts_as_same() {
        // #1 compares one result with nothing, which holds trivially
        let history = [entry(Some("anything"))];
        assert_eq!(eval(Selector::IsSame, &history, "#1").unwrap(), true);
    }

    #[test]
    fn test_is_same_beyond_history_is_false() {
        let history = [entry(Some("ok"))];
        assert_eq!(eval(Selector::IsSame, &history, "#2").unwrap(), false);
    }

    #[test]
    fn test_is_same_treats_null_values_as_equal() {
        let history = [entry(None), entry(None)];
        assert_eq!(eval(Selector::IsSame, &history, "#2").unwrap(), true);
    }

    #[test]
    fn test_zero_position_is_rejected() {
        let err = eval(Selector::Last, &[], "#0").unwrap_err();
        assert!(matches!(err, SelectorError::NonPositivePosition { .. }));
        assert!(err.to_string().starts_with("Position must be greater than 0\n"));
    }

    #[test]
    fn test_non_position_parameter_is_rejected() {
        let err = eval(Selector::Last, &[], "latest").unwrap_err();
        assert!(err.to_string().starts_with("Unknown parameter: 'latest'\n"));
    }

    #[test]
    fn test_trailing_text_after_digits_is_ignored() {
        let history = [entry(Some("a")), entry(Some("b"))];
        assert_eq!(eval(Selector::Last, &history, "#2x").unwrap(), "b");
    }

    #[test]
    fn test_unknown_selector_name_does_not_parse() {
        assert_eq!(Selector::parse("last"), Some(Selector::Last));
        assert_eq!(Selector::parse("is_same"), Some(Selector::IsSame));
        assert_eq!(Selector::parse("first"), None);
    }
}
