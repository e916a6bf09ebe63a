//! Text positions and caret diagrams for resolution errors
//!
//! Every resolution error points at the exact spot in the template text that
//! caused it, rendered as a line/column header plus a caret line under the
//! offending span:
//!
//! ```text
//!  in expression
//!  at line#1:7-9: {item:cpu} > 90
//!                       ^^^
//! ```

use std::fmt;

/// Template text paired with the label errors are reported against.
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    text: &'a str,
    label: String,
}

impl<'a> SourceText<'a> {
    /// Wrap resolved text; `field` names where the text came from (an action
    /// property, the trigger expression) and prefixes every diagram.
    pub fn new(text: &'a str, field: Option<&str>) -> Self {
        Self {
            text,
            label: field.map(|f| format!(" in {f}")).unwrap_or_default(),
        }
    }

    /// The wrapped text.
    pub fn text(&self) -> &str {
        self.text
    }

    /// A cursor at the given byte offset.
    pub fn cursor(&self, index: usize) -> Cursor<'_> {
        Cursor {
            source: self,
            index,
        }
    }
}

/// A byte position inside a [`SourceText`].
///
/// Cursors are handed to variable providers re-based at their argument, so a
/// provider reports positions relative to its own text and the rendered
/// diagram still points at the right spot in the whole template.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    source: &'a SourceText<'a>,
    index: usize,
}

impl Cursor<'_> {
    /// A cursor moved forward by `by` bytes.
    pub fn advance(self, by: usize) -> Self {
        Cursor {
            source: self.source,
            index: self.index + by,
        }
    }

    /// Render a caret diagram underlining `span` at this position.
    pub fn highlight(&self, span: &str) -> Highlight {
        let size = span.len().max(1);
        let lines: Vec<&str> = self.source.text.split('\n').collect();
        let mut index = self.index;
        let mut line = 0;
        while index > lines[line].len() && line + 1 < lines.len() {
            index -= lines[line].len() + 1;
            line += 1;
        }
        let line_text = lines[line];
        let index = index.min(line_text.len());

        let end = if size > 1 {
            format!("-{}", index + size)
        } else {
            String::new()
        };
        let prefix = format!(" at line#{}:{}{}: ", line + 1, index + 1, end);
        let carets = format!(
            "{}{}{}",
            " ".repeat(prefix.len() + index),
            "^".repeat(size),
            " ".repeat(line_text.len().saturating_sub(index + size)),
        );
        Highlight(format!(
            "{}\n{}{}\n{}",
            self.source.label, prefix, line_text, carets
        ))
    }
}

/// A rendered caret diagram, appended verbatim to error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight(String);

impl Highlight {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
