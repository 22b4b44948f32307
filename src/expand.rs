//! Template expansion: binds backtick placeholders to attributes and
//! appends whatever the template never referenced.

use crate::error::RenderError;
use crate::record::{Attr, Record, Value};
use crate::render::ValueFormatter;

/// Renders a [`Record`] into one line of text.
///
/// The message is scanned left to right; every `` `name` `` span is replaced
/// by `` `name:value` ``, and attributes the template never consumed are
/// appended as a trailing ` (k=v ...)` group so nothing is silently dropped.
/// Rendering is pure and call-local; one renderer may serve any number of
/// concurrent callers.
#[derive(Debug, Default)]
pub struct LineRenderer {
    formatter: ValueFormatter,
}

impl LineRenderer {
    pub fn new(formatter: ValueFormatter) -> Self {
        LineRenderer { formatter }
    }

    /// Render `record` into a fresh string.
    pub fn render(&self, record: &Record) -> Result<String, RenderError> {
        let mut buf = String::with_capacity(record.message.len());
        self.render_into(&mut buf, record)?;
        Ok(buf)
    }

    /// Render `record` into a caller-supplied buffer.
    ///
    /// On error the buffer may hold a partial line; callers must discard it.
    pub fn render_into(&self, buf: &mut String, record: &Record) -> Result<(), RenderError> {
        let mut exp = Expansion {
            attrs: &record.attrs,
            fmt: &self.formatter,
            consumed: vec![false; record.attrs.len()],
        };
        exp.expand(buf, &record.message)?;
        exp.append_leftovers(buf)
    }
}

/// Per-record scratch state: the attribute list under resolution and the
/// consumed-set tracking which top-level attributes were bound inline.
struct Expansion<'a> {
    attrs: &'a [Attr],
    fmt: &'a ValueFormatter,
    consumed: Vec<bool>,
}

impl<'a> Expansion<'a> {
    fn expand(&mut self, buf: &mut String, template: &str) -> Result<(), RenderError> {
        let mut rest = template;
        let mut occurrence = 0usize;
        loop {
            let Some(open) = rest.find('`') else {
                buf.push_str(rest);
                return Ok(());
            };
            buf.push_str(&rest[..open]);
            rest = &rest[open + 1..];
            let Some(close) = rest.find('`') else {
                // unterminated placeholder, emitted verbatim
                buf.push('`');
                buf.push_str(rest);
                return Ok(());
            };
            let name = &rest[..close];
            rest = &rest[close + 1..];
            if name.is_empty() {
                // a doubled delimiter escapes one literal backtick
                buf.push('`');
                continue;
            }
            buf.push('`');
            buf.push_str(name);
            buf.push(':');
            self.resolve(buf, occurrence, name)?;
            buf.push('`');
            occurrence += 1;
        }
    }

    /// Bind one placeholder. `idx` match first, then first key match in
    /// declaration order, then dotted-path traversal for `.`-prefixed names.
    fn resolve(&mut self, buf: &mut String, idx: usize, name: &str) -> Result<(), RenderError> {
        if let Some(path) = name.strip_prefix('.') {
            return self.resolve_path(buf, idx, name, path);
        }
        let (i, attr) = if self.attrs.get(idx).is_some_and(|a| a.key == name) {
            (idx, &self.attrs[idx])
        } else {
            self.by_name(name).ok_or_else(|| RenderError::Unresolved {
                index: idx,
                name: name.to_string(),
            })?
        };
        self.mark(i);
        self.fmt.append_value(buf, &attr.value)
    }

    fn resolve_path(
        &mut self,
        buf: &mut String,
        idx: usize,
        name: &str,
        path: &str,
    ) -> Result<(), RenderError> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let (start, start_attr) = if self.attrs.get(idx).is_some_and(|a| a.key == first) {
            (idx, &self.attrs[idx])
        } else {
            self.by_name(first).ok_or_else(|| RenderError::Unresolved {
                index: idx,
                name: name.to_string(),
            })?
        };
        let mut value = &start_attr.value;
        for segment in segments {
            let Value::Group(members) = value else {
                return Err(RenderError::Traversal {
                    index: idx,
                    path: name.to_string(),
                });
            };
            value = members
                .iter()
                .find(|a| a.key == segment)
                .map(|a| &a.value)
                .ok_or_else(|| RenderError::Traversal {
                    index: idx,
                    path: name.to_string(),
                })?;
        }
        // the start attribute is what counts as consumed, not the leaf
        self.mark(start);
        self.fmt.append_value(buf, value)
    }

    fn by_name(&self, name: &str) -> Option<(usize, &'a Attr)> {
        self.attrs
            .iter()
            .position(|a| a.key == name)
            .map(|i| (i, &self.attrs[i]))
    }

    fn mark(&mut self, i: usize) {
        if let Some(slot) = self.consumed.get_mut(i) {
            *slot = true;
        }
    }

    fn append_leftovers(&self, buf: &mut String) -> Result<(), RenderError> {
        if self.consumed.iter().all(|&c| c) {
            return Ok(());
        }
        buf.push_str(" (");
        let mut sep = "";
        for (i, attr) in self.attrs.iter().enumerate() {
            if self.consumed[i] {
                continue;
            }
            buf.push_str(sep);
            buf.push_str(&attr.key);
            buf.push('=');
            self.fmt.append_value(buf, &attr.value)?;
            sep = " ";
        }
        buf.push(')');
        Ok(())
    }
}
