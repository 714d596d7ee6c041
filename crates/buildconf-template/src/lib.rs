//! Percent-placeholder template expansion.
//!
//! Templates are plain text with three kinds of escape:
//! - `%name` is replaced by the value bound to `name`
//! - `%{name}` does the same, for names followed by identifier characters
//! - `%%` yields a literal `%`
//!
//! Names are `[_A-Za-z][_A-Za-z0-9]*`. Expansion is a single pass; values
//! are inserted verbatim and never rescanned.

pub mod error;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

pub use error::{Result, TemplateError};

const DELIMITER: char = '%';

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Expand `text` against `vars`. `template` names the source in errors.
pub fn expand(text: &str, template: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(at) = rest.find(DELIMITER) {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];

        let (name, consumed) = match after.chars().next() {
            Some(DELIMITER) => {
                out.push(DELIMITER);
                rest = &after[1..];
                continue;
            }
            Some('{') => {
                let inner = &after[1..];
                let len = ident_len(inner);
                if len == 0 || !inner[len..].starts_with('}') {
                    return Err(invalid(text, template, rest, at));
                }
                (&inner[..len], len + 2)
            }
            Some(c) if is_ident_start(c) => {
                let len = ident_len(after);
                (&after[..len], len)
            }
            _ => return Err(invalid(text, template, rest, at)),
        };

        let value = vars.get(name).ok_or_else(|| TemplateError::Unbound {
            placeholder: name.to_string(),
            template: template.to_string(),
        })?;
        out.push_str(value);
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Read and expand the template at `path`.
pub fn process_template(path: &Path, vars: &BTreeMap<String, String>) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(template = %path.display(), "expanding template");
    expand(&text, &path.display().to_string(), vars)
}

fn ident_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !is_ident_continue(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Error for the bad `%` at byte `at` of `rest`, a suffix of `text`.
fn invalid(text: &str, template: &str, rest: &str, at: usize) -> TemplateError {
    let offset = text.len() - rest.len() + at;
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
    let column = before[line_start..].chars().count() + 1;
    TemplateError::InvalidPlaceholder {
        template: template.to_string(),
        line,
        column,
    }
}
