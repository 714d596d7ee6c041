//! Record lexer for metadata files.
//!
//! Metadata files are split into shell-style words. The word character set is
//! widened with `: . < > / , - !` so that paths, version specs and group
//! markers such as `<add>` stay single tokens. The token stream is then read
//! as a sequence of `<group> ... </group>` blocks and `name value` pairs
//! declared by a [`Schema`].

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use tracing::warn;

use crate::error::{MetaError, Result};
use crate::record::{Record, Schema};

/// Characters that continue a word in addition to alphanumerics and `_`.
const EXTRA_WORD_CHARS: &str = ":.<>/,-!";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || EXTRA_WORD_CHARS.contains(c)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// A single lexed word and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text with quotes and escapes resolved.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

/// Shell-word tokenizer over a metadata file's contents.
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    file: &'a Path,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer. `file` is only used in error messages.
    pub fn new(source: &'a str, file: &'a Path) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            file,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn error(&self, line: usize, detail: impl Into<String>) -> MetaError {
        MetaError::Parse {
            file: self.file.to_path_buf(),
            line,
            detail: detail.into(),
        }
    }

    /// Read the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            match self.chars.peek().copied() {
                None => return Ok(None),
                Some('#') => self.skip_comment(),
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(_) => break,
            }
        }

        let line = self.line;
        let mut text = String::new();

        // Punctuation outside the word set is a token on its own.
        if let Some(&c) = self.chars.peek() {
            if !is_word_char(c) && !is_quote(c) && c != '\\' {
                self.bump();
                return Ok(Some(Token {
                    text: c.to_string(),
                    line,
                }));
            }
        }

        while let Some(c) = self.chars.peek().copied() {
            if c.is_whitespace() || c == '#' {
                break;
            } else if is_quote(c) {
                self.bump();
                self.read_quoted(c, &mut text, line)?;
            } else if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.error(line, "no escaped character")),
                }
            } else if is_word_char(c) {
                self.bump();
                text.push(c);
            } else {
                break;
            }
        }

        Ok(Some(Token { text, line }))
    }

    fn read_quoted(&mut self, quote: char, text: &mut String, line: usize) -> Result<()> {
        loop {
            match self.bump() {
                None => return Err(self.error(line, "no closing quotation")),
                Some(c) if c == quote => return Ok(()),
                Some('\\') if quote == '"' => match self.bump() {
                    Some(escaped) => {
                        if escaped != '"' && escaped != '\\' {
                            text.push('\\');
                        }
                        text.push(escaped);
                    }
                    None => return Err(self.error(line, "no escaped character")),
                },
                Some(c) => text.push(c),
            }
        }
    }
}

/// Extract `name` from a `<name>` group marker.
fn group_marker(token: &str) -> Option<&str> {
    let rest = token.strip_prefix('<')?;
    let end = rest.rfind('>')?;
    Some(&rest[..end])
}

/// Read and lex a metadata file.
pub fn lex_file(path: &Path, schema: &Schema) -> Result<Record> {
    let source = std::fs::read_to_string(path).map_err(|source| MetaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    lex_str(&source, path, schema)
}

/// Lex metadata text into a [`Record`]. `path` determines the record name.
pub fn lex_str(source: &str, path: &Path, schema: &Schema) -> Result<Record> {
    let mut record = Record::new(path, schema);
    let mut tokens = Tokenizer::new(source, path);

    while let Some(token) = tokens.next_token()? {
        if let Some(group) = group_marker(&token.text) {
            if !schema.has_group(group) {
                return Err(tokens.error(token.line, format!("unknown group \"{group}\"")));
            }
            record.open_group(group, token.line);

            let end_marker = format!("</{group}>");
            let mut closed = false;
            while let Some(inner) = tokens.next_token()? {
                if inner.text == end_marker {
                    closed = true;
                    break;
                }
                record.push_to_group(group, inner.text);
            }
            if !closed {
                warn!(
                    file = %path.display(),
                    line = token.line,
                    "group <{group}> is not closed before end of file"
                );
            }
        } else if schema.has_scalar(&token.text) {
            match tokens.next_token()? {
                Some(value) => record.set_scalar(&token.text, value.text),
                None => {
                    return Err(tokens.error(
                        token.line,
                        format!("missing value for \"{}\"", token.text),
                    ))
                }
            }
        } else {
            return Err(tokens.error(token.line, format!("bad token \"{}\"", token.text)));
        }
    }

    Ok(record)
}
