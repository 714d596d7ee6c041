//! Generic lexed records and typed coercions over them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{MetaError, Result};

/// File name of a module descriptor. Records read from it are named after
/// their directory instead of the file.
pub const MODULE_DESCRIPTOR: &str = "info.txt";

/// Separator token between keys and values in table groups.
pub const TABLE_SEPARATOR: &str = "->";

/// Declared fields of one record kind.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Names of the allowed `<group>` blocks.
    pub groups: &'static [&'static str],
    /// Scalar field names with their defaults (`None` for no default).
    pub scalars: &'static [(&'static str, Option<&'static str>)],
}

impl Schema {
    /// Whether `name` is a declared group.
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains(&name)
    }

    /// Whether `name` is a declared scalar field.
    pub fn has_scalar(&self, name: &str) -> bool {
        self.scalars.iter().any(|(field, _)| *field == name)
    }
}

/// A lexed metadata file: scalar fields plus ordered token groups.
#[derive(Debug, Clone)]
pub struct Record {
    file: PathBuf,
    name: String,
    lives_in: PathBuf,
    groups: BTreeMap<String, Vec<String>>,
    group_lines: BTreeMap<String, usize>,
    scalars: BTreeMap<String, Option<String>>,
}

impl Record {
    /// An empty record for `file` with every field at its declared default.
    pub fn new(file: &Path, schema: &Schema) -> Self {
        let lives_in = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = if file_name == MODULE_DESCRIPTOR {
            lives_in
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            file_name
        };

        Self {
            file: file.to_path_buf(),
            name,
            lives_in,
            groups: schema
                .groups
                .iter()
                .map(|g| (g.to_string(), Vec::new()))
                .collect(),
            group_lines: BTreeMap::new(),
            scalars: schema
                .scalars
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        }
    }

    /// Canonical name of the record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file this record was read from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory containing the file.
    pub fn lives_in(&self) -> &Path {
        &self.lives_in
    }

    pub(crate) fn open_group(&mut self, group: &str, line: usize) {
        self.group_lines.entry(group.to_string()).or_insert(line);
    }

    pub(crate) fn push_to_group(&mut self, group: &str, token: String) {
        self.groups.entry(group.to_string()).or_default().push(token);
    }

    pub(crate) fn set_scalar(&mut self, field: &str, value: String) {
        self.scalars.insert(field.to_string(), Some(value));
    }

    /// Tokens of a group, in file order.
    pub fn group(&self, name: &str) -> &[String] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return a group's tokens.
    pub fn take_group(&mut self, name: &str) -> Vec<String> {
        self.groups.remove(name).unwrap_or_default()
    }

    /// Line on which a group was first opened, or 0 if it never appeared.
    pub fn group_line(&self, name: &str) -> usize {
        self.group_lines.get(name).copied().unwrap_or(0)
    }

    /// Value of a scalar field, `None` when it has no value and no default.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.scalars.get(name).and_then(|v| v.as_deref())
    }

    /// Value of a scalar field as an owned string, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.scalar(name).unwrap_or_default().to_string()
    }

    /// Value of a scalar field as an owned optional string.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.scalar(name).map(str::to_string)
    }

    /// Coerce a scalar field to a boolean.
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.scalar(name).unwrap_or("false") {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            other => Err(self.invalid(name, other)),
        }
    }

    /// Coerce a scalar field to an unsigned integer.
    pub fn number(&self, name: &str) -> Result<u32> {
        let value = self.scalar(name).unwrap_or("0");
        value.parse().map_err(|_| self.invalid(name, value))
    }

    /// Remove a group and coerce it into key/value pairs.
    pub fn take_pairs(&mut self, name: &str) -> Result<Vec<(String, String)>> {
        let tokens = self.take_group(name);
        coerce_pairs(&self.file, name, tokens)
    }

    /// Remove a group and coerce it into a map.
    pub fn take_table(&mut self, name: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.take_pairs(name)?.into_iter().collect())
    }

    fn invalid(&self, field: &str, value: &str) -> MetaError {
        MetaError::InvalidValue {
            file: self.file.clone(),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Coerce a `key -> value key -> value ...` token list into ordered pairs.
///
/// The middle token of each triple is discarded. A repeated key keeps its
/// first position and takes the last value.
pub fn coerce_pairs(file: &Path, group: &str, tokens: Vec<String>) -> Result<Vec<(String, String)>> {
    if tokens.len() % 3 != 0 {
        return Err(MetaError::MalformedTable {
            file: file.to_path_buf(),
            group: group.into(),
            len: tokens.len(),
        });
    }

    let mut pairs: Vec<(String, String)> = Vec::with_capacity(tokens.len() / 3);
    let mut iter = tokens.into_iter();
    while let (Some(key), Some(_), Some(value)) = (iter.next(), iter.next(), iter.next()) {
        if let Some(existing) = pairs.iter_mut().find(|(k, _)| *k == key) {
            warn!(
                file = %file.display(),
                group,
                key = %key,
                "duplicate key overrides earlier value"
            );
            existing.1 = value;
        } else {
            pairs.push((key, value));
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: Schema = Schema {
        groups: &["libs"],
        scalars: &[("mp_bits", Some("0")), ("uses_tr1", Some("false"))],
    };

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pairs_from_triples() {
        let pairs = coerce_pairs(
            Path::new("f"),
            "libs",
            strings(&["all", "->", "z", "all!windows", "->", "m"]),
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("all".to_string(), "z".to_string()),
                ("all!windows".to_string(), "m".to_string())
            ]
        );
    }

    #[test]
    fn duplicate_key_last_wins() {
        let pairs = coerce_pairs(
            Path::new("f"),
            "libs",
            strings(&["a", "->", "1", "b", "->", "2", "a", "->", "3"]),
        )
        .unwrap();
        assert_eq!(pairs[0], ("a".to_string(), "3".to_string()));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn short_table_is_malformed() {
        let err = coerce_pairs(Path::new("f"), "libs", strings(&["all", "->"])).unwrap_err();
        assert!(matches!(err, MetaError::MalformedTable { len: 2, .. }));
    }

    #[test]
    fn empty_table() {
        assert!(coerce_pairs(Path::new("f"), "libs", Vec::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn typed_scalars() {
        let mut record = Record::new(Path::new("m/info.txt"), &SCHEMA);
        assert_eq!(record.number("mp_bits").unwrap(), 0);
        assert!(!record.flag("uses_tr1").unwrap());

        record.set_scalar("mp_bits", "64".into());
        record.set_scalar("uses_tr1", "true".into());
        assert_eq!(record.number("mp_bits").unwrap(), 64);
        assert!(record.flag("uses_tr1").unwrap());

        record.set_scalar("mp_bits", "lots".into());
        assert!(matches!(
            record.number("mp_bits"),
            Err(MetaError::InvalidValue { .. })
        ));
    }

    #[test]
    fn module_descriptor_named_after_directory() {
        let record = Record::new(Path::new("src/hash/sha1/info.txt"), &SCHEMA);
        assert_eq!(record.name(), "sha1");
        assert_eq!(record.lives_in(), Path::new("src/hash/sha1"));
    }
}
