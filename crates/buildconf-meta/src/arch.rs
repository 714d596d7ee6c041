//! Processor architecture descriptions (`build-data/arch/*`).

use std::path::Path;

use regex::Regex;

use crate::error::{MetaError, Result};
use crate::lexer;
use crate::macros::macro_ident;
use crate::record::{Record, Schema};

/// Fields of an architecture description.
pub const ARCH_SCHEMA: Schema = Schema {
    groups: &["aliases", "submodels", "submodel_aliases"],
    scalars: &[
        ("realname", Some("<UNKNOWN>")),
        ("default_submodel", None),
        ("endian", None),
        ("unaligned", Some("no")),
    ],
};

/// A submodel regex, matched from the start of a normalized processor name.
#[derive(Debug, Clone)]
pub struct SubmodelPattern {
    source: String,
    regex: Regex,
}

impl SubmodelPattern {
    /// Compile `pattern`; `file` is used for error reporting.
    pub fn new(pattern: &str, file: &Path) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            MetaError::InvalidPattern {
                file: file.to_path_buf(),
                pattern: pattern.into(),
                source,
            }
        })?;
        Ok(Self {
            source: pattern.into(),
            regex,
        })
    }

    /// The pattern as written in the metadata file.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern matches a prefix of `processor`.
    pub fn matches(&self, processor: &str) -> bool {
        self.regex.is_match(processor)
    }
}

impl PartialEq for SubmodelPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// The entry that matched in [`ArchInfo::find_submodel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmodelMatch<'a> {
    /// A submodel alias, carrying the submodel name it maps to.
    Alias(&'a str),
    /// A plain submodel pattern.
    Pattern(&'a SubmodelPattern),
}

/// An architecture family and the submodels that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchInfo {
    /// Canonical name (file name).
    pub name: String,
    /// Human-readable name.
    pub real_name: String,
    /// Alternative names for the whole family.
    pub aliases: Vec<String>,
    /// Submodel patterns; a match keeps the requested name as submodel.
    pub submodels: Vec<SubmodelPattern>,
    /// Pattern to submodel-name mappings, in file order.
    pub submodel_aliases: Vec<(SubmodelPattern, String)>,
    /// Submodel assumed when only the family is known.
    pub default_submodel: Option<String>,
    /// `little` or `big`, when fixed for the family.
    pub endian: Option<String>,
    /// Whether unaligned loads and stores are safe.
    pub unaligned_ok: bool,
}

impl ArchInfo {
    /// Read an architecture description from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_file(path, &ARCH_SCHEMA)?)
    }

    /// Parse architecture description text.
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_str(source, path, &ARCH_SCHEMA)?)
    }

    /// Build an architecture from a lexed record, compiling its patterns.
    pub fn from_record(mut record: Record) -> Result<Self> {
        let file = record.file().to_path_buf();

        let submodels = record
            .take_group("submodels")
            .iter()
            .map(|p| SubmodelPattern::new(p, &file))
            .collect::<Result<Vec<_>>>()?;

        let submodel_aliases = record
            .take_pairs("submodel_aliases")?
            .into_iter()
            .map(|(pattern, submodel)| Ok((SubmodelPattern::new(&pattern, &file)?, submodel)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: record.name().to_string(),
            real_name: record.text("realname"),
            aliases: record.take_group("aliases"),
            submodels,
            submodel_aliases,
            default_submodel: record.optional("default_submodel"),
            endian: record.optional("endian"),
            unaligned_ok: record.scalar("unaligned") == Some("ok"),
        })
    }

    /// Whether `name` is this family's canonical name or one of its aliases.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Find which submodel entry claims a normalized processor string.
    /// Submodel aliases are tried before plain submodel patterns.
    pub fn find_submodel(&self, processor: &str) -> Option<SubmodelMatch<'_>> {
        if let Some((_, submodel)) = self
            .submodel_aliases
            .iter()
            .find(|(pattern, _)| pattern.matches(processor))
        {
            return Some(SubmodelMatch::Alias(submodel));
        }
        self.submodels
            .iter()
            .find(|pattern| pattern.matches(processor))
            .map(SubmodelMatch::Pattern)
    }

    /// Submodel name for a user-supplied processor: the aliased name, or
    /// `processor` itself when a plain pattern matches.
    pub fn match_submodel(&self, processor: &str) -> Option<String> {
        self.find_submodel(processor).map(|m| match m {
            SubmodelMatch::Alias(name) => name.to_string(),
            SubmodelMatch::Pattern(_) => processor.to_string(),
        })
    }

    /// Preprocessor macros describing this architecture and `submodel`.
    pub fn defines(&self, submodel: &str) -> Vec<String> {
        let mut macros = vec![format!("TARGET_ARCH_IS_{}", macro_ident(&self.name))];

        if self.name != submodel {
            macros.push(format!("TARGET_CPU_IS_{}", macro_ident(submodel)));
        }

        if let Some(endian) = &self.endian {
            macros.push(format!("TARGET_CPU_IS_{}_ENDIAN", macro_ident(endian)));
        }

        macros.push(format!(
            "TARGET_UNALIGNED_LOADSTORE_OK {}",
            u8::from(self.unaligned_ok)
        ));
        macros
    }
}
