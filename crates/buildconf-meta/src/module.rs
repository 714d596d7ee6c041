//! Source module descriptors (`info.txt`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::lexer;
use crate::record::{Record, Schema};

/// Fields of an `info.txt` module descriptor.
pub const MODULE_SCHEMA: Schema = Schema {
    groups: &["add", "requires", "os", "arch", "cc", "libs"],
    scalars: &[
        ("realname", Some("<UNKNOWN>")),
        ("load_on", Some("request")),
        ("define", None),
        ("modset", None),
        ("uses_tr1", Some("false")),
        ("note", Some("")),
        ("mp_bits", Some("0")),
    ],
};

/// Which operating systems a library requirement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryScope {
    /// `all`
    All,
    /// A single named OS.
    Only(String),
    /// `all!os1,os2`: every OS except those listed.
    AllExcept(Vec<String>),
}

impl LibraryScope {
    /// Parse a `libs` table key.
    pub fn parse(key: &str) -> Self {
        if key == "all" {
            Self::All
        } else if let Some(rest) = key.strip_prefix("all!") {
            Self::AllExcept(rest.split(',').map(str::to_string).collect())
        } else {
            Self::Only(key.to_string())
        }
    }

    /// Whether the requirement applies when targeting `os`.
    pub fn applies_to(&self, os: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == os,
            Self::AllExcept(excluded) => !excluded.iter().any(|e| e == os),
        }
    }
}

/// A source module: a directory of files plus the constraints under which
/// it can be built.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    /// Canonical name (the directory holding `info.txt`).
    pub name: String,
    /// Directory holding `info.txt`.
    pub lives_in: PathBuf,
    /// Human-readable name.
    pub real_name: String,
    /// Load policy (`request`, `auto`, ...).
    pub load_on: String,
    /// Feature macro suffix, emitted as `HAS_<define>`.
    pub define: Option<String>,
    /// Module set this module belongs to.
    pub modset: Option<String>,
    /// Whether the module needs TR1.
    pub uses_tr1: bool,
    /// Free-form note.
    pub note: String,
    /// Multiprecision word size required by the module, 0 if none.
    pub mp_bits: u32,
    /// Contributed files, relative to the source root.
    pub files: Vec<String>,
    /// Names of modules this one depends on.
    pub requires: Vec<String>,
    /// Allowed operating systems (empty = any).
    pub os: Vec<String>,
    /// Allowed architectures or submodels (empty = any).
    pub arch: Vec<String>,
    /// Allowed compilers (empty = any).
    pub cc: Vec<String>,
    /// External libraries keyed by OS scope (`all`, `linux`, `all!windows`).
    pub libs: BTreeMap<String, String>,
}

impl ModuleInfo {
    /// Read a module descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_file(path, &MODULE_SCHEMA)?)
    }

    /// Parse module descriptor text; `path` is where it notionally lives.
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_str(source, path, &MODULE_SCHEMA)?)
    }

    /// Build a module from a lexed record.
    pub fn from_record(mut record: Record) -> Result<Self> {
        let lives_in = record.lives_in().to_path_buf();
        let files = record
            .take_group("add")
            .iter()
            .map(|f| lives_in.join(f).to_string_lossy().into_owned())
            .collect();

        Ok(Self {
            name: record.name().to_string(),
            real_name: record.text("realname"),
            load_on: record.text("load_on"),
            define: record.optional("define"),
            modset: record.optional("modset"),
            uses_tr1: record.flag("uses_tr1")?,
            note: record.text("note"),
            mp_bits: record.number("mp_bits")?,
            files,
            requires: record.take_group("requires"),
            os: record.take_group("os"),
            arch: record.take_group("arch"),
            cc: record.take_group("cc"),
            libs: record.take_table("libs")?,
            lives_in,
        })
    }

    /// External libraries this module needs when targeting `os`.
    pub fn libraries_for<'a>(&'a self, os: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.libs
            .iter()
            .filter(move |(scope, _)| LibraryScope::parse(scope).applies_to(os))
            .map(|(_, lib)| lib.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA1: &str = r#"
realname "SHA-1"
define SHA1
mp_bits 32

<add>
sha160.cpp
sha160.h
</add>

<requires>
mdx_hash
</requires>

<arch>
x86
ia32
</arch>

<libs>
all!windows,mingw -> pthread
windows -> advapi32
</libs>
"#;

    #[test]
    fn parse_full_module() {
        let m = ModuleInfo::parse(SHA1, Path::new("src/hash/sha1/info.txt")).unwrap();
        assert_eq!(m.name, "sha1");
        assert_eq!(m.real_name, "SHA-1");
        assert_eq!(m.define.as_deref(), Some("SHA1"));
        assert_eq!(m.mp_bits, 32);
        assert_eq!(m.load_on, "request");
        assert!(!m.uses_tr1);
        assert_eq!(
            m.files,
            vec!["src/hash/sha1/sha160.cpp", "src/hash/sha1/sha160.h"]
        );
        assert_eq!(m.requires, vec!["mdx_hash"]);
        assert_eq!(m.arch, vec!["x86", "ia32"]);
        assert!(m.os.is_empty());
        assert_eq!(m.libs.len(), 2);
    }

    #[test]
    fn defaults_for_empty_module() {
        let m = ModuleInfo::parse("", Path::new("src/empty/info.txt")).unwrap();
        assert_eq!(m.real_name, "<UNKNOWN>");
        assert!(m.define.is_none());
        assert!(m.modset.is_none());
        assert_eq!(m.mp_bits, 0);
        assert!(m.files.is_empty());
    }

    #[test]
    fn library_scope_parsing() {
        assert_eq!(LibraryScope::parse("all"), LibraryScope::All);
        assert_eq!(
            LibraryScope::parse("linux"),
            LibraryScope::Only("linux".into())
        );
        assert_eq!(
            LibraryScope::parse("all!windows,cygwin"),
            LibraryScope::AllExcept(vec!["windows".into(), "cygwin".into()])
        );
    }

    #[test]
    fn libraries_follow_os() {
        let m = ModuleInfo::parse(SHA1, Path::new("src/sha1/info.txt")).unwrap();
        assert_eq!(m.libraries_for("linux").collect::<Vec<_>>(), vec!["pthread"]);
        assert_eq!(
            m.libraries_for("windows").collect::<Vec<_>>(),
            vec!["advapi32"]
        );
        assert!(m.libraries_for("mingw").next().is_none());
    }

    #[test]
    fn malformed_libs_table() {
        let err = ModuleInfo::parse("<libs>\nall ->\n</libs>", Path::new("m/info.txt"));
        assert!(err.is_err());
    }
}
