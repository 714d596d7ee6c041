//! Operating system descriptions (`build-data/os/*`).

use std::path::Path;

use crate::error::Result;
use crate::lexer;
use crate::macros::macro_ident;
use crate::record::{Record, Schema};

/// Fields of an operating system description.
pub const OS_SCHEMA: Schema = Schema {
    groups: &["aliases", "target_features", "supports_shared"],
    scalars: &[
        ("realname", Some("<UNKNOWN>")),
        ("os_type", None),
        ("obj_suffix", Some("o")),
        ("so_suffix", Some("so")),
        ("static_suffix", Some("a")),
        ("ar_command", Some("ar crs")),
        ("ar_needs_ranlib", Some("false")),
        ("install_root", Some("/usr/local")),
        ("header_dir", Some("include")),
        ("lib_dir", Some("lib")),
        ("doc_dir", Some("share/doc")),
        ("install_cmd_data", Some("install -m 644")),
        ("install_cmd_exec", Some("install -m 755")),
    ],
};

/// An operating system: file naming, archiving and install conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct OsInfo {
    /// Canonical name (file name).
    pub name: String,
    /// Human-readable name.
    pub real_name: String,
    /// OS family (`unix`, `windows`).
    pub os_type: Option<String>,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// Object file suffix without the dot.
    pub obj_suffix: String,
    /// Shared library suffix without the dot.
    pub so_suffix: String,
    /// Static library suffix without the dot.
    pub static_suffix: String,
    /// Archiver command.
    pub ar_command: String,
    /// Whether archives need a separate ranlib pass.
    pub ar_needs_ranlib: bool,
    /// Default installation prefix.
    pub install_root: String,
    /// Header directory under the prefix.
    pub header_dir: String,
    /// Library directory under the prefix.
    pub lib_dir: String,
    /// Documentation directory under the prefix.
    pub doc_dir: String,
    /// Command installing data files.
    pub install_cmd_data: String,
    /// Command installing executables.
    pub install_cmd_exec: String,
    /// OS features, emitted as `TARGET_OS_HAS_<FEATURE>`.
    pub target_features: Vec<String>,
    /// Shared library flavours supported; empty means static only.
    pub supports_shared: Vec<String>,
}

impl OsInfo {
    /// Read an OS description from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_file(path, &OS_SCHEMA)?)
    }

    /// Parse OS description text.
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_str(source, path, &OS_SCHEMA)?)
    }

    /// Build an OS from a lexed record.
    pub fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            name: record.name().to_string(),
            real_name: record.text("realname"),
            os_type: record.optional("os_type"),
            aliases: record.take_group("aliases"),
            obj_suffix: record.text("obj_suffix"),
            so_suffix: record.text("so_suffix"),
            static_suffix: record.text("static_suffix"),
            ar_command: record.text("ar_command"),
            ar_needs_ranlib: record.flag("ar_needs_ranlib")?,
            install_root: record.text("install_root"),
            header_dir: record.text("header_dir"),
            lib_dir: record.text("lib_dir"),
            doc_dir: record.text("doc_dir"),
            install_cmd_data: record.text("install_cmd_data"),
            install_cmd_exec: record.text("install_cmd_exec"),
            target_features: record.take_group("target_features"),
            supports_shared: record.take_group("supports_shared"),
        })
    }

    /// Whether `name` is this OS's canonical name or one of its aliases.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Command run on archives after creation; `true` is a no-op.
    pub fn ranlib_command(&self) -> &'static str {
        if self.ar_needs_ranlib {
            "ranlib"
        } else {
            "true"
        }
    }

    /// Whether shared libraries can be built.
    pub fn builds_shared(&self) -> bool {
        !self.supports_shared.is_empty()
    }

    /// Preprocessor macros describing the OS.
    pub fn defines(&self) -> Vec<String> {
        std::iter::once(format!("TARGET_OS_IS_{}", macro_ident(&self.name)))
            .chain(
                self.target_features
                    .iter()
                    .map(|feature| format!("TARGET_OS_HAS_{}", macro_ident(feature))),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX: &str = r#"
realname "Linux"
os_type unix

<target_features>
clock_gettime
posix_mlock
gmtime_r
</target_features>

<supports_shared>
all
</supports_shared>

<aliases>
linux-gnu
</aliases>
"#;

    #[test]
    fn parse_linux() {
        let os = OsInfo::parse(LINUX, Path::new("build-data/os/linux")).unwrap();
        assert_eq!(os.name, "linux");
        assert_eq!(os.os_type.as_deref(), Some("unix"));
        assert_eq!(os.obj_suffix, "o");
        assert_eq!(os.ar_command, "ar crs");
        assert_eq!(os.install_root, "/usr/local");
        assert!(os.is_named("linux-gnu"));
        assert!(os.builds_shared());
        assert_eq!(os.ranlib_command(), "true");
    }

    #[test]
    fn os_defines() {
        let os = OsInfo::parse(LINUX, Path::new("build-data/os/linux")).unwrap();
        assert_eq!(
            os.defines(),
            vec![
                "TARGET_OS_IS_LINUX",
                "TARGET_OS_HAS_CLOCK_GETTIME",
                "TARGET_OS_HAS_POSIX_MLOCK",
                "TARGET_OS_HAS_GMTIME_R",
            ]
        );
    }

    #[test]
    fn ranlib_when_needed() {
        let os = OsInfo::parse(
            "ar_needs_ranlib yes\nobj_suffix obj\nso_suffix dll",
            Path::new("os/darwin"),
        )
        .unwrap();
        assert_eq!(os.ranlib_command(), "ranlib");
        assert_eq!(os.obj_suffix, "obj");
        assert!(!os.builds_shared());
    }

    #[test]
    fn ranlib_false_stays_false() {
        let os = OsInfo::parse("ar_needs_ranlib false", Path::new("os/x")).unwrap();
        assert!(!os.ar_needs_ranlib);
    }
}
