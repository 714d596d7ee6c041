//! `buildconf.toml` parsing and project defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use buildconf_resolve::{ProjectInfo, ReleaseVersion};
use serde::{Deserialize, Serialize};

/// File name looked up at the source root.
pub const SETTINGS_FILE: &str = "buildconf.toml";

/// Project-wide configure settings. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Project identity.
    #[serde(default)]
    pub project: ProjectSection,
    /// Source tree layout.
    #[serde(default)]
    pub paths: PathsSection,
    /// Defaults for target selection.
    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// Project identity section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSection {
    #[serde(default = "default_name")]
    pub name: String,
    /// Macro prefix; the upper-cased name when unset.
    #[serde(default)]
    pub macro_prefix: Option<String>,
    #[serde(default)]
    pub version: ReleaseVersion,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            macro_prefix: None,
            version: ReleaseVersion::default(),
        }
    }
}

fn default_name() -> String {
    "botan".to_string()
}

/// Source tree layout, relative to the source root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsSection {
    /// Directory searched for module descriptors.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Directory holding `arch/`, `os/`, `cc/` and the templates.
    #[serde(default = "default_build_data_dir")]
    pub build_data_dir: PathBuf,
    /// Self-test sources.
    #[serde(default = "default_checks_dir")]
    pub checks_dir: PathBuf,
    /// Documentation sources.
    #[serde(default = "default_doc_dir")]
    pub doc_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_data_dir: default_build_data_dir(),
            checks_dir: default_checks_dir(),
            doc_dir: default_doc_dir(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_build_data_dir() -> PathBuf {
    Path::new("src").join("build-data")
}

fn default_checks_dir() -> PathBuf {
    PathBuf::from("checks")
}

fn default_doc_dir() -> PathBuf {
    PathBuf::from("doc")
}

/// Target selection defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// Compiler used when `--cc` is not given.
    #[serde(default = "default_compiler")]
    pub compiler: String,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
        }
    }
}

fn default_compiler() -> String {
    "gcc".to_string()
}

impl Settings {
    /// Load settings from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load `buildconf.toml` from `root` if present, defaults otherwise.
    pub fn find_and_load(root: &Path) -> Result<Self> {
        let candidate = root.join(SETTINGS_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse settings from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing buildconf.toml")
    }

    /// Project identity as the resolver sees it.
    pub fn project_info(&self) -> ProjectInfo {
        let macro_prefix = self
            .project
            .macro_prefix
            .clone()
            .unwrap_or_else(|| buildconf_meta::macros::macro_ident(&self.project.name));
        ProjectInfo {
            name: self.project.name.clone(),
            macro_prefix: macro_prefix.trim_end_matches('_').to_string(),
            version: self.project.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_use_defaults() {
        let settings = Settings::from_str("").unwrap();
        assert_eq!(settings.project.name, "botan");
        assert_eq!(settings.defaults.compiler, "gcc");
        assert_eq!(settings.paths.build_data_dir, Path::new("src/build-data"));

        let project = settings.project_info();
        assert_eq!(project.macro_prefix, "BOTAN");
        assert_eq!(project.version.version_string(), "1.8.3");
    }

    #[test]
    fn full_settings() {
        let settings = Settings::from_str(
            r#"
[project]
name = "cryptolib"
macro-prefix = "CL_"

[project.version]
major = 2
minor = 0
patch = 1
so-patch = 0

[paths]
source-dir = "lib"
build-data-dir = "lib/data"

[defaults]
compiler = "clang"
"#,
        )
        .unwrap();

        let project = settings.project_info();
        assert_eq!(project.name, "cryptolib");
        assert_eq!(project.macro_prefix, "CL");
        assert_eq!(project.version.so_version_string(), "2.0.0");
        assert_eq!(settings.paths.source_dir, Path::new("lib"));
        assert_eq!(settings.paths.checks_dir, Path::new("checks"));
        assert_eq!(settings.defaults.compiler, "clang");
    }

    #[test]
    fn partial_version_keeps_other_fields() {
        let settings = Settings::from_str("[project.version]\nmajor = 2\n").unwrap();
        let version = settings.project_info().version;
        assert_eq!(version.version_string(), "2.8.3");
        assert_eq!(version.so_version_string(), "2.8.2");
    }

    #[test]
    fn derived_macro_prefix_is_sanitized() {
        let settings = Settings::from_str("[project]\nname = \"my-lib\"\n").unwrap();
        assert_eq!(settings.project_info().macro_prefix, "MY_LIB");
    }

    #[test]
    fn find_and_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::find_and_load(dir.path()).unwrap();
        assert_eq!(settings.project.name, "botan");
    }

    #[test]
    fn invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "[project\n").unwrap();
        let err = Settings::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
