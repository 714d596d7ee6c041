//! The file-level view of a build: which headers, sources and self-tests
//! go into it, and where their outputs land.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use buildconf_meta::ModuleInfo;
use tracing::warn;

use crate::error::{ResolveError, Result};

/// Suffix that marks a contributed file as a public header.
const HEADER_SUFFIX: &str = ".h";

/// Suffix of self-test sources.
const CHECK_SUFFIX: &str = ".cpp";

/// Documentation shipped when present in the doc directory.
const DOC_CANDIDATES: [&str; 12] = [
    "api.pdf",
    "tutorial.pdf",
    "fips140.pdf",
    "api.tex",
    "tutorial.tex",
    "fips140.tex",
    "credits.txt",
    "license.txt",
    "log.txt",
    "thanks.txt",
    "todo.txt",
    "pgpkeys.asc",
];

/// Always-shipped top-level readme.
const README: &str = "readme.txt";

/// Headers, sources and output directories of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Root of the build tree.
    pub build_dir: PathBuf,
    /// Object directory for library sources.
    pub libobj_dir: PathBuf,
    /// Object directory for self-test sources.
    pub checkobj_dir: PathBuf,
    /// Include root handed to the compiler.
    pub include_dir: PathBuf,
    /// Directory public headers are copied into.
    pub full_include_dir: PathBuf,
    /// Public headers, sorted.
    pub headers: Vec<String>,
    /// Library sources, sorted, disjoint from `headers`.
    pub sources: Vec<String>,
    /// Self-test sources, sorted.
    pub check_sources: Vec<String>,
}

impl BuildConfig {
    /// Partition the selected modules' files. `project` names the header
    /// subdirectory under the include root.
    pub fn new(
        build_dir: &Path,
        project: &str,
        modules: &[&ModuleInfo],
        check_sources: Vec<String>,
    ) -> Self {
        let include_dir = build_dir.join("include");
        let all_files: BTreeSet<&str> = modules
            .iter()
            .flat_map(|m| m.files.iter().map(String::as_str))
            .collect();

        let (headers, sources): (Vec<&str>, Vec<&str>) =
            all_files.into_iter().partition(|f| f.ends_with(HEADER_SUFFIX));

        Self {
            build_dir: build_dir.to_path_buf(),
            libobj_dir: build_dir.join("lib"),
            checkobj_dir: build_dir.join("checks"),
            full_include_dir: include_dir.join(project),
            include_dir,
            headers: headers.into_iter().map(str::to_string).collect(),
            sources: sources.into_iter().map(str::to_string).collect(),
            check_sources,
        }
    }
}

/// Self-test sources directly inside `checks_dir`, sorted. A missing
/// directory contributes none.
pub fn discover_check_sources(checks_dir: &Path) -> Result<Vec<String>> {
    if !checks_dir.is_dir() {
        warn!(path = %checks_dir.display(), "self-test directory not found");
        return Ok(Vec::new());
    }

    let io_err = |source| ResolveError::Io {
        path: checks_dir.to_path_buf(),
        source,
    };

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(checks_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.to_string_lossy().ends_with(CHECK_SUFFIX) {
            sources.push(path.to_string_lossy().into_owned());
        }
    }
    sources.sort();
    Ok(sources)
}

/// The readme plus every known documentation file present in `doc_dir`.
pub fn discover_doc_files(doc_dir: &Path) -> Vec<String> {
    let mut docs = vec![README.to_string()];
    docs.extend(
        DOC_CANDIDATES
            .iter()
            .map(|name| doc_dir.join(name))
            .filter(|path| path.is_file())
            .map(|path| path.to_string_lossy().into_owned()),
    );
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, files: &[&str]) -> ModuleInfo {
        let mut m = ModuleInfo::parse("", &Path::new(name).join("info.txt")).unwrap();
        m.files = files.iter().map(|f| f.to_string()).collect();
        m
    }

    #[test]
    fn partition_headers_and_sources() {
        let a = module("a", &["a.cpp", "a.h"]);
        let b = module("b", &["b.cpp"]);
        let config = BuildConfig::new(Path::new("build"), "botan", &[&b, &a], Vec::new());
        assert_eq!(config.sources, vec!["a.cpp", "b.cpp"]);
        assert_eq!(config.headers, vec!["a.h"]);
    }

    #[test]
    fn headers_and_sources_disjoint_and_sorted() {
        let a = module("a", &["z.cpp", "m.h", "b.S", "a.h", "z.cpp"]);
        let b = module("b", &["c.cpp", "m.h"]);
        let config = BuildConfig::new(Path::new("build"), "botan", &[&a, &b], Vec::new());

        assert!(config.headers.windows(2).all(|w| w[0] < w[1]));
        assert!(config.sources.windows(2).all(|w| w[0] < w[1]));
        assert!(config.headers.iter().all(|h| !config.sources.contains(h)));
        assert_eq!(config.headers, vec!["a.h", "m.h"]);
        assert_eq!(config.sources, vec!["b.S", "c.cpp", "z.cpp"]);
    }

    #[test]
    fn directory_layout() {
        let config = BuildConfig::new(Path::new("out"), "botan", &[], Vec::new());
        assert_eq!(config.libobj_dir, Path::new("out/lib"));
        assert_eq!(config.checkobj_dir, Path::new("out/checks"));
        assert_eq!(config.include_dir, Path::new("out/include"));
        assert_eq!(config.full_include_dir, Path::new("out/include/botan"));
    }

    #[test]
    fn check_sources_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let checks = dir.path().join("checks");
        std::fs::create_dir(&checks).unwrap();
        for name in ["validate.cpp", "bench.cpp", "check.h", "notes.txt"] {
            std::fs::write(checks.join(name), "").unwrap();
        }
        let found = discover_check_sources(&checks).unwrap();
        assert_eq!(
            found,
            vec![
                checks.join("bench.cpp").to_string_lossy().into_owned(),
                checks.join("validate.cpp").to_string_lossy().into_owned(),
            ]
        );
        assert!(discover_check_sources(&dir.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn doc_files_present_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("license.txt"), "").unwrap();
        std::fs::write(dir.path().join("api.pdf"), "").unwrap();
        let docs = discover_doc_files(dir.path());
        assert_eq!(docs[0], "readme.txt");
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().any(|d| d.ends_with("license.txt")));
    }
}
