//! Discovery and loading of every metadata file in a source tree.
//!
//! Module descriptors are `info.txt` files anywhere under the source
//! directory. Architectures, operating systems and compilers are every file
//! under `arch/`, `os/` and `cc/` of the build-data directory, named after
//! the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::arch::ArchInfo;
use crate::compiler::CompilerInfo;
use crate::error::{MetaError, Result};
use crate::module::ModuleInfo;
use crate::os::OsInfo;
use crate::record::MODULE_DESCRIPTOR;

/// File under `os/` holding shared defaults rather than an OS.
const OS_DEFAULTS_FILE: &str = "defaults";

/// All metadata of a source tree, keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    /// Source modules.
    pub modules: BTreeMap<String, ModuleInfo>,
    /// Processor architectures.
    pub arch: BTreeMap<String, ArchInfo>,
    /// Compilers.
    pub compilers: BTreeMap<String, CompilerInfo>,
    /// Operating systems.
    pub os: BTreeMap<String, OsInfo>,
}

impl MetadataStore {
    /// Load modules from `source_dir` and target descriptions from
    /// `build_data_dir`.
    pub fn load(source_dir: &Path, build_data_dir: &Path) -> Result<Self> {
        let mut store = Self::default();

        for path in find_files_named(source_dir, MODULE_DESCRIPTOR)? {
            let module = ModuleInfo::load(&path)?;
            debug!(module = %module.name, path = %path.display(), "loaded module");
            insert_unique(&mut store.modules, module.name.clone(), module, &path);
        }

        for path in list_files(&build_data_dir.join("arch"))? {
            let arch = ArchInfo::load(&path)?;
            insert_unique(&mut store.arch, arch.name.clone(), arch, &path);
        }

        for path in list_files(&build_data_dir.join("os"))? {
            if path.file_name().is_some_and(|n| n == OS_DEFAULTS_FILE) {
                debug!(path = %path.display(), "skipping OS defaults file");
                continue;
            }
            let os = OsInfo::load(&path)?;
            insert_unique(&mut store.os, os.name.clone(), os, &path);
        }

        for path in list_files(&build_data_dir.join("cc"))? {
            let cc = CompilerInfo::load(&path)?;
            insert_unique(&mut store.compilers, cc.name.clone(), cc, &path);
        }

        debug!(
            modules = store.modules.len(),
            arch = store.arch.len(),
            os = store.os.len(),
            compilers = store.compilers.len(),
            "metadata loaded"
        );
        Ok(store)
    }

    /// Sorted compiler names.
    pub fn compiler_names(&self) -> Vec<&str> {
        self.compilers.keys().map(String::as_str).collect()
    }

    /// Sorted OS names.
    pub fn os_names(&self) -> Vec<&str> {
        self.os.keys().map(String::as_str).collect()
    }

    /// Sorted architecture names.
    pub fn arch_names(&self) -> Vec<&str> {
        self.arch.keys().map(String::as_str).collect()
    }
}

fn insert_unique<T>(map: &mut BTreeMap<String, T>, name: String, value: T, path: &Path) {
    if map.insert(name.clone(), value).is_some() {
        warn!(name = %name, path = %path.display(), "duplicate metadata entry replaces earlier one");
    }
}

/// Every file named `name` below `root`, in path order.
fn find_files_named(root: &Path, name: &str) -> Result<Vec<PathBuf>> {
    Ok(list_files(root)?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n == name))
        .collect())
}

/// Every regular file below `root`, in path order. A missing directory
/// holds no files.
fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        warn!(path = %root.display(), "metadata directory not found");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| MetaError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/hash/sha1/info.txt", "define SHA1\n<add>\nsha1.cpp\n</add>\n");
        write(root, "src/hash/md5/info.txt", "define MD5\n");
        write(root, "src/hash/md5/md5.cpp", "");
        write(root, "src/build-data/arch/x86_64", "<aliases>\namd64\n</aliases>\n");
        write(root, "src/build-data/arch/ia32", "<aliases>\nx86\n</aliases>\n");
        write(root, "src/build-data/os/linux", "os_type unix\n");
        write(root, "src/build-data/os/defaults", "this is not an os file\n");
        write(root, "src/build-data/cc/gcc", "binary_name \"g++\"\n");
        dir
    }

    #[test]
    fn load_tree() {
        let dir = tree();
        let src = dir.path().join("src");
        let store = MetadataStore::load(&src, &src.join("build-data")).unwrap();

        assert_eq!(store.modules.keys().collect::<Vec<_>>(), vec!["md5", "sha1"]);
        assert_eq!(store.arch_names(), vec!["ia32", "x86_64"]);
        assert_eq!(store.os_names(), vec!["linux"]);
        assert_eq!(store.compiler_names(), vec!["gcc"]);
        assert_eq!(
            store.modules["sha1"].files,
            vec![src.join("hash/sha1/sha1.cpp").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn missing_directories_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::load(dir.path(), &dir.path().join("nope")).unwrap();
        assert!(store.modules.is_empty());
        assert!(store.compilers.is_empty());
    }

    #[test]
    fn parse_error_propagates() {
        let dir = tree();
        write(dir.path(), "src/broken/info.txt", "nonsense\n");
        let src = dir.path().join("src");
        let err = MetadataStore::load(&src, &src.join("build-data")).unwrap_err();
        assert!(matches!(err, MetaError::Parse { .. }));
    }
}
