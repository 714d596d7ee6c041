//! Release identity of the project being configured.

use serde::{Deserialize, Serialize};

/// Version numbers of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Patch level of the shared-object version.
    pub so_patch: u32,
}

impl Default for ReleaseVersion {
    fn default() -> Self {
        Self {
            major: 1,
            minor: 8,
            patch: 3,
            so_patch: 2,
        }
    }
}

impl ReleaseVersion {
    /// `major.minor.patch`
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// `major.minor.so_patch`
    pub fn so_version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.so_patch)
    }
}

/// Naming and version of the project being configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Project name, used for the header directory and config file names.
    pub name: String,
    /// Prefix of generated preprocessor macros, without the trailing `_`.
    pub macro_prefix: String,
    /// Release version.
    pub version: ReleaseVersion,
}

impl ProjectInfo {
    /// Name of the generated `<name>-config` script.
    pub fn config_script(&self) -> String {
        format!("{}-config", self.name)
    }

    /// Name of the generated pkg-config file, `<name>-<major>.<minor>.pc`.
    pub fn pkgconfig_file(&self) -> String {
        format!("{}-{}.{}.pc", self.name, self.version.major, self.version.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strings() {
        let v = ReleaseVersion::default();
        assert_eq!(v.version_string(), "1.8.3");
        assert_eq!(v.so_version_string(), "1.8.2");
    }

    #[test]
    fn generated_file_names() {
        let project = ProjectInfo {
            name: "botan".into(),
            macro_prefix: "BOTAN".into(),
            version: ReleaseVersion::default(),
        };
        assert_eq!(project.config_script(), "botan-config");
        assert_eq!(project.pkgconfig_file(), "botan-1.8.pc");
    }
}
