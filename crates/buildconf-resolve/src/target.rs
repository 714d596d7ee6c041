//! Resolution of the requested compiler, OS and processor against the
//! loaded metadata.

use buildconf_meta::{ArchInfo, CompilerInfo, MetadataStore, OsInfo};
use tracing::{debug, info};

use crate::error::{ResolveError, Result};
use crate::processor::{autodetect, canonicalize, HostProbe, Processor};
use crate::select::Criteria;

/// What the user asked to build for.
#[derive(Debug, Clone, Copy)]
pub struct TargetRequest<'a> {
    /// Compiler name.
    pub compiler: &'a str,
    /// Operating system name or alias.
    pub os: &'a str,
    /// Processor name; autodetected when `None`.
    pub cpu: Option<&'a str>,
}

/// A fully resolved target.
#[derive(Debug, Clone)]
pub struct Target<'s> {
    /// The compiler description.
    pub compiler: &'s CompilerInfo,
    /// The operating system description.
    pub os: &'s OsInfo,
    /// The architecture family.
    pub arch: &'s ArchInfo,
    /// The processor submodel.
    pub submodel: String,
}

impl Target<'_> {
    /// Names used to filter modules.
    pub fn criteria(&self) -> Criteria<'_> {
        Criteria {
            compiler: &self.compiler.name,
            os: &self.os.name,
            arch: &self.arch.name,
            submodel: &self.submodel,
        }
    }
}

/// Look up a compiler by canonical name.
pub fn find_compiler<'s>(store: &'s MetadataStore, name: &str) -> Result<&'s CompilerInfo> {
    store
        .compilers
        .get(name)
        .ok_or_else(|| ResolveError::UnknownCompiler {
            name: name.to_string(),
            available: store.compiler_names().join(" "),
        })
}

/// Look up an operating system by canonical name, then by alias.
pub fn find_os<'s>(store: &'s MetadataStore, name: &str) -> Result<&'s OsInfo> {
    store
        .os
        .get(name)
        .or_else(|| store.os.values().find(|os| os.is_named(name)))
        .ok_or_else(|| ResolveError::UnknownOs {
            name: name.to_string(),
            available: store.os_names().join(" "),
        })
}

/// Resolve a request into metadata entries.
pub fn resolve_target<'s>(
    store: &'s MetadataStore,
    request: &TargetRequest<'_>,
    host: &HostProbe,
) -> Result<Target<'s>> {
    let compiler = find_compiler(store, request.compiler)?;
    let os = find_os(store, request.os)?;

    let processor = match request.cpu {
        Some(cpu) => canonicalize(&store.arch, cpu)?,
        None => {
            let guess = autodetect(&store.arch, host);
            info!(arch = %guess.arch, submodel = %guess.submodel, "autodetected processor");
            guess
        }
    };
    let Processor { arch, submodel } = processor;

    let arch = store
        .arch
        .get(&arch)
        .ok_or_else(|| ResolveError::UnknownProcessor {
            name: arch.clone(),
            available: store.arch_names().join(" "),
        })?;

    debug!(
        compiler = %compiler.name,
        os = %os.name,
        arch = %arch.name,
        %submodel,
        "resolved target"
    );
    Ok(Target {
        compiler,
        os,
        arch,
        submodel,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn store() -> MetadataStore {
        let mut store = MetadataStore::default();
        for name in ["gcc", "msvc"] {
            let cc = CompilerInfo::parse("", &Path::new("cc").join(name)).unwrap();
            store.compilers.insert(cc.name.clone(), cc);
        }
        let linux = OsInfo::parse("<aliases>\nlinux-gnu\n</aliases>", Path::new("os/linux")).unwrap();
        store.os.insert(linux.name.clone(), linux);
        let arm = ArchInfo::parse(
            "<submodel_aliases>\n\"armv7.*\" -> armv7a\n</submodel_aliases>",
            Path::new("arch/arm"),
        )
        .unwrap();
        store.arch.insert(arm.name.clone(), arm);
        store
    }

    fn host(machine: &str) -> HostProbe {
        HostProbe {
            machine: machine.into(),
            processor: machine.into(),
        }
    }

    #[test]
    fn resolve_explicit_cpu() {
        let store = store();
        let request = TargetRequest {
            compiler: "gcc",
            os: "linux-gnu",
            cpu: Some("armv7-a"),
        };
        let target = resolve_target(&store, &request, &host("x86_64")).unwrap();
        assert_eq!(target.compiler.name, "gcc");
        assert_eq!(target.os.name, "linux");
        assert_eq!(target.arch.name, "arm");
        assert_eq!(target.submodel, "armv7a");
    }

    #[test]
    fn resolve_autodetected_cpu() {
        let store = store();
        let request = TargetRequest {
            compiler: "gcc",
            os: "linux",
            cpu: None,
        };
        let target = resolve_target(&store, &request, &host("arm")).unwrap();
        assert_eq!(target.arch.name, "arm");
        assert_eq!(target.submodel, "arm");
    }

    #[test]
    fn undetectable_host_is_error() {
        let store = store();
        let request = TargetRequest {
            compiler: "gcc",
            os: "linux",
            cpu: None,
        };
        let err = resolve_target(&store, &request, &host("sparc64")).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownProcessor { .. }));
    }

    #[test]
    fn unknown_compiler_lists_choices() {
        let store = store();
        let request = TargetRequest {
            compiler: "icc",
            os: "linux",
            cpu: Some("arm"),
        };
        let err = resolve_target(&store, &request, &host("arm")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown compiler 'icc'; available options: gcc msvc"
        );
    }

    #[test]
    fn unknown_os_lists_choices() {
        let store = store();
        let request = TargetRequest {
            compiler: "gcc",
            os: "beos",
            cpu: Some("arm"),
        };
        let err = resolve_target(&store, &request, &host("arm")).unwrap_err();
        assert_eq!(err.to_string(), "unknown OS 'beos'; available options: linux");
    }

    #[test]
    fn criteria_from_target() {
        let store = store();
        let request = TargetRequest {
            compiler: "msvc",
            os: "linux",
            cpu: Some("armv7-a"),
        };
        let target = resolve_target(&store, &request, &host("arm")).unwrap();
        let criteria = target.criteria();
        assert_eq!(criteria.compiler, "msvc");
        assert_eq!(criteria.arch, "arm");
        assert_eq!(criteria.submodel, "armv7a");
    }
}
