//! Module selection against a target.

use std::collections::BTreeSet;

use buildconf_meta::{MetadataStore, ModuleInfo};
use tracing::{debug, warn};

/// The target names modules are filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criteria<'a> {
    /// Compiler name.
    pub compiler: &'a str,
    /// Operating system name.
    pub os: &'a str,
    /// Architecture family name.
    pub arch: &'a str,
    /// Processor submodel name.
    pub submodel: &'a str,
}

/// Why a module was left out of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Compiler,
    Os,
    Arch,
}

/// Check a module's constraints. An empty constraint list accepts anything.
pub fn check(module: &ModuleInfo, criteria: &Criteria<'_>) -> Result<(), Rejection> {
    let lacks = |list: &[String], name: &str| !list.is_empty() && !list.iter().any(|x| x == name);

    if lacks(&module.cc, criteria.compiler) {
        return Err(Rejection::Compiler);
    }
    if lacks(&module.os, criteria.os) {
        return Err(Rejection::Os);
    }
    if lacks(&module.arch, criteria.arch) && lacks(&module.arch, criteria.submodel) {
        return Err(Rejection::Arch);
    }
    Ok(())
}

/// Whether a module can be built for the target.
pub fn is_applicable(module: &ModuleInfo, criteria: &Criteria<'_>) -> bool {
    check(module, criteria).is_ok()
}

/// Every module that can be built for the target, in name order.
pub fn choose_modules<'s>(store: &'s MetadataStore, criteria: &Criteria<'_>) -> Vec<&'s ModuleInfo> {
    let mut chosen = Vec::new();
    for module in store.modules.values() {
        match check(module, criteria) {
            Ok(()) => chosen.push(module),
            Err(reason) => debug!(module = %module.name, ?reason, "module not usable on target"),
        }
    }

    for (module, missing) in unmet_requirements(&chosen) {
        warn!(module = %module, requires = %missing, "required module is not part of the build");
    }
    chosen
}

/// `(module, requirement)` pairs whose requirement was not selected.
pub fn unmet_requirements(selected: &[&ModuleInfo]) -> Vec<(String, String)> {
    let names: BTreeSet<&str> = selected.iter().map(|m| m.name.as_str()).collect();
    let mut unmet = Vec::new();
    for module in selected {
        for requirement in &module.requires {
            if !names.contains(requirement.as_str()) {
                unmet.push((module.name.clone(), requirement.clone()));
            }
        }
    }
    unmet
}
