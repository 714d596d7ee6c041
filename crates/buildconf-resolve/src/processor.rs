//! Processor canonicalization and host autodetection.
//!
//! Both entry points walk the architecture map in ascending name order, so
//! overlapping patterns in two architectures always resolve the same way.

use std::collections::BTreeMap;
use buildconf_meta::{ArchInfo, SubmodelMatch};
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::error::{ResolveError, Result};

/// Vendor markers removed from host processor descriptions.
const VENDOR_MARKERS: [&str; 2] = ["(tm)", "(r)"];

/// A resolved processor: architecture family plus submodel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    /// Canonical architecture name.
    pub arch: String,
    /// Submodel name (equal to `arch` when no submodel applies).
    pub submodel: String,
}

impl Processor {
    fn new(arch: impl Into<String>, submodel: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            submodel: submodel.into(),
        }
    }
}

/// Lowercase a processor description and drop whitespace and vendor marks.
pub fn normalize_processor(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    for marker in VENDOR_MARKERS {
        name = name.replace(marker, "");
    }
    name
}

/// Resolve a user-supplied processor name.
///
/// A family name or alias resolves to the family itself; otherwise the first
/// architecture with a matching submodel alias or submodel pattern wins.
pub fn canonicalize(arch: &BTreeMap<String, ArchInfo>, requested: &str) -> Result<Processor> {
    let name = normalize_processor(requested);

    for info in arch.values() {
        if info.is_named(&name) {
            return Ok(Processor::new(&info.name, &info.name));
        }
        if let Some(submodel) = info.match_submodel(&name) {
            debug!(requested, arch = %info.name, %submodel, "processor matched submodel");
            return Ok(Processor::new(&info.name, submodel));
        }
    }

    Err(ResolveError::UnknownProcessor {
        name: requested.to_string(),
        available: arch.keys().cloned().collect::<Vec<_>>().join(" "),
    })
}

/// What the host reports about its processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProbe {
    /// Machine type (e.g. `x86_64`, `aarch64`).
    pub machine: String,
    /// Free-form processor description.
    pub processor: String,
}

impl HostProbe {
    /// Probe the running host. The processor description is the CPU brand
    /// string when the OS reports one, else the machine type.
    pub fn detect() -> Self {
        let system =
            System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::everything()));
        let brand = system.cpus().first().map(|cpu| cpu.brand().to_string());
        Self::from_parts(System::cpu_arch(), brand)
    }

    fn from_parts(machine: Option<String>, brand: Option<String>) -> Self {
        let machine = machine
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());
        let processor = brand
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| machine.clone());
        Self { machine, processor }
    }
}

/// Guess the processor from host information.
///
/// The machine type selects the architecture; the normalized processor
/// description is then matched against its submodels. Without a submodel
/// match the machine type is used for both fields.
pub fn autodetect(arch: &BTreeMap<String, ArchInfo>, host: &HostProbe) -> Processor {
    let full = normalize_processor(&host.processor);
    let mut base = host.machine.clone();

    for info in arch.values() {
        if !info.is_named(&base) {
            continue;
        }
        base = info.name.clone();

        match info.find_submodel(&full) {
            Some(SubmodelMatch::Alias(submodel)) => return Processor::new(&base, submodel),
            Some(SubmodelMatch::Pattern(pattern)) => {
                return Processor::new(&base, pattern.as_str())
            }
            None => {}
        }
    }

    debug!(machine = %host.machine, processor = %host.processor, "no submodel matched host");
    Processor::new(base.clone(), base)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn arch_map(entries: &[(&str, &str)]) -> BTreeMap<String, ArchInfo> {
        entries
            .iter()
            .map(|(name, source)| {
                let info = ArchInfo::parse(source, &Path::new("arch").join(name)).unwrap();
                (info.name.clone(), info)
            })
            .collect()
    }

    fn sample() -> BTreeMap<String, ArchInfo> {
        arch_map(&[
            (
                "arm",
                "<submodels>\nstrongarm\ncortex-a9\n</submodels>\n\
                 <submodel_aliases>\n\"armv7.*\" -> armv7a\n</submodel_aliases>",
            ),
            (
                "ia32",
                "<aliases>\nx86\ni686\n</aliases>\n\
                 <submodels>\ni386\ni686\npentium4\n</submodels>\n\
                 <submodel_aliases>\n\"intelcore2.*\" -> core2\n\"pentium.*4\" -> pentium4\n</submodel_aliases>",
            ),
            (
                "x86_64",
                "<aliases>\namd64\n</aliases>\n\
                 <submodel_aliases>\n\"intelcore2.*\" -> core2\n\"amd.*opteron\" -> opteron\n</submodel_aliases>",
            ),
        ])
    }

    #[test]
    fn normalize() {
        assert_eq!(
            normalize_processor("Intel(R) Core(TM)2 Duo CPU"),
            "intelcore2duocpu"
        );
        assert_eq!(normalize_processor(" ARMv7-A "), "armv7-a");
    }

    #[test]
    fn canonical_family_name() {
        let arch = sample();
        assert_eq!(canonicalize(&arch, "arm").unwrap(), Processor::new("arm", "arm"));
        assert_eq!(canonicalize(&arch, "amd64").unwrap(), Processor::new("x86_64", "x86_64"));
    }

    #[test]
    fn canonical_submodel_alias() {
        let arch = sample();
        assert_eq!(
            canonicalize(&arch, "armv7-a").unwrap(),
            Processor::new("arm", "armv7a")
        );
    }

    #[test]
    fn canonical_literal_submodel_keeps_request() {
        let arch = sample();
        assert_eq!(
            canonicalize(&arch, "cortex-a9").unwrap(),
            Processor::new("arm", "cortex-a9")
        );
        assert_eq!(
            canonicalize(&arch, "pentium4").unwrap(),
            Processor::new("ia32", "pentium4")
        );
    }

    #[test]
    fn ambiguous_patterns_resolve_in_name_order() {
        let arch = sample();
        // Both ia32 and x86_64 alias intelcore2.*; ia32 sorts first.
        for _ in 0..3 {
            assert_eq!(
                canonicalize(&arch, "intelcore2").unwrap(),
                Processor::new("ia32", "core2")
            );
        }
    }

    #[test]
    fn unknown_processor() {
        let err = canonicalize(&sample(), "vax").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'vax'"));
        assert!(msg.contains("arm ia32 x86_64"));
    }

    #[test]
    fn autodetect_submodel_from_model_name() {
        let host = HostProbe {
            machine: "x86_64".into(),
            processor: "Intel(R) Core(TM)2 Quad CPU Q6600".into(),
        };
        assert_eq!(autodetect(&sample(), &host), Processor::new("x86_64", "core2"));
    }

    #[test]
    fn autodetect_via_machine_alias() {
        let host = HostProbe {
            machine: "i686".into(),
            processor: "Pentium(R) 4 CPU 3.00GHz".into(),
        };
        assert_eq!(autodetect(&sample(), &host), Processor::new("ia32", "pentium4"));
    }

    #[test]
    fn autodetect_plain_pattern_yields_pattern() {
        let host = HostProbe {
            machine: "arm".into(),
            processor: "StrongARM-110 rev 4".into(),
        };
        assert_eq!(autodetect(&sample(), &host), Processor::new("arm", "strongarm"));
    }

    #[test]
    fn autodetect_falls_back_to_machine() {
        let host = HostProbe {
            machine: "amd64".into(),
            processor: "Some Unknown Chip".into(),
        };
        assert_eq!(autodetect(&sample(), &host), Processor::new("x86_64", "x86_64"));

        let host = HostProbe {
            machine: "riscv64".into(),
            processor: "riscv64".into(),
        };
        assert_eq!(autodetect(&sample(), &host), Processor::new("riscv64", "riscv64"));
    }

    #[test]
    fn host_description_fallbacks() {
        let probe = HostProbe::from_parts(
            Some("x86_64".into()),
            Some("Intel(R) Xeon(R) CPU ".into()),
        );
        assert_eq!(probe.machine, "x86_64");
        assert_eq!(probe.processor, "Intel(R) Xeon(R) CPU");

        let probe = HostProbe::from_parts(Some("armv7l".into()), Some("  ".into()));
        assert_eq!(probe.processor, "armv7l");

        let probe = HostProbe::from_parts(None, None);
        assert_eq!(probe.machine, std::env::consts::ARCH);
        assert_eq!(probe.processor, probe.machine);
    }

    #[test]
    fn detect_fills_both_fields() {
        let probe = HostProbe::detect();
        assert!(!probe.machine.is_empty());
        assert!(!probe.processor.is_empty());
    }
}
