//! `buildconf detect`: report what autodetection sees on this host.

use anyhow::Result;
use buildconf_meta::MetadataStore;
use buildconf_resolve::{autodetect, normalize_processor, HostProbe, Processor};

use crate::host::host_os;

/// Host OS, probe and the processor guessed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub os: String,
    pub probe: HostProbe,
    pub processor: Processor,
    /// Whether the guessed architecture is described by the metadata.
    pub known: bool,
}

/// Run autodetection against `store`.
pub fn detect(store: &MetadataStore, probe: &HostProbe) -> Detection {
    let processor = autodetect(&store.arch, probe);
    Detection {
        os: host_os().to_string(),
        probe: probe.clone(),
        known: store.arch.contains_key(&processor.arch),
        processor,
    }
}

/// Print the detection report.
pub fn run(store: &MetadataStore, probe: &HostProbe) -> Result<()> {
    let d = detect(store, probe);
    println!("OS:        {}", d.os);
    println!("Machine:   {}", d.probe.machine);
    println!("Processor: {}", d.probe.processor);
    println!("  normalized: {}", normalize_processor(&d.probe.processor));
    println!("Arch:      {}", d.processor.arch);
    println!("Submodel:  {}", d.processor.submodel);
    if !d.known {
        println!();
        println!("warning: no architecture description matches this host; pass --cpu to configure.");
    }
    Ok(())
}
