//! `buildconf list`: show what the metadata describes.

use anyhow::Result;
use buildconf_meta::MetadataStore;
use clap::ValueEnum;

/// Kind of metadata entry to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Modules,
    Arch,
    Os,
    Cc,
}

/// `(name, description)` rows for `kind`, in name order.
pub fn entries(store: &MetadataStore, kind: ListKind) -> Vec<(String, String)> {
    match kind {
        ListKind::Modules => store
            .modules
            .values()
            .map(|m| (m.name.clone(), m.real_name.clone()))
            .collect(),
        ListKind::Arch => store
            .arch
            .values()
            .map(|a| {
                let submodels: Vec<&str> = a.submodels.iter().map(|s| s.as_str()).collect();
                let detail = if submodels.is_empty() {
                    a.real_name.clone()
                } else {
                    format!("{} [{}]", a.real_name, submodels.join(" "))
                };
                (a.name.clone(), detail)
            })
            .collect(),
        ListKind::Os => store
            .os
            .values()
            .map(|o| (o.name.clone(), o.real_name.clone()))
            .collect(),
        ListKind::Cc => store
            .compilers
            .values()
            .map(|c| (c.name.clone(), format!("{} ({})", c.real_name, c.binary())))
            .collect(),
    }
}

/// Print the entries of one kind.
pub fn run(store: &MetadataStore, kind: ListKind) -> Result<()> {
    let rows = entries(store, kind);
    if rows.is_empty() {
        println!("No {kind:?} entries found.");
        return Ok(());
    }
    for (name, detail) in rows {
        println!("  {name:<25} {detail}");
    }
    Ok(())
}
