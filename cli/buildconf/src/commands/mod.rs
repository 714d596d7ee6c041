//! CLI command implementations.

pub mod configure;
pub mod detect;
pub mod list;

use std::path::Path;

use anyhow::{Context, Result};
use buildconf_meta::MetadataStore;

use crate::settings::Settings;

/// Load every metadata file of the source tree at `root`.
pub fn load_store(root: &Path, settings: &Settings) -> Result<MetadataStore> {
    let source_dir = root.join(&settings.paths.source_dir);
    let build_data_dir = root.join(&settings.paths.build_data_dir);
    MetadataStore::load(&source_dir, &build_data_dir)
        .with_context(|| format!("loading metadata from {}", source_dir.display()))
}
