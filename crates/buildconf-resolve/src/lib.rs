//! Target resolution and variable composition for buildconf.
//!
//! Given a loaded [`MetadataStore`](buildconf_meta::MetadataStore) this crate:
//! 1. Resolves the requested compiler, OS and processor ([`resolve_target`])
//! 2. Selects the modules usable on that target ([`choose_modules`])
//! 3. Lays out the build's headers, sources and object directories ([`BuildConfig`])
//! 4. Composes the flat variable set templates are expanded against ([`compose`])

pub mod build_config;
pub mod error;
pub mod processor;
pub mod release;
pub mod select;
pub mod target;
pub mod vars;

pub use build_config::{discover_check_sources, discover_doc_files, BuildConfig};
pub use error::{ResolveError, Result};
pub use processor::{autodetect, canonicalize, normalize_processor, HostProbe, Processor};
pub use release::{ProjectInfo, ReleaseVersion};
pub use select::{choose_modules, is_applicable, unmet_requirements, Criteria, Rejection};
pub use target::{find_compiler, find_os, resolve_target, Target, TargetRequest};
pub use vars::{compose, BuildHost, ComposeInput, InstallOverrides, VariableSet};
