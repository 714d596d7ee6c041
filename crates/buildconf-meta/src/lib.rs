//! Metadata lexing and entity model for buildconf.
//!
//! A source tree describes itself through small declarative text files:
//! - **Modules** (`info.txt`): files, dependencies, platform constraints
//! - **Architectures**: aliases and submodel patterns
//! - **Compilers**: option conventions and per-processor tuning flags
//! - **Operating systems**: suffixes, archivers, install conventions
//!
//! All four are read by the same record lexer and frozen into typed structs.

pub mod arch;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod macros;
pub mod module;
pub mod os;
pub mod record;
pub mod store;

pub use arch::{ArchInfo, SubmodelMatch, SubmodelPattern};
pub use compiler::{CompilerInfo, MachOpt};
pub use error::{MetaError, Result};
pub use module::{LibraryScope, ModuleInfo};
pub use os::OsInfo;
pub use record::{Record, Schema};
pub use store::MetadataStore;
