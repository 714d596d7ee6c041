//! Compiler descriptions (`build-data/cc/*`).

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MetaError, Result};
use crate::lexer;
use crate::record::{Record, Schema, TABLE_SEPARATOR};

/// Fields of a compiler description.
pub const COMPILER_SCHEMA: Schema = Schema {
    groups: &["so_link_flags", "mach_opt", "mach_abi_linking"],
    scalars: &[
        ("realname", Some("<UNKNOWN>")),
        ("binary_name", None),
        ("compile_option", Some("-c ")),
        ("output_to_option", Some("-o ")),
        ("add_include_dir_option", Some("-I")),
        ("add_lib_dir_option", Some("-L")),
        ("add_lib_option", Some("-l")),
        ("lib_opt_flags", Some("")),
        ("check_opt_flags", Some("")),
        ("debug_flags", Some("")),
        ("no_debug_flags", Some("")),
        ("shared_flags", Some("")),
        ("lang_flags", Some("")),
        ("warning_flags", Some("")),
        ("dll_import_flags", Some("")),
        ("dll_export_flags", Some("")),
        ("ar_command", None),
        ("makefile_style", Some("")),
        ("compiler_has_tr1", Some("false")),
    ],
};

/// Marker in a `mach_opt` flag string replaced by the submodel name.
pub const SUBMODEL_MARKER: &str = "SUBMODEL";

/// One `mach_opt` entry: flags for a submodel or architecture family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachOpt {
    /// Flag string, possibly containing [`SUBMODEL_MARKER`].
    pub flags: String,
    /// Text removed from the submodel name before substitution.
    pub strip: String,
}

impl MachOpt {
    /// Render the flags for `submodel`.
    pub fn render(&self, submodel: &str) -> String {
        let name = if self.strip.is_empty() {
            submodel.to_string()
        } else {
            submodel.replace(&self.strip, "")
        };
        self.flags.replace(SUBMODEL_MARKER, &name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MachOptState {
    Name,
    Separator,
    Flags,
    Strip,
}

/// Parse a `mach_opt` group: `name -> flags [strip] name -> flags [strip] ...`.
///
/// The optional third field is present when at least one token follows the
/// flags and the token after it is not a separator (which would mean the
/// next entry has already begun).
pub fn parse_mach_opt(tokens: &[String], file: &Path, line: usize) -> Result<BTreeMap<String, MachOpt>> {
    let error = |detail: String| MetaError::Parse {
        file: file.to_path_buf(),
        line,
        detail,
    };

    let mut table = BTreeMap::new();
    let mut state = MachOptState::Name;
    let mut name = String::new();
    let mut flags = String::new();
    let mut pos = 0;

    loop {
        match state {
            MachOptState::Name => match tokens.get(pos) {
                None => break,
                Some(token) => {
                    name = token.clone();
                    pos += 1;
                    state = MachOptState::Separator;
                }
            },
            MachOptState::Separator => match tokens.get(pos) {
                Some(token) if token == TABLE_SEPARATOR => {
                    pos += 1;
                    state = MachOptState::Flags;
                }
                Some(token) => {
                    return Err(error(format!(
                        "expected \"{TABLE_SEPARATOR}\" after mach_opt entry \"{name}\", found \"{token}\""
                    )))
                }
                None => {
                    return Err(error(format!(
                        "mach_opt entry \"{name}\" is missing \"{TABLE_SEPARATOR}\""
                    )))
                }
            },
            MachOptState::Flags => match tokens.get(pos) {
                Some(token) => {
                    flags = token.clone();
                    pos += 1;
                    state = MachOptState::Strip;
                }
                None => {
                    return Err(error(format!("mach_opt entry \"{name}\" has no flags")))
                }
            },
            MachOptState::Strip => {
                let remaining = tokens.len() - pos;
                let has_strip = remaining == 1
                    || (remaining > 1 && tokens[pos + 1] != TABLE_SEPARATOR);
                let strip = if has_strip {
                    pos += 1;
                    tokens[pos - 1].clone()
                } else {
                    String::new()
                };
                table.insert(
                    std::mem::take(&mut name),
                    MachOpt {
                        flags: std::mem::take(&mut flags),
                        strip,
                    },
                );
                state = MachOptState::Name;
            }
        }
    }

    Ok(table)
}

/// A compiler: its command-line conventions and per-target flag tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerInfo {
    /// Canonical name (file name).
    pub name: String,
    /// Human-readable name.
    pub real_name: String,
    /// Executable name.
    pub binary_name: Option<String>,
    /// Option that requests compilation only.
    pub compile_option: String,
    /// Option naming the output file.
    pub output_to_option: String,
    /// Option prefix for include directories.
    pub add_include_dir_option: String,
    /// Option prefix for library directories.
    pub add_lib_dir_option: String,
    /// Option prefix for linked libraries.
    pub add_lib_option: String,
    pub lib_opt_flags: String,
    pub check_opt_flags: String,
    pub debug_flags: String,
    pub no_debug_flags: String,
    pub shared_flags: String,
    pub lang_flags: String,
    pub warning_flags: String,
    pub dll_import_flags: String,
    pub dll_export_flags: String,
    /// Archiver command, overriding the OS default.
    pub ar_command: Option<String>,
    /// Makefile dialect (`unix`, `nmake`).
    pub makefile_style: String,
    /// Whether the compiler ships TR1.
    pub has_tr1: bool,
    /// Shared library link command per OS, with a `default` entry.
    pub so_link_flags: BTreeMap<String, String>,
    /// ABI flags keyed by `all`, OS, architecture or submodel.
    pub mach_abi_linking: BTreeMap<String, String>,
    /// Tuning flags keyed by submodel or architecture family.
    pub mach_opt: BTreeMap<String, MachOpt>,
}

impl CompilerInfo {
    /// Read a compiler description from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_file(path, &COMPILER_SCHEMA)?)
    }

    /// Parse compiler description text.
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        Self::from_record(lexer::lex_str(source, path, &COMPILER_SCHEMA)?)
    }

    /// Build a compiler from a lexed record.
    pub fn from_record(mut record: Record) -> Result<Self> {
        let mach_opt_line = record.group_line("mach_opt");
        let mach_opt = parse_mach_opt(&record.take_group("mach_opt"), record.file(), mach_opt_line)?;

        Ok(Self {
            name: record.name().to_string(),
            real_name: record.text("realname"),
            binary_name: record.optional("binary_name"),
            compile_option: record.text("compile_option"),
            output_to_option: record.text("output_to_option"),
            add_include_dir_option: record.text("add_include_dir_option"),
            add_lib_dir_option: record.text("add_lib_dir_option"),
            add_lib_option: record.text("add_lib_option"),
            lib_opt_flags: record.text("lib_opt_flags"),
            check_opt_flags: record.text("check_opt_flags"),
            debug_flags: record.text("debug_flags"),
            no_debug_flags: record.text("no_debug_flags"),
            shared_flags: record.text("shared_flags"),
            lang_flags: record.text("lang_flags"),
            warning_flags: record.text("warning_flags"),
            dll_import_flags: record.text("dll_import_flags"),
            dll_export_flags: record.text("dll_export_flags"),
            ar_command: record.optional("ar_command"),
            makefile_style: record.text("makefile_style"),
            has_tr1: record.flag("compiler_has_tr1")?,
            so_link_flags: record.take_table("so_link_flags")?,
            mach_abi_linking: record.take_table("mach_abi_linking")?,
            mach_opt,
        })
    }

    /// The executable to invoke, falling back to the canonical name.
    pub fn binary(&self) -> &str {
        self.binary_name.as_deref().unwrap_or(&self.name)
    }

    /// Tuning flags for a processor. An entry for the exact submodel wins
    /// over one for the architecture family.
    pub fn mach_opts(&self, arch: &str, submodel: &str) -> String {
        self.mach_opt
            .get(submodel)
            .or_else(|| self.mach_opt.get(arch))
            .map(|opt| opt.render(submodel))
            .unwrap_or_default()
    }

    /// Shared library link command for `os`, or the `default` entry.
    pub fn so_link_command_for(&self, os: &str) -> Option<&str> {
        self.so_link_flags
            .get(os)
            .or_else(|| self.so_link_flags.get("default"))
            .map(String::as_str)
    }

    /// ABI flags that apply to a target, in `all`, OS, arch, submodel order.
    pub fn mach_abi_link_flags(&self, os: &str, arch: &str, submodel: &str) -> String {
        let mut flags: Vec<&str> = Vec::new();
        for key in ["all", os, arch, submodel] {
            if let Some(value) = self.mach_abi_linking.get(key) {
                if !flags.contains(&value.as_str()) {
                    flags.push(value);
                }
            }
        }
        flags.join(" ")
    }

    /// Preprocessor macros contributed by the compiler.
    pub fn defines(&self) -> Vec<String> {
        if self.has_tr1 {
            vec!["USE_STD_TR1".to_string()]
        } else {
            Vec::new()
        }
    }
}
