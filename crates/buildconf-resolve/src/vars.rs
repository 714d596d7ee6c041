//! Composition of the template variable set.
//!
//! Everything a template can reference is computed here, once, from the
//! resolved target, the selected modules and the build layout. List-valued
//! variables are pre-rendered as makefile continuation blocks or one macro
//! per line.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use buildconf_meta::ModuleInfo;
use serde::Serialize;
use tracing::warn;

use crate::build_config::BuildConfig;
use crate::release::ProjectInfo;
use crate::target::Target;

/// Source suffixes replaced by the object suffix.
const SOURCE_SUFFIXES: [&str; 2] = [".cpp", ".S"];

/// Indentation between entries of a makefile list.
const LIST_INDENT: usize = 16;

/// Flat name → value bindings consumed by the template engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeMap<String, String>);

impl VariableSet {
    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// All bindings, ordered by name.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Iterate over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variables are bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Facts about the machine and invocation doing the configuring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildHost {
    pub user: String,
    pub hostname: String,
    pub timestamp: String,
    /// The configure command line as typed.
    pub command_line: String,
}

/// Installation directories given explicitly; unset ones come from the OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOverrides {
    pub prefix: Option<String>,
    pub libdir: Option<String>,
    pub includedir: Option<String>,
    pub docdir: Option<String>,
}

/// Everything the composer reads.
#[derive(Debug, Clone)]
pub struct ComposeInput<'a> {
    pub project: &'a ProjectInfo,
    pub host: &'a BuildHost,
    pub install: &'a InstallOverrides,
    pub target: &'a Target<'a>,
    /// Modules selected for the build.
    pub modules: &'a [&'a ModuleInfo],
    pub build: &'a BuildConfig,
    /// Documentation files to install.
    pub doc_files: &'a [String],
    /// Documentation source directory.
    pub doc_src_dir: &'a str,
    /// Contents of the local configuration file, pasted into the header.
    pub local_config: &'a str,
}

/// Render macros as `#define <PREFIX>_<MACRO>` lines.
pub fn cpp_macros<S: AsRef<str>>(prefix: &str, macros: &[S]) -> String {
    macros
        .iter()
        .map(|m| format!("#define {prefix}_{}", m.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render items as a makefile list: each entry followed by ` \` and a
/// newline, entries after the first indented.
pub fn makefile_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("{} \\\n", item.as_ref()))
        .collect::<Vec<_>>()
        .join(&" ".repeat(LIST_INDENT))
}

/// Object file path for a source: its file name with the source suffix
/// replaced by `.<obj_suffix>`, placed in `obj_dir`.
pub fn object_file(source: &str, obj_dir: &Path, obj_suffix: &str) -> String {
    let file_name = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let object = SOURCE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .map(|stem| format!("{stem}.{obj_suffix}"))
        .unwrap_or(file_name);

    obj_dir.join(object).to_string_lossy().into_owned()
}

/// External libraries needed on `os`: deduplicated and sorted.
pub fn link_libraries(modules: &[&ModuleInfo], os: &str) -> Vec<String> {
    modules
        .iter()
        .flat_map(|m| m.libraries_for(os))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Makefile rules compiling each source into `obj_dir`. `kind` selects the
/// `$(<kind>_FLAGS)` variable.
pub fn build_commands(
    target: &Target<'_>,
    build: &BuildConfig,
    sources: &[String],
    obj_dir: &Path,
    kind: &str,
) -> Vec<String> {
    let cc = target.compiler;
    sources
        .iter()
        .map(|src| {
            format!(
                "{obj}: {src}\n\t$(CXX) {inc}{include_dir} $({kind}_FLAGS) {compile}$? {output}$@\n",
                obj = object_file(src, obj_dir, &target.os.obj_suffix),
                inc = cc.add_include_dir_option,
                include_dir = build.include_dir.display(),
                compile = cc.compile_option,
                output = cc.output_to_option,
            )
        })
        .collect()
}

/// Compose the full variable set.
pub fn compose(input: &ComposeInput<'_>) -> VariableSet {
    let ComposeInput {
        project,
        host,
        install,
        target,
        modules,
        build,
        ..
    } = input;
    let cc = target.compiler;
    let os = target.os;
    let arch = target.arch;
    let submodel = target.submodel.as_str();
    let prefix = project.macro_prefix.as_str();

    let so_link = cc.so_link_command_for(&os.name).unwrap_or_else(|| {
        warn!(compiler = %cc.name, os = %os.name, "no shared library link command");
        ""
    });

    let link_to = link_libraries(modules, &os.name)
        .iter()
        .map(|lib| format!("{}{lib}", cc.add_lib_option))
        .collect::<Vec<_>>()
        .join(" ");

    let module_macros: Vec<String> = modules
        .iter()
        .filter_map(|m| m.define.as_deref())
        .map(|define| format!("HAS_{define}"))
        .collect();

    let objects = |sources: &[String], dir: &Path| {
        makefile_list(sources.iter().map(|s| object_file(s, dir, &os.obj_suffix)))
    };

    let mut doc_files = input.doc_files.to_vec();
    doc_files.sort();

    let mut mod_list: Vec<String> = modules
        .iter()
        .map(|m| format!("{} ({})", m.name, m.real_name))
        .collect();
    mod_list.sort();

    let mp_bits = modules.iter().map(|m| m.mp_bits).max().unwrap_or(0);

    let version = &project.version;
    let vars = [
        ("version_major", version.major.to_string()),
        ("version_minor", version.minor.to_string()),
        ("version_patch", version.patch.to_string()),
        ("version", version.version_string()),
        ("so_version", version.so_version_string()),
        ("timestamp", host.timestamp.clone()),
        ("user", host.user.clone()),
        ("hostname", host.hostname.clone()),
        ("command_line", host.command_line.clone()),
        ("local_config", input.local_config.to_string()),
        ("prefix", override_or(&install.prefix, &os.install_root)),
        ("libdir", override_or(&install.libdir, &os.lib_dir)),
        ("includedir", override_or(&install.includedir, &os.header_dir)),
        ("docdir", override_or(&install.docdir, &os.doc_dir)),
        ("doc_src_dir", input.doc_src_dir.to_string()),
        ("build_dir", build.build_dir.display().to_string()),
        ("os", os.name.clone()),
        ("arch", arch.name.clone()),
        ("submodel", submodel.to_string()),
        ("cc", cc.binary().to_string()),
        ("lib_opt", cc.lib_opt_flags.clone()),
        ("mach_opt", cc.mach_opts(&arch.name, submodel)),
        ("mach_abi_link_flags", cc.mach_abi_link_flags(&os.name, &arch.name, submodel)),
        ("check_opt", cc.check_opt_flags.clone()),
        ("lang_flags", cc.lang_flags.clone()),
        ("warn_flags", cc.warning_flags.clone()),
        ("shared_flags", cc.shared_flags.clone()),
        ("dll_import_flags", cc.dll_import_flags.clone()),
        ("dll_export_flags", cc.dll_export_flags.clone()),
        ("so_link", so_link.to_string()),
        ("link_to", link_to),
        ("module_defines", cpp_macros(prefix, &module_macros)),
        ("target_os_defines", cpp_macros(prefix, &os.defines())),
        ("target_cpu_defines", cpp_macros(prefix, &arch.defines(submodel))),
        ("target_compiler_defines", cpp_macros(prefix, &cc.defines())),
        ("include_files", makefile_list(&build.headers)),
        ("lib_objs", objects(build.sources.as_slice(), build.libobj_dir.as_path())),
        ("check_objs", objects(build.check_sources.as_slice(), build.checkobj_dir.as_path())),
        ("lib_prefix", build.libobj_dir.display().to_string()),
        ("check_prefix", build.checkobj_dir.display().to_string()),
        (
            "lib_build_cmds",
            build_commands(target, build, &build.sources, &build.libobj_dir, "LIB").join("\n"),
        ),
        (
            "check_build_cmds",
            build_commands(target, build, &build.check_sources, &build.checkobj_dir, "CHECK")
                .join("\n"),
        ),
        (
            "ar_command",
            cc.ar_command.clone().unwrap_or_else(|| os.ar_command.clone()),
        ),
        ("ranlib_command", os.ranlib_command().to_string()),
        ("install_cmd_exec", os.install_cmd_exec.clone()),
        ("install_cmd_data", os.install_cmd_data.clone()),
        ("static_suffix", os.static_suffix.clone()),
        ("so_suffix", os.so_suffix.clone()),
        ("obj_suffix", os.obj_suffix.clone()),
        ("botan_config", project.config_script()),
        ("botan_pkgconfig", project.pkgconfig_file()),
        ("doc_files", makefile_list(&doc_files)),
        ("mod_list", mod_list.join("\n")),
        ("mp_bits", mp_bits.to_string()),
    ];

    VariableSet(
        vars.into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

fn override_or(explicit: &Option<String>, default: &str) -> String {
    explicit.clone().unwrap_or_else(|| default.to_string())
}
