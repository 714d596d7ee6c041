//! `buildconf configure`: resolve a target and generate the build files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use buildconf_meta::{CompilerInfo, MetadataStore, OsInfo};
use buildconf_resolve::{
    choose_modules, compose, discover_check_sources, discover_doc_files, resolve_target,
    BuildConfig, BuildHost, ComposeInput, HostProbe, InstallOverrides, ProjectInfo,
    TargetRequest, VariableSet,
};
use tracing::{debug, info};

use crate::host::host_os;
use crate::settings::Settings;

/// Build directory used when none is given.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Options of `buildconf configure`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigureArgs {
    /// Compiler to build with (default from settings, else gcc)
    #[arg(long)]
    pub cc: Option<String>,
    /// Target operating system (default: the running OS)
    #[arg(long)]
    pub os: Option<String>,
    /// Target processor (autodetected when omitted)
    #[arg(long)]
    pub cpu: Option<String>,
    /// Set up the build in DIR
    #[arg(long = "with-build-dir", value_name = "DIR")]
    pub build_dir: Option<PathBuf>,
    /// Paste the contents of FILE into build.h
    #[arg(long = "with-local-config", value_name = "FILE")]
    pub local_config: Option<PathBuf>,
    /// Base installation directory
    #[arg(long)]
    pub prefix: Option<String>,
    /// Library installation directory
    #[arg(long)]
    pub libdir: Option<String>,
    /// Header installation directory
    #[arg(long)]
    pub includedir: Option<String>,
    /// Documentation installation directory
    #[arg(long)]
    pub docdir: Option<String>,
    /// Print the template variables as JSON instead of writing files
    #[arg(long)]
    pub dump_vars: bool,
}

/// A template and the file it expands into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// Everything decided before any file is touched.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub vars: VariableSet,
    pub build: BuildConfig,
    pub artifacts: Vec<Artifact>,
    /// One-line description of the resolved target.
    pub summary: String,
}

/// Run the configure step for the source tree at `root`.
pub fn run(
    root: &Path,
    settings: &Settings,
    args: &ConfigureArgs,
    probe: &HostProbe,
    host: &BuildHost,
) -> Result<()> {
    let store = super::load_store(root, settings)?;
    let config = configure(root, settings, &store, args, probe, host)?;

    if args.dump_vars {
        println!("{}", serde_json::to_string_pretty(&config.vars)?);
        return Ok(());
    }

    let rendered = render(&config)?;
    write_outputs(&config.build, &rendered)?;

    println!("Configured {}", config.summary);
    for (path, _) in &rendered {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

/// Resolve the target, select modules and compose the variable set.
pub fn configure(
    root: &Path,
    settings: &Settings,
    store: &MetadataStore,
    args: &ConfigureArgs,
    probe: &HostProbe,
    host: &BuildHost,
) -> Result<Configuration> {
    let request = TargetRequest {
        compiler: args.cc.as_deref().unwrap_or(&settings.defaults.compiler),
        os: args.os.as_deref().unwrap_or_else(|| host_os()),
        cpu: args.cpu.as_deref(),
    };
    let target = resolve_target(store, &request, probe)?;
    let modules = choose_modules(store, &target.criteria());
    info!(count = modules.len(), "modules selected");

    let project = settings.project_info();
    let paths = &settings.paths;
    let build_dir = root.join(args.build_dir.as_deref().unwrap_or(Path::new(DEFAULT_BUILD_DIR)));

    let check_sources = discover_check_sources(&root.join(&paths.checks_dir))?;
    let build = BuildConfig::new(&build_dir, &project.name, &modules, check_sources);

    let doc_dir = root.join(&paths.doc_dir);
    let doc_files = discover_doc_files(&doc_dir);

    let local_config = match &args.local_config {
        Some(path) => {
            let path = root.join(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("reading local config {}", path.display()))?
        }
        None => String::new(),
    };

    let install = InstallOverrides {
        prefix: args.prefix.clone(),
        libdir: args.libdir.clone(),
        includedir: args.includedir.clone(),
        docdir: args.docdir.clone(),
    };

    let vars = compose(&ComposeInput {
        project: &project,
        host,
        install: &install,
        target: &target,
        modules: &modules,
        build: &build,
        doc_files: &doc_files,
        doc_src_dir: &doc_dir.display().to_string(),
        local_config: &local_config,
    });
    debug!(count = vars.len(), "template variables composed");

    let artifacts = plan_artifacts(
        root,
        &root.join(&paths.build_data_dir),
        &build_dir,
        &project,
        target.compiler,
        target.os,
    );

    let summary = format!(
        "{} modules for {}/{} ({}) with {}",
        modules.len(),
        target.arch.name,
        target.submodel,
        target.os.name,
        target.compiler.name,
    );

    Ok(Configuration {
        vars,
        build,
        artifacts,
        summary,
    })
}

/// The templates to expand and where each result goes.
pub fn plan_artifacts(
    root: &Path,
    build_data_dir: &Path,
    build_dir: &Path,
    project: &ProjectInfo,
    compiler: &CompilerInfo,
    os: &OsInfo,
) -> Vec<Artifact> {
    let makefile = if compiler.makefile_style == "nmake" {
        "nmake.in"
    } else if os.builds_shared() {
        "unix_shr.in"
    } else {
        "unix.in"
    };

    let config_script = project.config_script();
    vec![
        Artifact {
            template: build_data_dir.join("makefile").join(makefile),
            output: root.join("Makefile"),
        },
        Artifact {
            template: build_data_dir.join("buildh.in"),
            output: build_dir.join("build.h"),
        },
        Artifact {
            template: build_data_dir.join(format!("{config_script}.in")),
            output: build_dir.join(&config_script),
        },
        Artifact {
            template: build_data_dir.join(format!("{}.pc.in", project.name)),
            output: build_dir.join(project.pkgconfig_file()),
        },
    ]
}

/// Expand every artifact's template. Nothing is written.
pub fn render(config: &Configuration) -> Result<Vec<(PathBuf, String)>> {
    let mut rendered = Vec::with_capacity(config.artifacts.len());
    for artifact in &config.artifacts {
        let text = buildconf_template::process_template(&artifact.template, config.vars.as_map())
            .with_context(|| format!("generating {}", artifact.output.display()))?;
        rendered.push((artifact.output.clone(), text));
    }
    Ok(rendered)
}

/// Create the build tree and write the rendered files.
pub fn write_outputs(build: &BuildConfig, rendered: &[(PathBuf, String)]) -> Result<()> {
    for dir in [&build.libobj_dir, &build.checkobj_dir, &build.full_include_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for (path, text) in rendered {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectInfo {
        Settings::default().project_info()
    }

    #[test]
    fn makefile_template_by_style() {
        let gcc = CompilerInfo::parse("", Path::new("cc/gcc")).unwrap();
        let msvc = CompilerInfo::parse("makefile_style nmake", Path::new("cc/msvc")).unwrap();
        let linux = OsInfo::parse("<supports_shared>\nall\n</supports_shared>", Path::new("os/linux")).unwrap();
        let bare = OsInfo::parse("", Path::new("os/bare")).unwrap();
        let data = Path::new("src/build-data");
        let out = Path::new("build");
        let root = Path::new("");

        let pick = |cc: &CompilerInfo, os: &OsInfo| {
            plan_artifacts(root, data, out, &project(), cc, os)[0].template.clone()
        };
        assert_eq!(pick(&gcc, &linux), data.join("makefile/unix_shr.in"));
        assert_eq!(pick(&gcc, &bare), data.join("makefile/unix.in"));
        assert_eq!(pick(&msvc, &linux), data.join("makefile/nmake.in"));
    }

    #[test]
    fn artifact_outputs() {
        let gcc = CompilerInfo::parse("", Path::new("cc/gcc")).unwrap();
        let linux = OsInfo::parse("", Path::new("os/linux")).unwrap();
        let artifacts = plan_artifacts(
            Path::new(""),
            Path::new("src/build-data"),
            Path::new("build"),
            &project(),
            &gcc,
            &linux,
        );
        let outputs: Vec<&Path> = artifacts.iter().map(|a| a.output.as_path()).collect();
        assert_eq!(
            outputs,
            vec![
                Path::new("Makefile"),
                Path::new("build/build.h"),
                Path::new("build/botan-config"),
                Path::new("build/botan-1.8.pc"),
            ]
        );
        assert_eq!(artifacts[2].template, Path::new("src/build-data/botan-config.in"));
        assert_eq!(artifacts[3].template, Path::new("src/build-data/botan.pc.in"));
    }
}
