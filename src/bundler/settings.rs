//! Configuration structures for packaging operations.
//!
//! A build is described by two parts:
//!
//! - [`Project`]: what is being packaged (install tree, name, version, scripts)
//! - [`Config`]: where and how it is packaged (output directory, staging
//!   root, tool path, privilege elevation)
//!
//! Both deserialize from a TOML bundle file:
//!
//! ```toml
//! [project]
//! name = "Hamlet Server"
//! install_dir = "/opt/hamlet"
//! build_version = "12.3.4-rc1"
//! build_iteration = 2
//! friendly_name = "Hamlet"
//! description = "To be, or not to be"
//! package_scripts_path = "package-scripts/hamlet"
//! exclusions = ["**/.git", "docs/*.md"]
//!
//! [config]
//! package_dir = "pkg"
//! use_sudo = true
//! ```

use crate::bundler::{Context, ErrorExt, Result};
use crate::logger::Severity;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the AIX `mkinstallp` binary.
pub const DEFAULT_TOOL: &str = "/usr/sbin/mkinstallp";

/// CPU architecture the package is built for.
///
/// Detected from the host unless [`Config::architecture`] overrides it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arch {
    /// 64-bit POWER, the usual AIX target
    Ppc64,
    /// 32-bit POWER
    Ppc,
    /// x86_64 / AMD64
    X86_64,
    /// AArch64 / ARM64
    AArch64,
    /// Anything else, by its Rust name
    Other(&'static str),
}

impl Arch {
    /// Architecture of the running host.
    pub fn host() -> Self {
        Self::from_rust_arch(std::env::consts::ARCH)
    }

    /// Map a Rust `target_arch` name.
    pub fn from_rust_arch(arch: &'static str) -> Self {
        match arch {
            "powerpc64" => Arch::Ppc64,
            "powerpc" => Arch::Ppc,
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::AArch64,
            other => Arch::Other(other),
        }
    }

    /// Name used in package file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Ppc64 => "ppc64",
            Arch::Ppc => "ppc",
            Arch::X86_64 => "x86_64",
            Arch::AArch64 => "aarch64",
            Arch::Other(name) => *name,
        }
    }
}

/// Metadata of the project being packaged.
#[derive(Clone, Debug, Deserialize)]
pub struct Project {
    /// Raw package name; sanitized before use.
    pub name: String,

    /// Absolute directory the project is installed into, e.g. `/opt/hamlet`.
    pub install_dir: PathBuf,

    /// Free-form build version, e.g. `12.3.4-rc1` or `1.2.0+20240101`.
    pub build_version: String,

    /// Release sequence number appended to the derived version.
    #[serde(default = "default_build_iteration")]
    pub build_iteration: u32,

    /// Human readable name.
    #[serde(default)]
    pub friendly_name: String,

    /// Package description.
    #[serde(default)]
    pub description: String,

    /// Directory holding `preinst`, `postinst`, `prerm`, `postrm`.
    #[serde(default = "default_package_scripts_path")]
    pub package_scripts_path: PathBuf,

    /// Glob patterns, relative to `install_dir`, left out of the package.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

fn default_build_iteration() -> u32 {
    1
}

fn default_package_scripts_path() -> PathBuf {
    PathBuf::from("package-scripts")
}

/// Where and how packages are produced.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory finished packages are copied into.
    pub package_dir: PathBuf,

    /// Parent of per-build staging directories.
    pub staging_root: PathBuf,

    /// Run the packaging tool through `sudo`. `mkinstallp` requires root.
    pub use_sudo: bool,

    /// Path to the packaging tool.
    pub tool: PathBuf,

    /// Handlebars template replacing the built-in control template.
    pub manifest_template: Option<PathBuf>,

    /// Architecture override, e.g. `ppc64`.
    pub architecture: Option<String>,

    /// Severity tool output is logged at.
    pub output_level: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_dir: PathBuf::from("pkg"),
            staging_root: std::env::temp_dir(),
            use_sudo: true,
            tool: PathBuf::from(DEFAULT_TOOL),
            manifest_template: None,
            architecture: None,
            output_level: Severity::Debug,
        }
    }
}

impl Config {
    /// Architecture string used in the package name.
    pub fn architecture(&self) -> String {
        self.architecture
            .clone()
            .unwrap_or_else(|| Arch::host().as_str().to_string())
    }
}

/// On-disk bundle description: a `[project]` table and optional `[config]`.
#[derive(Clone, Debug, Deserialize)]
pub struct BundleFile {
    /// Project metadata.
    pub project: Project,
    /// Packaging configuration.
    #[serde(default)]
    pub config: Config,
}

impl BundleFile {
    /// Parse a bundle description from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a bundle description.
    ///
    /// Relative `package_scripts_path` values are resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).fs_context("reading bundle file", path)?;
        let mut bundle =
            Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))?;
        if let Some(base) = path.parent()
            && bundle.project.package_scripts_path.is_relative()
        {
            bundle.project.package_scripts_path = base.join(&bundle.project.package_scripts_path);
        }
        Ok(bundle)
    }
}

/// Complete settings for one packaging run.
#[derive(Clone, Debug)]
pub struct Settings {
    project: Project,
    config: Config,
}

impl Settings {
    /// Project metadata.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Packaging configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Split into parts.
    pub fn into_parts(self) -> (Project, Config) {
        (self.project, self.config)
    }
}

impl From<BundleFile> for Settings {
    fn from(bundle: BundleFile) -> Self {
        Self {
            project: bundle.project,
            config: bundle.config,
        }
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    project: Option<Project>,
    config: Config,
}

impl SettingsBuilder {
    /// Start with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project.
    pub fn project(mut self, project: Project) -> Self {
        self.project = Some(project);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the package output directory.
    pub fn package_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.package_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the staging root.
    pub fn staging_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.staging_root = path.as_ref().to_path_buf();
        self
    }

    /// Enable or disable `sudo`.
    pub fn use_sudo(mut self, use_sudo: bool) -> Self {
        self.config.use_sudo = use_sudo;
        self
    }

    /// Override the architecture.
    pub fn architecture(mut self, arch: impl Into<String>) -> Self {
        self.config.architecture = Some(arch.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> Result<Settings> {
        let project = self
            .project
            .ok_or_else(|| crate::bundler::Error::GenericError("project metadata is required".into()))?;
        Ok(Settings {
            project,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
[project]
name = "Hamlet Server"
install_dir = "/opt/hamlet"
build_version = "12.3.4-rc1"
build_iteration = 2
friendly_name = "Hamlet"
description = "To be, or not to be"
exclusions = ["**/.git"]

[config]
package_dir = "out"
use_sudo = false
output_level = "info"
"#;

    #[test]
    fn test_parse_bundle_file() {
        let bundle = BundleFile::parse(BUNDLE).unwrap();
        assert_eq!(bundle.project.name, "Hamlet Server");
        assert_eq!(bundle.project.install_dir, PathBuf::from("/opt/hamlet"));
        assert_eq!(bundle.project.build_iteration, 2);
        assert_eq!(bundle.project.exclusions, vec!["**/.git".to_string()]);
        assert_eq!(bundle.config.package_dir, PathBuf::from("out"));
        assert!(!bundle.config.use_sudo);
        assert_eq!(bundle.config.output_level, Severity::Info);
        assert_eq!(bundle.config.tool, PathBuf::from(DEFAULT_TOOL));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let bundle = BundleFile::parse(
            "[project]\nname = \"x\"\ninstall_dir = \"/opt/x\"\nbuild_version = \"1.0\"\n",
        )
        .unwrap();
        assert!(bundle.config.use_sudo);
        assert_eq!(bundle.project.build_iteration, 1);
        assert_eq!(bundle.config.output_level, Severity::Debug);
    }

    #[test]
    fn test_invalid_output_level_rejected() {
        let text = format!("{BUNDLE}\n").replace("\"info\"", "\"loud\"");
        assert!(BundleFile::parse(&text).is_err());
    }

    #[test]
    fn test_load_resolves_scripts_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.toml");
        std::fs::write(&path, BUNDLE).unwrap();

        let bundle = BundleFile::load(&path).unwrap();
        assert_eq!(
            bundle.project.package_scripts_path,
            dir.path().join("package-scripts")
        );
    }

    #[test]
    fn test_arch_mapping() {
        assert_eq!(Arch::from_rust_arch("powerpc64").as_str(), "ppc64");
        assert_eq!(Arch::from_rust_arch("x86_64").as_str(), "x86_64");
        assert_eq!(Arch::from_rust_arch("s390x").as_str(), "s390x");
    }

    #[test]
    fn test_builder_requires_project() {
        assert!(SettingsBuilder::new().build().is_err());
    }
}
