//! AIX installp (.bff) packager pipeline.
//!
//! Stages a prepared install tree into a scratch directory, renders the
//! `mkinstallp` control file listing every staged path and maintainer
//! script, runs `mkinstallp` against the staging directory while streaming
//! its output into the log, and copies the produced `.bff` files into the
//! package directory.
//!
//! # Configuration
//!
//! Bundling is configured via a TOML bundle file:
//!
//! ```toml
//! [project]
//! name = "hamlet"
//! install_dir = "/opt/hamlet"
//! build_version = "12.3.4-rc1"
//! build_iteration = 2
//!
//! [config]
//! package_dir = "pkg"
//! ```
//!
//! # Pipeline
//!
//! | Phase | Work |
//! |-------|------|
//! | setup | sync install tree, stage `preinst`/`postinst`/`prerm`/`postrm` |
//! | build | render `gen.template`, run `mkinstallp`, collect `tmp/*.bff` |
//!
//! A failed build leaves the staging directory in place for inspection.

#![warn(missing_docs)]

mod builder;
mod error;
pub mod manifest;
pub mod packager;
pub(crate) mod platform;
pub mod runner;
mod sanitize;
pub mod scripts;
mod settings;
mod utils;

// Public re-exports
pub use builder::{Bundler, calculate_sha256};
pub use error::{Context, Error, ErrorExt, Result};
pub use packager::{PackageIdentity, Packager, PackagerContext, PackagerFactory, PackagerRegistry};
pub use platform::aix::BffPackager;
pub use runner::{CommandOutput, CommandRunner, ShellCommand, SystemRunner};
pub use sanitize::{derive_version, safe_name};
pub use settings::{Arch, BundleFile, Config, DEFAULT_TOOL, Project, Settings, SettingsBuilder};

/// A package produced by [`Bundler::bundle`].
///
/// # Fields
///
/// - `packager`: identifier of the packager that built it
/// - `package_name`: the package name the packager computed
/// - `paths`: files copied into the package directory
/// - `size`: total size of `paths` in bytes
/// - `checksum`: SHA-256 of the first path
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Packager identifier, e.g. `bff`.
    pub packager: &'static str,

    /// Expected package file name, `<name>.<version>.<arch>.bff`.
    pub package_name: String,

    /// Paths to all files created as part of this bundle.
    pub paths: Vec<std::path::PathBuf>,

    /// Total size of all artifacts in bytes.
    pub size: u64,

    /// SHA-256 checksum of the main artifact for integrity verification.
    pub checksum: String,
}
