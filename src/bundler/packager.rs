//! The packager abstraction and its registry.
//!
//! A packager turns a prepared install tree into native package files in two
//! strictly ordered phases: [`Packager::setup`] stages the tree and
//! [`Packager::build`] produces the packages. Implementations are looked up
//! by identifier in [`PackagerRegistry`], a table built once on first use
//! and read-only afterwards.

use crate::bundler::{
    Error, Result,
    platform::aix::BffPackager,
    runner::CommandRunner,
    settings::{Config, Project},
};
use crate::logger::Logger;
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

/// Everything a packager needs from its environment.
#[derive(Clone)]
pub struct PackagerContext {
    /// Project being packaged.
    pub project: Project,
    /// Packaging configuration.
    pub config: Config,
    /// Executes external tools.
    pub runner: Arc<dyn CommandRunner>,
    /// Parent logger; packagers log through a scoped child.
    pub logger: Logger,
}

/// Name, version and architecture of the package being built.
///
/// Derived once when the packager is created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackageIdentity {
    /// Packager identifier.
    pub id: &'static str,
    /// Sanitized package name.
    pub name: String,
    /// Derived package version.
    pub version: String,
    /// Target architecture.
    pub arch: String,
}

impl std::fmt::Debug for PackagerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagerContext")
            .field("project", &self.project)
            .field("config", &self.config)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

/// A native package format backend.
#[async_trait]
pub trait Packager: Send {
    /// Registry identifier, e.g. `bff`.
    fn id(&self) -> &'static str;

    /// Name, version and architecture of the package.
    fn identity(&self) -> &PackageIdentity;

    /// File name of the package this build produces.
    fn package_name(&self) -> String;

    /// Scratch directory holding the staged tree.
    fn staging_dir(&self) -> &Path;

    /// Stage the install tree and supporting files.
    async fn setup(&mut self) -> Result<()>;

    /// Produce packages from the staged tree.
    ///
    /// Returns the paths of the files copied into the package directory.
    /// Fails with [`Error::SetupRequired`] when [`Packager::setup`] has not
    /// completed.
    async fn build(&mut self) -> Result<Vec<PathBuf>>;
}

/// Constructor stored in the registry.
pub type PackagerFactory = fn(PackagerContext) -> Box<dyn Packager>;

/// Identifier to constructor table.
#[derive(Debug)]
pub struct PackagerRegistry {
    factories: BTreeMap<&'static str, PackagerFactory>,
}

fn bff(ctx: PackagerContext) -> Box<dyn Packager> {
    Box::new(BffPackager::new(ctx))
}

static REGISTRY: LazyLock<PackagerRegistry> = LazyLock::new(|| {
    let mut factories: BTreeMap<&'static str, PackagerFactory> = BTreeMap::new();
    factories.insert(BffPackager::ID, bff);
    PackagerRegistry { factories }
});

impl PackagerRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static PackagerRegistry {
        &REGISTRY
    }

    /// Constructor registered under `id`.
    pub fn lookup(&self, id: &str) -> Result<PackagerFactory> {
        self.factories
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownPackager {
                id: id.to_string(),
                available: self.ids().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bff_is_registered() {
        let registry = PackagerRegistry::global();
        assert!(registry.lookup("bff").is_ok());
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["bff"]);
    }

    #[test]
    fn test_unknown_packager_lists_available() {
        let err = PackagerRegistry::global().lookup("rpm").err().unwrap();
        assert_eq!(err.to_string(), "unknown packager 'rpm' (available: bff)");
    }
}
