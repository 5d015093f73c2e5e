//! Bundle orchestration.
//!
//! [`Bundler`] looks up a packager in the registry, runs its setup and build
//! phases in order and collects size and checksum metadata for the produced
//! packages.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_bff::bundler::{BundleFile, Bundler, Settings};
//! use std::path::Path;
//!
//! # async fn example() -> kodegen_bundler_bff::bundler::Result<()> {
//! let settings = Settings::from(BundleFile::load(Path::new("hamlet.toml"))?);
//! let artifact = Bundler::new(settings).bundle("bff").await?;
//!
//! println!("Created {} ({} bytes)", artifact.paths[0].display(), artifact.size);
//! println!("SHA256: {}", artifact.checksum);
//! # Ok(())
//! # }
//! ```

use crate::bail;
use crate::bundler::{
    BundledArtifact, Result, Settings,
    error::ErrorExt,
    packager::{PackagerContext, PackagerRegistry},
    runner::{CommandRunner, SystemRunner},
};
use crate::logger::Logger;
use std::{path::Path, sync::Arc};

/// Main bundler orchestrator.
pub struct Bundler {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    logger: Logger,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl Bundler {
    /// Bundler running tools as child processes.
    pub fn new(settings: Settings) -> Self {
        Self::with_runner(settings, Arc::new(SystemRunner))
    }

    /// Bundler running tools through `runner`.
    pub fn with_runner(settings: Settings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            logger: Logger::new("Bundler"),
        }
    }

    /// Replace the root logger. Packagers log through children of it.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build a package with the packager registered as `id`.
    ///
    /// On failure the packager's staging directory is left in place.
    pub async fn bundle(&self, id: &str) -> Result<BundledArtifact> {
        let factory = PackagerRegistry::global().lookup(id)?;
        let mut packager = factory(PackagerContext {
            project: self.settings.project().clone(),
            config: self.settings.config().clone(),
            runner: Arc::clone(&self.runner),
            logger: self.logger.clone(),
        });

        self.logger.info(format_args!(
            "Building {} in {}",
            packager.package_name(),
            packager.staging_dir().display()
        ));

        packager.setup().await?;
        let paths = packager.build().await?;

        let mut size = 0u64;
        for p in &paths {
            let metadata = tokio::fs::metadata(p)
                .await
                .fs_context("reading artifact metadata", p)?;
            size += metadata.len();
        }

        let checksum = if let Some(first_path) = paths.first() {
            calculate_sha256(first_path).await?
        } else {
            bail!(
                "{} produced no packages in {}",
                id,
                packager.staging_dir().display()
            );
        };

        Ok(BundledArtifact {
            packager: packager.id(),
            package_name: packager.package_name(),
            paths,
            size,
            checksum,
        })
    }
}

/// Hex-encoded SHA-256 of a file, read in 8KB chunks.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
