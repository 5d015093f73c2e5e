//! installp package (.bff) bundler.
//!
//! Stages the install tree under a fresh scratch directory, writes the
//! `mkinstallp` control file and runs `mkinstallp` against the staging
//! directory. `mkinstallp` requires root, so it runs through `sudo` unless
//! disabled in the configuration.

use crate::bundler::{
    error::{Error, Result},
    manifest::{ManifestData, ManifestRenderer, StagingTree},
    packager::{PackageIdentity, Packager, PackagerContext},
    runner::{ShellCommand, invoke_tool},
    sanitize::{derive_version, safe_name},
    scripts::{ScriptMap, stage_scripts},
    utils::fs,
};
use crate::logger::{Logger, LiveStreams};
use async_trait::async_trait;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// Scripts live here, relative to the install directory.
const SCRIPTS_SUBDIR: &str = "embedded/share/installp";

/// Builds AIX installp packages with `mkinstallp`.
pub struct BffPackager {
    ctx: PackagerContext,
    identity: PackageIdentity,
    staging_dir: PathBuf,
    logger: Logger,
    streams: LiveStreams,
    /// Set once `setup` has completed.
    scripts: Option<ScriptMap>,
}

impl BffPackager {
    /// Registry identifier.
    pub const ID: &'static str = "bff";

    /// Component name used in log lines.
    pub const LOG_KEY: &'static str = "Packager: BFF";

    /// Create a packager with a fresh, not yet created, staging directory.
    pub fn new(ctx: PackagerContext) -> Self {
        let logger = ctx.logger.scoped(Self::LOG_KEY);
        let project = &ctx.project;

        let name = safe_name(&project.name);
        if let Cow::Owned(converted) = &name {
            logger.warn(format_args!(
                "BFF package names may only contain lowercase letters (a-z), digits (0-9), \
                 dots (.), plus signs (+) and dashes (-). Converting `{}' to `{}'.",
                project.name, converted
            ));
        }

        let identity = PackageIdentity {
            id: Self::ID,
            name: name.into_owned(),
            version: derive_version(&project.build_version, project.build_iteration),
            arch: ctx.config.architecture(),
        };
        let staging_dir = ctx
            .config
            .staging_root
            .join(format!("{}-{}", Self::ID, Uuid::new_v4()));

        Self {
            streams: LiveStreams::new(logger.clone()),
            ctx,
            identity,
            staging_dir,
            logger,
            scripts: None,
        }
    }

    /// Where maintainer scripts end up on the installed system.
    pub fn scripts_install_dir(&self) -> PathBuf {
        self.ctx.project.install_dir.join(SCRIPTS_SUBDIR)
    }

    /// Where maintainer scripts are staged.
    pub fn scripts_staging_dir(&self) -> PathBuf {
        fs::rebase(&self.staging_dir, &self.scripts_install_dir())
    }

    /// Path of the rendered control file.
    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir.join(crate::bundler::manifest::MANIFEST_FILE_NAME)
    }

    /// The configured tool, or `mkinstallp` from `PATH` when the configured
    /// path does not exist.
    fn resolve_tool(&self) -> PathBuf {
        let tool = &self.ctx.config.tool;
        if tool.exists() {
            return tool.clone();
        }
        let name = tool.file_name().unwrap_or(tool.as_os_str());
        match which::which(name) {
            Ok(found) => {
                self.logger
                    .debug(format_args!("Using {} from PATH", found.display()));
                found
            }
            Err(_) => tool.clone(),
        }
    }

    fn write_manifest(&self, scripts: &ScriptMap) -> Result<PathBuf> {
        let project = &self.ctx.project;
        let tree = StagingTree::scan(&self.staging_dir)?;
        let data = ManifestData::new(
            &self.identity.name,
            &project.install_dir,
            &project.friendly_name,
            &self.identity.version,
            &project.description,
            &tree,
            scripts,
        );
        let renderer = ManifestRenderer::new(self.ctx.config.manifest_template.as_deref())?;
        let path = renderer.write(&data, &self.staging_dir)?;
        self.logger.debug(format_args!(
            "Wrote {} ({} paths, {} scripts)",
            path.display(),
            tree.paths().len(),
            scripts.len()
        ));
        Ok(path)
    }

    async fn create_bff_file(&mut self, manifest: &Path) -> Result<Vec<PathBuf>> {
        self.logger.info("Creating .bff file");

        let command = ShellCommand::new(self.resolve_tool())
            .arg("-d")
            .arg(self.staging_dir.as_os_str())
            .arg("-T")
            .arg(manifest.as_os_str())
            .elevated(self.ctx.config.use_sudo);

        let stream = self.streams.get(self.ctx.config.output_level);
        if let Err(err) = invoke_tool(self.ctx.runner.as_ref(), &command, stream).await {
            self.logger.error(format_args!(
                "{} failed; staging directory left at {}",
                command,
                self.staging_dir.display()
            ));
            return Err(err);
        }

        let mut produced = Vec::new();
        for bff in fs::glob_files(&self.staging_dir.join("tmp"), "*.bff")? {
            let Some(file_name) = bff.file_name() else {
                continue;
            };
            let destination = self.ctx.config.package_dir.join(file_name);
            fs::copy_file(&bff, &destination).await?;
            self.logger
                .debug(format_args!("Copied {} to {}", bff.display(), destination.display()));
            produced.push(destination);
        }
        Ok(produced)
    }
}

#[async_trait]
impl Packager for BffPackager {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    fn package_name(&self) -> String {
        format!(
            "{}.{}.{}.bff",
            self.identity.name, self.identity.version, self.identity.arch
        )
    }

    fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    async fn setup(&mut self) -> Result<()> {
        let project = &self.ctx.project;
        fs::create_dir_all(&self.staging_dir).await?;

        // /opt/hamlet => <staging>/opt/hamlet
        let destination = fs::rebase(&self.staging_dir, &project.install_dir);
        self.logger.info(format_args!(
            "Staging {} into {}",
            project.install_dir.display(),
            destination.display()
        ));
        fs::sync_tree(&project.install_dir, &destination, &project.exclusions).await?;

        let scripts_staging_dir = self.scripts_staging_dir();
        fs::create_dir_all(&scripts_staging_dir).await?;
        let scripts = stage_scripts(
            &project.package_scripts_path,
            &scripts_staging_dir,
            &self.scripts_install_dir(),
        )
        .await?;

        self.scripts = Some(scripts);
        Ok(())
    }

    async fn build(&mut self) -> Result<Vec<PathBuf>> {
        let scripts = self
            .scripts
            .clone()
            .ok_or_else(|| Error::SetupRequired(self.staging_dir.clone()))?;
        let manifest = self.write_manifest(&scripts)?;
        self.create_bff_file(&manifest).await
    }
}

impl std::fmt::Debug for BffPackager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BffPackager")
            .field("identity", &self.identity)
            .field("staging_dir", &self.staging_dir)
            .field("setup_complete", &self.scripts.is_some())
            .finish_non_exhaustive()
    }
}
