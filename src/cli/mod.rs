//! Command line interface for kodegen_bundler_bff.
//!
//! Loads a bundle file, applies command line overrides and runs one packager.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::bundler::{BundleFile, Bundler, Result, Settings, SettingsBuilder};
use crate::logger::{self, Logger};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

/// Build settings from the bundle file and command line overrides.
pub fn settings_from_args(args: &Args) -> Result<Settings> {
    let bundle = BundleFile::load(&args.bundle_file)?;
    let mut builder = SettingsBuilder::new()
        .project(bundle.project)
        .config(bundle.config);
    if let Some(dir) = &args.package_dir {
        builder = builder.package_dir(dir);
    }
    if let Some(dir) = &args.staging_root {
        builder = builder.staging_root(dir);
    }
    if args.no_sudo {
        builder = builder.use_sudo(false);
    }
    if let Some(arch) = &args.architecture {
        builder = builder.architecture(arch.clone());
    }
    builder.build()
}

/// Execute a bundle run for parsed arguments. Returns the exit code.
pub async fn execute(args: Args) -> Result<i32> {
    let output = OutputManager::new(false);
    if let Err(validation_error) = args.validate() {
        output.error(&format!("Invalid arguments: {validation_error}"));
        return Ok(1);
    }

    let severity = args.severity()?;
    logger::init(severity);
    let root = Logger::with_level("Bundler", severity);

    let settings = settings_from_args(&args)?;
    let artifact = Bundler::new(settings)
        .logger(root)
        .bundle(&args.packager)
        .await?;

    output.success(&format!(
        "Built {} ({} bytes)",
        artifact.package_name, artifact.size
    ))?;
    for path in &artifact.paths {
        output.indent(&path.display().to_string())?;
    }
    output.indent(&format!("SHA256: {}", artifact.checksum))?;
    Ok(0)
}
