//! Command line argument parsing and validation.

use crate::logger::Severity;
use clap::Parser;
use std::path::PathBuf;

/// Build AIX installp packages
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_bff",
    version,
    about = "Build AIX installp (.bff) packages",
    long_about = "Stage an install tree, generate the mkinstallp control file and build a .bff package.

Usage:
  kodegen_bundler_bff hamlet.toml
  kodegen_bundler_bff hamlet.toml --no-sudo --package-dir dist
  kodegen_bundler_bff hamlet.toml --log-level debug"
)]
pub struct Args {
    /// TOML bundle file with [project] and optional [config] tables
    #[arg(index = 1, value_name = "BUNDLE_FILE")]
    pub bundle_file: PathBuf,

    /// Packager to build with
    #[arg(long, default_value = "bff")]
    pub packager: String,

    /// Directory finished packages are copied into
    #[arg(long, value_name = "DIR")]
    pub package_dir: Option<PathBuf>,

    /// Parent directory of the staging directory
    #[arg(long, value_name = "DIR")]
    pub staging_root: Option<PathBuf>,

    /// Run the packaging tool without sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Target architecture, e.g. ppc64
    #[arg(long, value_name = "ARCH")]
    pub architecture: Option<String>,

    /// Log level: debug, info, warn, error, fatal, unknown
    #[arg(long, env = "BFF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.packager.is_empty() {
            return Err("Packager identifier is required".to_string());
        }
        self.severity().map(|_| ()).map_err(|e| e.to_string())
    }

    /// Parsed `--log-level`.
    pub fn severity(&self) -> crate::bundler::Result<Severity> {
        self.log_level.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["kodegen_bundler_bff", "hamlet.toml"]).unwrap();
        assert_eq!(args.bundle_file, PathBuf::from("hamlet.toml"));
        assert_eq!(args.packager, "bff");
        assert!(!args.no_sudo);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let args = Args::try_parse_from([
            "kodegen_bundler_bff",
            "hamlet.toml",
            "--log-level",
            "chatty",
        ])
        .unwrap();
        let err = args.validate().unwrap_err();
        assert!(err.contains("chatty"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "kodegen_bundler_bff",
            "hamlet.toml",
            "--no-sudo",
            "--package-dir",
            "dist",
            "--architecture",
            "ppc",
        ])
        .unwrap();
        assert!(args.no_sudo);
        assert_eq!(args.package_dir, Some(PathBuf::from("dist")));
        assert_eq!(args.architecture.as_deref(), Some("ppc"));
    }
}
