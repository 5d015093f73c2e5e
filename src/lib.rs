//! # KODEGEN Bundler BFF
//!
//! Builds AIX installp (`.bff`) packages from a prepared install tree.
//!
//! The pipeline stages the install tree into a scratch directory, generates
//! the `mkinstallp` control file from the staged paths and maintainer
//! scripts, runs `mkinstallp` and streams its output line by line into the
//! log.
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_bff hamlet.toml
//! kodegen_bundler_bff hamlet.toml --no-sudo --package-dir dist
//! kodegen_bundler_bff hamlet.toml --log-level debug
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bundler;
pub mod cli;
pub mod logger;

// Re-export main types for public API
pub use bundler::{BundledArtifact, Bundler, Error, Result, Settings};
pub use cli::Args;
pub use logger::{Logger, Severity};
