//! AIX bundling support.
//!
//! | Format | Required Tools |
//! |--------|----------------|
//! | .bff (installp) | `mkinstallp` (bos.adt.insttools), `sudo` |
//!
//! Packages are written to the configured package directory as
//! `<name>.<version>.<arch>.bff`.

pub mod bff;

pub use bff::BffPackager;
