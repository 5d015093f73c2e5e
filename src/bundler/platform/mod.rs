//! Platform-specific packager implementations.
//!
//! | Platform | Package Types | Module |
//! |----------|--------------|---------|
//! | AIX | .bff (installp) | [`aix`] |
//!
//! Packagers are not gated on the host OS: staging and control file
//! generation run anywhere, only the final `mkinstallp` call needs AIX.

pub mod aix;
