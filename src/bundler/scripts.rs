//! Maintainer script staging.
//!
//! Projects may ship up to four lifecycle scripts. Each present script is
//! copied into the staging tree and mapped to the control-file keyword
//! installp expects for it.

use crate::bundler::{Result, utils::fs};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Lifecycle hook a maintainer script runs at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Hook {
    /// Before files are installed.
    Preinst,
    /// After files are installed.
    Postinst,
    /// Before files are removed.
    Prerm,
    /// After files are removed.
    Postrm,
}

impl Hook {
    /// Every hook, in control-file order.
    pub const ALL: [Hook; 4] = [Hook::Preinst, Hook::Postinst, Hook::Prerm, Hook::Postrm];

    /// Script file name in the project's scripts directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Hook::Preinst => "preinst",
            Hook::Postinst => "postinst",
            Hook::Prerm => "prerm",
            Hook::Postrm => "postrm",
        }
    }

    /// Keyword introducing the script in the installp control file.
    pub fn installp_key(self) -> &'static str {
        match self {
            Hook::Preinst => "Pre-installation Script",
            Hook::Postinst => "Post-installation Script",
            Hook::Prerm => "Pre_rm Script",
            Hook::Postrm => "Unconfiguration Script",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// One staged script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptEntry {
    /// Hook the script runs at.
    pub hook: Hook,
    /// Path of the script on the installed system.
    pub install_path: PathBuf,
}

impl ScriptEntry {
    /// Control-file keyword for this script.
    pub fn key(&self) -> &'static str {
        self.hook.installp_key()
    }
}

/// Staged scripts in [`Hook::ALL`] order. Absent scripts have no entry.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScriptMap {
    entries: Vec<ScriptEntry>,
}

impl ScriptMap {
    /// Entries in control-file order.
    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    /// Entry for `hook`, if the project provides that script.
    pub fn get(&self, hook: Hook) -> Option<&ScriptEntry> {
        self.entries.iter().find(|entry| entry.hook == hook)
    }

    /// Number of staged scripts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no script was staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Copy every present script from `source_dir` into `staging_dir`.
///
/// `install_dir` is where `staging_dir` ends up on the target system and is
/// used to build each entry's install path. A missing `source_dir` yields an
/// empty map.
pub async fn stage_scripts(
    source_dir: &Path,
    staging_dir: &Path,
    install_dir: &Path,
) -> Result<ScriptMap> {
    let mut entries = Vec::new();
    for hook in Hook::ALL {
        let source = source_dir.join(hook.file_name());
        if !source.is_file() {
            continue;
        }
        fs::copy_file(&source, &staging_dir.join(hook.file_name())).await?;
        log::debug!("Staged {} script from {}", hook, source.display());
        entries.push(ScriptEntry {
            hook,
            install_path: install_dir.join(hook.file_name()),
        });
    }
    Ok(ScriptMap { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installp_keys() {
        let keys: Vec<_> = Hook::ALL.iter().map(|hook| hook.installp_key()).collect();
        assert_eq!(
            keys,
            [
                "Pre-installation Script",
                "Post-installation Script",
                "Pre_rm Script",
                "Unconfiguration Script",
            ]
        );
    }

    #[tokio::test]
    async fn test_only_present_scripts_are_staged() {
        let src = tempfile::tempdir().unwrap();
        let stage = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("postinst"), "#!/bin/sh\necho hi\n").unwrap();

        let map = stage_scripts(
            src.path(),
            &stage.path().join("scripts"),
            Path::new("/opt/hamlet/embedded/share/installp"),
        )
        .await
        .unwrap();

        assert_eq!(map.len(), 1);
        let entry = map.get(Hook::Postinst).unwrap();
        assert_eq!(entry.key(), "Post-installation Script");
        assert_eq!(
            entry.install_path,
            PathBuf::from("/opt/hamlet/embedded/share/installp/postinst")
        );
        assert!(stage.path().join("scripts/postinst").is_file());
        assert!(map.get(Hook::Preinst).is_none());
    }

    #[tokio::test]
    async fn test_missing_source_dir_is_empty() {
        let stage = tempfile::tempdir().unwrap();
        let map = stage_scripts(
            &stage.path().join("missing"),
            stage.path(),
            Path::new("/opt/x"),
        )
        .await
        .unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_entries_follow_hook_order() {
        let src = tempfile::tempdir().unwrap();
        let stage = tempfile::tempdir().unwrap();
        for name in ["postrm", "preinst"] {
            std::fs::write(src.path().join(name), "#!/bin/sh\n").unwrap();
        }
        let map = stage_scripts(src.path(), stage.path(), Path::new("/opt/x"))
            .await
            .unwrap();
        let hooks: Vec<_> = map.entries().iter().map(|e| e.hook).collect();
        assert_eq!(hooks, [Hook::Preinst, Hook::Postrm]);
    }
}
