//! File system utilities for staging.
//!
//! Provides file copies with automatic directory creation, a recursive tree
//! sync honoring glob exclusions, and glob lookup of produced artifacts.
//! None of these roll back on failure; a partial copy stays on disk.

use crate::bundler::error::{Error, ErrorExt, Result};
use glob::{MatchOptions, Pattern};
use std::{
    io,
    path::{Component, Path, PathBuf},
};
use tokio::fs;
use walkdir::WalkDir;

/// Glob options used for exclusions: `*` does not cross `/`.
const EXCLUDE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Join an absolute install path below `root`.
///
/// `Path::join` replaces the base when given an absolute path, so the root
/// and prefix components are dropped first: `/tmp/s` + `/opt/app` gives
/// `/tmp/s/opt/app`.
pub fn rebase(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Compile exclusion globs.
pub fn compile_exclusions(exclusions: &[String]) -> Result<Vec<Pattern>> {
    exclusions
        .iter()
        .map(|pattern| Pattern::new(pattern).map_err(Error::from))
        .collect()
}

fn is_excluded(relative: &Path, exclusions: &[Pattern]) -> bool {
    exclusions
        .iter()
        .any(|pattern| pattern.matches_path_with(relative, EXCLUDE_OPTIONS))
}

/// Recursively copies `from` into `to`, skipping entries matching any of
/// `exclusions`.
///
/// Exclusions are globs relative to `from`. An excluded directory is skipped
/// with all its contents. Patterns that match nothing are ignored. Symlinks
/// are recreated, not followed. Returns the number of entries copied.
pub async fn sync_tree(from: &Path, to: &Path, exclusions: &[String]) -> Result<usize> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }
    let patterns = compile_exclusions(exclusions)?;
    create_dir_all(to).await?;

    let walker = WalkDir::new(from)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(from)
                .map(|relative| !is_excluded(relative, &patterns))
                .unwrap_or(true)
        });

    let mut copied = 0;
    for entry in walker {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .fs_context("reading symlink", entry.path())?;
            if entry.path().is_dir() {
                symlink_dir(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
            } else {
                symlink_file(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
            }
        } else if entry.file_type().is_dir() {
            create_dir_all(&dest_path).await?;
        } else {
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file", entry.path())?;
        }
        copied += 1;
    }

    log::debug!(
        "Synced {} entries from {} to {}",
        copied,
        from.display(),
        to.display()
    );
    Ok(copied)
}

/// Regular files in `dir` whose names match `pattern`, sorted.
///
/// `dir` is matched literally; glob metacharacters in it are escaped.
pub fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir = dir
        .to_str()
        .ok_or_else(|| Error::GenericError(format!("{dir:?} is not valid UTF-8")))?;
    let pattern = format!("{}/{pattern}", glob::Pattern::escape(dir.trim_end_matches('/')));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn test_rebase_absolute_install_dir() {
        assert_eq!(
            rebase(Path::new("/tmp/stage"), Path::new("/opt/hamlet")),
            PathBuf::from("/tmp/stage/opt/hamlet")
        );
        assert_eq!(
            rebase(Path::new("/tmp/stage"), Path::new("relative/dir")),
            PathBuf::from("/tmp/stage/relative/dir")
        );
    }

    #[tokio::test]
    async fn test_sync_tree_honors_exclusions() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        touch(&src.path().join("bin/hamlet"));
        touch(&src.path().join("docs/readme.md"));
        touch(&src.path().join("docs/guide.txt"));
        touch(&src.path().join(".git/HEAD"));

        let exclusions = vec![
            ".git".to_string(),
            "docs/*.md".to_string(),
            "does/not/match".to_string(),
        ];
        let target = dst.path().join("opt/hamlet");
        sync_tree(src.path(), &target, &exclusions).await.unwrap();

        assert!(target.join("bin/hamlet").is_file());
        assert!(target.join("docs/guide.txt").is_file());
        assert!(!target.join("docs/readme.md").exists());
        assert!(!target.join(".git").exists());
    }

    #[tokio::test]
    async fn test_sync_tree_rejects_missing_source() {
        let dst = tempfile::tempdir().unwrap();
        let missing = dst.path().join("nope");
        assert!(sync_tree(&missing, dst.path(), &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_exclusion_pattern() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let err = sync_tree(src.path(), dst.path(), &["[".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GlobPattern(_)));
    }

    #[tokio::test]
    async fn test_copy_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("postinst");
        touch(&from);
        let to = dir.path().join("a/b/c/postinst");
        copy_file(&from, &to).await.unwrap();
        assert!(to.is_file());
    }

    #[test]
    fn test_glob_files_only_matches_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("tmp/b.bff"));
        touch(&dir.path().join("tmp/a.bff"));
        std::fs::create_dir_all(dir.path().join("tmp/dir.bff")).unwrap();

        let found = glob_files(&dir.path().join("tmp"), "*.bff").unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("tmp/a.bff"), dir.path().join("tmp/b.bff")]
        );
    }

    #[test]
    fn test_glob_files_escapes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("build[1]/bff-x/tmp");
        touch(&staging.join("hamlet.1.0.0.1.bff"));
        // Would match `build[1]` read as a character class.
        touch(&dir.path().join("build1/bff-x/tmp/decoy.bff"));

        let found = glob_files(&staging, "*.bff").unwrap();
        assert_eq!(found, vec![staging.join("hamlet.1.0.0.1.bff")]);
    }
}
