//! installp control file (`gen.template`) generation.
//!
//! The manifest is a pure function of the package identity, the staged file
//! list and the staged scripts. It is rendered with handlebars from the
//! built-in template or a project-supplied override and rewritten on every
//! build.

use crate::bundler::{
    error::{ErrorExt, Result},
    scripts::ScriptMap,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name of the rendered manifest inside the staging directory.
pub const MANIFEST_FILE_NAME: &str = "gen.template";

const TEMPLATE_NAME: &str = "gen.template";
const BUILTIN_TEMPLATE: &str = include_str!("resources/gen.template.hbs");

/// Snapshot of every path under a staging directory.
///
/// Paths are relative, `/`-separated and sorted. Directories are included.
/// The manifest file itself is never part of the tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StagingTree {
    paths: Vec<String>,
}

impl StagingTree {
    /// Walk `root` and collect its contents.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry?;
            let relative = entry.path().strip_prefix(root)?;
            if relative == Path::new(MANIFEST_FILE_NAME) {
                continue;
            }
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            paths.push(joined);
        }
        paths.sort();
        Ok(Self { paths })
    }

    /// Build a tree from explicit relative paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        paths.sort();
        Self { paths }
    }

    /// Relative paths in order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Paths as they appear on the installed system.
    pub fn rooted(&self) -> Vec<String> {
        self.paths.iter().map(|path| format!("/{path}")).collect()
    }
}

#[derive(Debug, Serialize)]
struct ScriptLine {
    key: &'static str,
    path: String,
}

/// Variables available to the control file template.
#[derive(Debug, Serialize)]
pub struct ManifestData {
    name: String,
    install_dir: String,
    friendly_name: String,
    version: String,
    description: String,
    files: Vec<String>,
    scripts: Vec<ScriptLine>,
}

impl ManifestData {
    /// Collect template variables.
    pub fn new(
        name: &str,
        install_dir: &Path,
        friendly_name: &str,
        version: &str,
        description: &str,
        tree: &StagingTree,
        scripts: &ScriptMap,
    ) -> Self {
        Self {
            name: name.to_string(),
            install_dir: install_dir.display().to_string(),
            friendly_name: friendly_name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            files: tree.rooted(),
            scripts: scripts
                .entries()
                .iter()
                .map(|entry| ScriptLine {
                    key: entry.key(),
                    path: entry.install_path.display().to_string(),
                })
                .collect(),
        }
    }
}

/// Renders [`ManifestData`] into a control document.
pub struct ManifestRenderer {
    registry: Handlebars<'static>,
}

impl ManifestRenderer {
    /// Renderer for the built-in template, or for the template at
    /// `override_path` when given.
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let template = match override_path {
            Some(path) => std::fs::read_to_string(path).fs_context("reading manifest template", path)?,
            None => BUILTIN_TEMPLATE.to_string(),
        };

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry.register_template_string(TEMPLATE_NAME, template)?;
        Ok(Self { registry })
    }

    /// Render to a string.
    pub fn render(&self, data: &ManifestData) -> Result<String> {
        Ok(self.registry.render(TEMPLATE_NAME, data)?)
    }

    /// Render into `staging_dir`, replacing any previous manifest.
    ///
    /// Returns the manifest path.
    pub fn write(&self, data: &ManifestData, staging_dir: &Path) -> Result<PathBuf> {
        let contents = self.render(data)?;
        let destination = staging_dir.join(MANIFEST_FILE_NAME);
        std::fs::write(&destination, contents).fs_context("writing manifest", &destination)?;
        Ok(destination)
    }
}

impl std::fmt::Debug for ManifestRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestRenderer").finish_non_exhaustive()
    }
}
