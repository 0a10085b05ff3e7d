//! # Blueprint Sources
//!
//! File: cli/src/blueprint/source.rs
//!
//! ## Overview
//!
//! Where blueprint definitions come from. The loader only needs three
//! things from storage: the list of blueprint ids, the `blueprint.toml` text
//! of one blueprint, and its template bodies keyed by source identifier.
//!
//! - `DirectorySource` reads `<root>/<id>/blueprint.toml` and walks
//!   `<root>/<id>/templates/`.
//! - `MemorySource` holds everything in memory, for tests and embedders.
//!
//! An id is a single path segment. Anything else (`..`, `a/b`, hidden
//! names) is treated as an unknown blueprint rather than a path.
//!
use crate::core::error::{ForgeError, ForgeResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MANIFEST_FILENAME: &str = "blueprint.toml";
pub const TEMPLATES_DIRNAME: &str = "templates";

/// Read-only blueprint storage.
pub trait BlueprintSource: Send + Sync {
    /// Ids of every blueprint present, sorted.
    fn ids(&self) -> ForgeResult<Vec<String>>;

    /// The `blueprint.toml` text of `id`, or `None` if no such blueprint exists.
    fn manifest(&self, id: &str) -> ForgeResult<Option<String>>;

    /// Template bodies of `id`, keyed by their path below `templates/`.
    fn templates(&self, id: &str) -> ForgeResult<BTreeMap<String, String>>;
}

pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\'])
        && id.chars().all(|c| !c.is_control())
}

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlueprintSource for DirectorySource {
    fn ids(&self) -> ForgeResult<Vec<String>> {
        if !self.root.is_dir() {
            warn!(
                "Blueprint directory '{}' does not exist",
                self.root.display()
            );
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_id(&name) || !entry.path().is_dir() {
                continue;
            }
            if entry.path().join(MANIFEST_FILENAME).is_file() {
                ids.push(name);
            } else {
                debug!("Skipping '{}': no {}", entry.path().display(), MANIFEST_FILENAME);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn manifest(&self, id: &str) -> ForgeResult<Option<String>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.root.join(id).join(MANIFEST_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn templates(&self, id: &str) -> ForgeResult<BTreeMap<String, String>> {
        let dir = self.root.join(id).join(TEMPLATES_DIRNAME);
        let mut templates = BTreeMap::new();
        if !is_valid_id(id) || !dir.is_dir() {
            return Ok(templates);
        }

        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ForgeError::FileSystem(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&dir)
                .map_err(|e| ForgeError::FileSystem(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let bytes = fs::read(entry.path())?;
            let body = String::from_utf8(bytes).map_err(|_| {
                ForgeError::malformed(
                    format!("{}/{}", TEMPLATES_DIRNAME, key),
                    "template is not valid UTF-8",
                )
            })?;
            templates.insert(key, body);
        }
        Ok(templates)
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryBlueprint {
    manifest: String,
    templates: BTreeMap<String, String>,
}

/// A fixed set of blueprints held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blueprints: BTreeMap<String, MemoryBlueprint>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blueprint<I, K, V>(mut self, id: &str, manifest: &str, templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.blueprints.insert(
            id.to_string(),
            MemoryBlueprint {
                manifest: manifest.to_string(),
                templates: templates
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            },
        );
        self
    }
}

impl BlueprintSource for MemorySource {
    fn ids(&self) -> ForgeResult<Vec<String>> {
        Ok(self.blueprints.keys().cloned().collect())
    }

    fn manifest(&self, id: &str) -> ForgeResult<Option<String>> {
        Ok(self.blueprints.get(id).map(|b| b.manifest.clone()))
    }

    fn templates(&self, id: &str) -> ForgeResult<BTreeMap<String, String>> {
        Ok(self
            .blueprints
            .get(id)
            .map(|b| b.templates.clone())
            .unwrap_or_default())
    }
}
