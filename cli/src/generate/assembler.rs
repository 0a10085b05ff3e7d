//! # Project Assembler
//!
//! File: cli/src/generate/assembler.rs
//!
//! ## Overview
//!
//! Collects rendered files into one project tree, either kept in memory or
//! written below a directory on disk.
//!
//! ## Architecture
//!
//! Assembly is two passes. The dry run ([`plan`]) builds the path → bytes
//! map and rejects every conflict it can find without touching the disk:
//! two files with the same destination, and a file whose path is also used
//! as a directory by another (`src` and `src/main.rs`). In disk mode the dry
//! run also inspects the target: an existing non-empty directory is refused
//! unless `overwrite` is set, and with `overwrite` an existing entry of the
//! wrong type (a directory where a file goes, or the reverse) is refused.
//! Only after all of that passes does the second pass write anything.
//!
use super::render::RenderedFile;
use crate::core::error::{ForgeError, ForgeResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyMode {
    InMemory,
    Disk { root: PathBuf, overwrite: bool },
}

/// An assembled project: relative path → file content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree(BTreeMap<String, Vec<u8>>);

impl ProjectTree {
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<u8>> {
        self.0
    }
}

impl From<BTreeMap<String, Vec<u8>>> for ProjectTree {
    fn from(map: BTreeMap<String, Vec<u8>>) -> Self {
        Self(map)
    }
}

#[derive(Debug)]
pub enum Assembled {
    Tree(ProjectTree),
    Written { root: PathBuf, files: usize },
}

fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Dry run: builds the tree and rejects destination conflicts.
pub fn plan(files: &[RenderedFile]) -> ForgeResult<ProjectTree> {
    let mut tree = BTreeMap::new();
    for file in files {
        if tree.insert(file.path.clone(), file.content.clone()).is_some() {
            return Err(ForgeError::DestinationConflict {
                path: file.path.clone(),
            });
        }
    }
    for path in tree.keys() {
        if let Some(dir) = ancestors(path).find(|dir| tree.contains_key(*dir)) {
            return Err(ForgeError::DestinationConflict {
                path: dir.to_string(),
            });
        }
    }
    Ok(ProjectTree(tree))
}

fn check_target(tree: &ProjectTree, root: &Path, overwrite: bool) -> ForgeResult<()> {
    if !root.exists() {
        return Ok(());
    }
    if !root.is_dir() {
        return Err(ForgeError::FileSystem(format!(
            "'{}' exists and is not a directory",
            root.display()
        )));
    }
    let non_empty = fs::read_dir(root)?.next().is_some();
    if non_empty && !overwrite {
        return Err(ForgeError::FileSystem(format!(
            "'{}' is not empty; pass overwrite to write into it",
            root.display()
        )));
    }

    for path in tree.paths() {
        for dir in ancestors(path) {
            let existing = root.join(dir);
            if existing.exists() && !existing.is_dir() {
                return Err(ForgeError::FileSystem(format!(
                    "'{}' exists and is not a directory",
                    existing.display()
                )));
            }
        }
        let target = root.join(path);
        if target.is_dir() {
            return Err(ForgeError::FileSystem(format!(
                "'{}' is a directory",
                target.display()
            )));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_script_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_script_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn write_tree(tree: &ProjectTree, root: &Path) -> ForgeResult<()> {
    fs::create_dir_all(root)?;
    for (path, content) in tree.as_map() {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content).map_err(|e| {
            ForgeError::FileSystem(format!("failed to write '{}': {}", target.display(), e))
        })?;
        if path.ends_with(".sh") {
            set_script_permissions(&target)?;
        }
        debug!("Wrote {}", target.display());
    }
    Ok(())
}

/// Assembles `files` in the requested mode. Nothing is written unless the
/// whole dry run succeeds.
pub fn assemble(files: &[RenderedFile], mode: AssemblyMode) -> ForgeResult<Assembled> {
    let tree = plan(files)?;
    match mode {
        AssemblyMode::InMemory => Ok(Assembled::Tree(tree)),
        AssemblyMode::Disk { root, overwrite } => {
            check_target(&tree, &root, overwrite)?;
            write_tree(&tree, &root)?;
            info!("Wrote {} file(s) to {}", tree.len(), root.display());
            Ok(Assembled::Written {
                root,
                files: tree.len(),
            })
        }
    }
}
