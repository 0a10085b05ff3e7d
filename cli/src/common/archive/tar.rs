//! # Forge TAR Archive Operations (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//!
//! ## Overview
//!
//! Serializes an in-memory project tree (relative path → bytes) into a
//! gzipped tarball and back.
//!
//! ## Architecture
//!
//! The `tar` crate builds the archive structure and `flate2` compresses it.
//!
//! - Only regular files are written; directories are implied by paths.
//! - Entries are written in path order with a zero modification time and no
//!   owner, so identical trees always produce identical bytes.
//! - Shell scripts (`.sh`) get mode `0755`, everything else `0644`.
//! - Paths are stored exactly as given, so `unpack_tree(pack_tree(t)) == t`.
//!
//! ## Usage
//!
//! ```rust
//! use forge::common::archive::tar;
//! use std::collections::BTreeMap;
//!
//! let mut tree = BTreeMap::new();
//! tree.insert("src/main.rs".to_string(), b"fn main() {}\n".to_vec());
//!
//! let bytes = tar::pack_tree(&tree).unwrap();
//! assert_eq!(tar::unpack_tree(&bytes).unwrap(), tree);
//! ```
//!
use crate::core::error::{ForgeError, ForgeResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Read;

fn archive_error(context: &str) -> impl Fn(std::io::Error) -> ForgeError + '_ {
    move |e| ForgeError::Archive(format!("{}: {}", context, e))
}

fn mode_for(path: &str) -> u32 {
    if path.ends_with(".sh") {
        0o755
    } else {
        0o644
    }
}

/// Creates a gzipped TAR archive in memory from `files`.
pub fn pack_tree(files: &BTreeMap<String, Vec<u8>>) -> ForgeResult<Vec<u8>> {
    let mut tar_gz_bytes = Vec::new();
    let encoder = GzEncoder::new(&mut tar_gz_bytes, Compression::default());
    let mut builder = ::tar::Builder::new(encoder);

    for (path, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_entry_type(::tar::EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(mode_for(path));
        header.set_mtime(0);
        builder
            .append_data(&mut header, path, content.as_slice())
            .map_err(archive_error(path))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(archive_error("failed to finalize tar archive"))?;
    encoder
        .finish()
        .map_err(archive_error("failed to finish gzip stream"))?;

    Ok(tar_gz_bytes)
}

/// Reads every regular file of a gzipped TAR archive back into a tree.
pub fn unpack_tree(bytes: &[u8]) -> ForgeResult<BTreeMap<String, Vec<u8>>> {
    let mut archive = ::tar::Archive::new(GzDecoder::new(bytes));
    let mut files = BTreeMap::new();

    let entries = archive
        .entries()
        .map_err(archive_error("failed to read archive"))?;
    for entry in entries {
        let mut entry = entry.map_err(archive_error("failed to read archive entry"))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(archive_error("invalid entry path"))?
            .to_string_lossy()
            .replace('\\', "/");
        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(archive_error(&path))?;
        files.insert(path, content);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_vec()))
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_paths_and_bytes() {
        let long_path = format!("deep/{}/file.txt", "nested".repeat(30));
        let original = tree(&[
            ("README.md", b"# Demo\n"),
            ("src/main.rs", b"fn main() {}\n"),
            ("assets/blob.bin", &[0, 159, 146, 150, 255]),
            ("empty.txt", b""),
            (long_path.as_str(), b"long"),
        ]);
        let packed = pack_tree(&original).unwrap();
        assert_eq!(unpack_tree(&packed).unwrap(), original);
    }

    #[test]
    fn test_packing_is_deterministic() {
        let files = tree(&[("a.txt", b"a"), ("b/c.txt", b"c")]);
        assert_eq!(pack_tree(&files).unwrap(), pack_tree(&files).unwrap());
    }

    #[test]
    fn test_script_mode() {
        let packed = pack_tree(&tree(&[("run.sh", b"#!/bin/sh\n"), ("x.txt", b"")])).unwrap();
        let mut archive = ::tar::Archive::new(GzDecoder::new(packed.as_slice()));
        let modes: Vec<(String, u32)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                let path = e.path().unwrap().to_string_lossy().into_owned();
                (path, e.header().mode().unwrap())
            })
            .collect();
        assert_eq!(
            modes,
            vec![("run.sh".to_string(), 0o755), ("x.txt".to_string(), 0o644)]
        );
    }

    #[test]
    fn test_garbage_is_an_archive_error() {
        let err = unpack_tree(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, ForgeError::Archive(_)));
    }
}
