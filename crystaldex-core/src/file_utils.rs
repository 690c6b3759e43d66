//! File utility functions.

use crate::config::Variant;
use crate::error::{CrystaldexError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Recursively find files with given extension in a directory, sorted by path.
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(CrystaldexError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension() {
                if ext == extension {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Like [`find_files_with_extension`], but a missing directory is logged and yields no files.
pub fn find_map_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        warn!("Maps directory not found at {:?}, skipping", dir);
        return Ok(Vec::new());
    }
    find_files_with_extension(dir, "asm")
}

/// Scan map files under `dir` in parallel.
///
/// `select` filters on the file stem; `scan` gets the stem and the
/// variant-resolved lines. Files that fail to read are logged and skipped.
/// Results keep path order.
pub fn scan_map_files<T, S, F>(dir: &Path, variant: Variant, select: S, scan: F) -> Result<Vec<(String, T)>>
where
    T: Send,
    S: Fn(&str) -> bool + Sync,
    F: Fn(&str, &[String]) -> Option<T> + Sync,
{
    let files: Vec<PathBuf> = find_map_files(dir)?
        .into_iter()
        .filter(|path| path.file_stem().and_then(|s| s.to_str()).is_some_and(&select))
        .collect();

    let results = files
        .par_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    let lines = split_variant(&text, variant);
                    scan(stem, &lines).map(|value| (stem.to_string(), value))
                }
                Err(e) => {
                    warn!("Failed to read {:?}: {}", path, e);
                    None
                }
            }
        })
        .collect();
    Ok(results)
}

/// Read a source file, treating a missing file as "nothing to extract".
///
/// `what` names the file in the warning, e.g. "item attributes".
pub fn read_source(path: &Path, what: &str) -> Result<Option<String>> {
    if !path.exists() {
        warn!("{} file not found at {:?}, skipping", what, path);
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}

/// Read a source file and resolve its faithful/polished conditional blocks.
pub fn read_source_lines(path: &Path, what: &str, variant: Variant) -> Result<Option<Vec<String>>> {
    Ok(read_source(path, what)?.map(|text| split_variant(&text, variant)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Shared,
    Faithful,
    Polished,
}

/// Split source text into trimmed lines, keeping only the requested side of
/// `if DEF(FAITHFUL)` / `else` / `endc` blocks.
///
/// Conditionals that do not mention FAITHFUL are passed through untouched, and
/// nested conditionals inside a variant block stay with that block.
pub fn split_variant(text: &str, variant: Variant) -> Vec<String> {
    let mut lines = Vec::new();
    let mut block = Block::Shared;
    let mut depth = 0usize;

    for raw in text.lines() {
        let line = raw.trim();
        let lower = line.to_ascii_lowercase();

        if block == Block::Shared {
            if lower.starts_with("if ") && lower.contains("faithful") {
                block = if lower.contains("!def(faithful)") {
                    Block::Polished
                } else {
                    Block::Faithful
                };
                continue;
            }
            lines.push(line.to_string());
            continue;
        }

        if lower.starts_with("if ") {
            depth += 1;
        } else if depth == 0 && lower == "else" {
            block = match block {
                Block::Faithful => Block::Polished,
                _ => Block::Faithful,
            };
            continue;
        } else if lower == "endc" {
            if depth == 0 {
                block = Block::Shared;
                continue;
            }
            depth -= 1;
        }

        let keep = matches!(
            (block, variant),
            (Block::Faithful, Variant::Faithful) | (Block::Polished, Variant::Polished)
        );
        if keep {
            lines.push(line.to_string());
        }
    }

    lines
}

/// Serialize a value as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
