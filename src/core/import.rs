//! Import of quick strings from third-party ini-style configuration files.
//!
//! Two layouts are recognised. The current one pairs a metadata line
//! `N1{ii}=<type>,<name>,<delay>` with a content line `N{i}=<H|A>,<content>`;
//! the older one uses `Str{i}=<content>` with an optional `Hex{i}=true`.
//! The current layout is tried first; the older one only when the first
//! yields nothing. Unparsable lines are skipped, never reported.

use crate::core::codec::LEGACY_CODEC;
use crate::domain::error::{DualComError, DualComResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const NEW_FORMAT_MAX_INDEX: usize = 100;
const LEGACY_FORMAT_MAX_INDEX: usize = 40;

/// One quick string recovered from an import file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedMacro {
    pub content: String,
    pub is_hex: bool,
    pub source_name: String,
}

impl ImportedMacro {
    pub fn new(content: impl Into<String>, is_hex: bool, source_name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_hex,
            source_name: source_name.into(),
        }
    }
}

/// Parse already-decoded file content
pub fn parse_import(text: &str) -> Vec<ImportedMacro> {
    let entries = collect_entries(text);

    let imported = parse_indexed_format(&entries);
    if !imported.is_empty() {
        debug!("Import matched indexed layout with {} entries", imported.len());
        return imported;
    }

    let imported = parse_legacy_format(&entries);
    debug!("Import matched legacy layout with {} entries", imported.len());
    imported
}

/// Read `path` as legacy-codec text and parse it.
///
/// Only file access can fail; unrelated content yields an empty list.
pub fn import_file(path: &Path) -> DualComResult<Vec<ImportedMacro>> {
    let raw = fs::read(path).map_err(|source| DualComError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, had_errors) = LEGACY_CODEC.decode(&raw);
    if had_errors {
        debug!("Import file {} contains bytes outside {}", path.display(), LEGACY_CODEC);
    }

    let imported = parse_import(&text);
    info!("Parsed {} quick strings from {}", imported.len(), path.display());
    Ok(imported)
}

// First occurrence of each `key=value` line wins.
fn collect_entries(text: &str) -> HashMap<&str, &str> {
    let mut entries = HashMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries
            .entry(key)
            .or_insert_with(|| value.trim_end_matches(['\r', '\n']));
    }
    entries
}

fn parse_indexed_format(entries: &HashMap<&str, &str>) -> Vec<ImportedMacro> {
    let mut imported = Vec::new();

    for i in 1..=NEW_FORMAT_MAX_INDEX {
        let Some(name) = entries
            .get(format!("N1{:02}", i).as_str())
            .and_then(|meta| parse_metadata(meta))
        else {
            continue;
        };
        let Some((is_hex, content)) = entries
            .get(format!("N{}", i).as_str())
            .and_then(|value| parse_content(value))
        else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        imported.push(ImportedMacro::new(content, is_hex, name.trim()));
    }

    imported
}

// `<type>,<name>,<delay>`: numeric type, comma-free name, delay starting with digits
fn parse_metadata(meta: &str) -> Option<&str> {
    let mut parts = meta.splitn(3, ',');
    let kind = parts.next()?;
    let name = parts.next()?;
    let delay = parts.next()?;

    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let leading_digit = delay.bytes().next().is_some_and(|b| b.is_ascii_digit());
    if numeric(kind) && leading_digit {
        Some(name)
    } else {
        None
    }
}

// `H,<content>` or `A,<content>`
fn parse_content(value: &str) -> Option<(bool, &str)> {
    let (kind, content) = value.split_once(',')?;
    match kind {
        "H" => Some((true, content)),
        "A" => Some((false, content)),
        _ => None,
    }
}

fn parse_legacy_format(entries: &HashMap<&str, &str>) -> Vec<ImportedMacro> {
    let mut imported = Vec::new();

    for i in 1..=LEGACY_FORMAT_MAX_INDEX {
        let key = format!("Str{}", i);
        let Some(content) = entries.get(key.as_str()).map(|s| s.trim()) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        let is_hex = entries
            .get(format!("Hex{}", i).as_str())
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));
        imported.push(ImportedMacro::new(content, is_hex, key));
    }

    imported
}
