use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LauncherError, Result};
use crate::models::{CatalogEntry, ModLoader};

/// Merges the per-loader version files into one catalog, newest first.
///
/// Missing files are skipped. A file that fails to parse is logged and
/// skipped; the merge itself never fails.
pub fn merge_catalog(sources: &[(ModLoader, PathBuf)]) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    let mut catalog = Vec::new();

    for (modloader, path) in sources {
        if !path.exists() {
            continue;
        }
        match read_source(*modloader, path) {
            Ok(versions) => {
                log::info!("Loaded {} {} versions from {}", versions.len(), modloader, path.display());
                for version in versions {
                    let entry = CatalogEntry::new(version, *modloader);
                    if seen.insert(entry.clone()) {
                        catalog.push(entry);
                    }
                }
            }
            Err(e) => log::warn!("Skipping version source: {}", e),
        }
    }

    catalog.sort_by(|a, b| {
        compare_versions(&b.version, &a.version).then_with(|| a.modloader.cmp(&b.modloader))
    });
    catalog
}

fn read_source(modloader: ModLoader, path: &Path) -> Result<Vec<String>> {
    let source_error = |reason: String| LauncherError::SourceRead {
        path: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| source_error(e.to_string()))?;
    let data: Value = serde_json::from_str(&raw).map_err(|e| source_error(e.to_string()))?;

    let versions = match modloader {
        ModLoader::Forge => forge_versions(&data),
        ModLoader::Vanilla => vanilla_versions(&data),
        ModLoader::Fabric | ModLoader::Quilt => stable_versions(&data),
    };
    versions.ok_or_else(|| source_error("unexpected document shape".to_string()))
}

// Sources are either a bare list or an object wrapping a `versions` list
fn version_list(data: &Value) -> Option<&Vec<Value>> {
    match data {
        Value::Array(list) => Some(list),
        Value::Object(obj) => obj.get("versions").and_then(Value::as_array),
        _ => None,
    }
}

fn vanilla_versions(data: &Value) -> Option<Vec<String>> {
    let list = version_list(data)?;
    Some(
        list.iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("release"))
            .filter_map(|entry| {
                entry
                    .get("id")
                    .or_else(|| entry.get("version"))
                    .and_then(Value::as_str)
            })
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn stable_versions(data: &Value) -> Option<Vec<String>> {
    let list = version_list(data)?;
    Some(
        list.iter()
            .filter_map(|entry| match entry {
                Value::String(v) => Some(v.as_str()),
                Value::Object(obj) if obj.get("stable").and_then(Value::as_bool) == Some(true) => obj
                    .get("version")
                    .or_else(|| obj.get("id"))
                    .and_then(Value::as_str),
                _ => None,
            })
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

// Forge builds look like `1.20.1-47.2.0`; only the game version is kept
fn forge_versions(data: &Value) -> Option<Vec<String>> {
    let list = data.as_array()?;
    let mut versions: Vec<String> = Vec::new();
    for build in list.iter().filter_map(Value::as_str) {
        let mc_version = build.split(['-', '_']).next().unwrap_or_default();
        if !mc_version.is_empty() && !versions.iter().any(|v| v == mc_version) {
            versions.push(mc_version.to_string());
        }
    }
    Some(versions)
}

/// Numeric-aware comparison: digit runs compare by value, everything else
/// compares as text, so `1.20.4` sorts after `1.9`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = tokenize(a);
    let right = tokenize(b);
    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Token::Number(x), Token::Number(y)) => x.cmp(y),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
            (Token::Text(x), Token::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Number(u64),
    Text(&'a str),
}

fn tokenize(version: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, ch) in version.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                tokens.push(make_token(&version[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        tokens.push(make_token(&version[start..], prev));
    }
    tokens
}

fn make_token(chunk: &str, digits: bool) -> Token<'_> {
    if digits {
        // Runs too long for u64 fall back to text ordering
        chunk
            .parse::<u64>()
            .map(Token::Number)
            .unwrap_or(Token::Text(chunk))
    } else {
        Token::Text(chunk)
    }
}
