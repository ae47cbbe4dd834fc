//! Card meaning resolution with a flat-file cache.
//!
//! [`MeaningResolver`] owns the in-memory meaning map and its JSON backing
//! store exclusively; concurrent callers go through [`MeaningResolver::get_meaning`],
//! never the file. Cache I/O failures are logged and swallowed: a broken
//! cache file degrades the resolver to memory-only operation, it never fails
//! a request.

pub mod arcana;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Upright and reversed meaning strings for one card.
///
/// Both orientations are always resolved and stored together; the caller
/// selects the orientation it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMeaning {
    pub upright: String,
    pub reversed: String,
}

impl CardMeaning {
    /// The meaning string for the given orientation.
    pub fn for_orientation(&self, reversed: bool) -> &str {
        if reversed {
            &self.reversed
        } else {
            &self.upright
        }
    }
}

/// Resolves card names to meanings, caching every answer.
///
/// Keys are always lowercase; lookups lowercase the query first. Meanings
/// come from the fixed major-arcana table, the suit/rank fallback rules, or
/// a generic template (whichever matches first), and every computed meaning
/// is cached in memory and persisted before being returned, so repeated
/// requests for the same card are idempotent.
pub struct MeaningResolver {
    cache_path: PathBuf,
    cache: RwLock<HashMap<String, CardMeaning>>,
}

impl MeaningResolver {
    /// Create a resolver backed by the given cache file, loading any
    /// previously persisted meanings. A missing or unreadable file starts
    /// the resolver with an empty map.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let cache = load_cache(&cache_path);
        Self {
            cache_path,
            cache: RwLock::new(cache),
        }
    }

    /// Resolve the meaning pair for a card name.
    ///
    /// The `is_reversed` flag does not change what is returned (both
    /// orientations always come back together); it is accepted so the call
    /// site mirrors the wire contract.
    pub fn get_meaning(&self, card_name: &str, _is_reversed: bool) -> CardMeaning {
        let key = card_name.to_lowercase();

        if let Some(meaning) = self.cache.read().get(&key) {
            return meaning.clone();
        }

        let meaning = fallback_meaning(card_name, &key);

        // Serialize writers: insert and persist under the write lock so the
        // rewrite reflects the full map and concurrent misses cannot tear it.
        let mut cache = self.cache.write();
        let meaning = cache.entry(key).or_insert(meaning).clone();
        if let Err(e) = persist_cache(&self.cache_path, &cache) {
            log::warn!(
                "Failed to persist meaning cache to {}: {}",
                self.cache_path.display(),
                e
            );
        }
        meaning
    }

    /// Number of cached meanings (test and diagnostics helper).
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

/// Compute a fallback meaning for an uncached card.
fn fallback_meaning(card_name: &str, lower_name: &str) -> CardMeaning {
    if let Some(meaning) = arcana::major_arcana_meaning(lower_name) {
        return meaning;
    }
    if let Some(meaning) = arcana::suit_meaning(lower_name) {
        return meaning;
    }
    arcana::generic_meaning(card_name)
}

fn load_cache(path: &Path) -> HashMap<String, CardMeaning> {
    if !path.exists() {
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Failed to parse meaning cache {}: {}", path.display(), e);
                HashMap::new()
            }
        },
        Err(e) => {
            log::warn!("Failed to read meaning cache {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Rewrite the full cache file. Writes to a sibling temp file then renames,
/// so a concurrent reader never observes a torn file.
fn persist_cache(path: &Path, cache: &HashMap<String, CardMeaning>) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(cache)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)
}
