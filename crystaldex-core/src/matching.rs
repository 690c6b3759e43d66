//! Resolving item references from location sources against the item map.
//!
//! Marts, acquisition tables and map scripts name items by constant, and
//! those constants don't always line up with description labels. Lookups go
//! through a cascade of increasingly loose strategies; misses are logged with
//! suggestions and kept in a [`MatchReport`].

use crate::models::ItemMap;
use crate::normalize::normalize_id;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// How a reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Normalized,
    Substring,
    HyphenStripped,
}

/// Token resolver for one extractor run.
///
/// Holds the item keys in sorted order, an index from normalized key to key,
/// and every token it has already resolved. Built from a snapshot of the map,
/// so items added after construction are not seen.
pub struct ItemMatcher {
    keys: Vec<String>,
    by_normalized: HashMap<String, String>,
    cache: HashMap<String, Option<(String, MatchStrategy)>>,
}

impl ItemMatcher {
    pub fn new(items: &ItemMap) -> Self {
        let keys: Vec<String> = items.keys().cloned().collect();
        let mut by_normalized = HashMap::new();
        for key in &keys {
            by_normalized.entry(normalize_id(key)).or_insert_with(|| key.clone());
        }
        Self {
            keys,
            by_normalized,
            cache: HashMap::new(),
        }
    }

    /// Resolve `token` to an item key.
    ///
    /// Tries, in order: the token as a key, equality of normalized ids, a
    /// substring match in either direction against the keys in sorted order,
    /// and finally a comparison with hyphens removed from both sides. The
    /// substring step can pick a wrong item when one key is a prefix of
    /// another (`poke` and `pokedoll`); it stays because location sources
    /// depend on it for abbreviated constants.
    pub fn resolve(&mut self, token: &str) -> Option<(String, MatchStrategy)> {
        let token = token.trim();
        if let Some(cached) = self.cache.get(token) {
            return cached.clone();
        }
        let resolved = self.lookup(token);
        self.cache.insert(token.to_string(), resolved.clone());
        resolved
    }

    fn lookup(&self, token: &str) -> Option<(String, MatchStrategy)> {
        if token.is_empty() {
            return None;
        }
        if self.keys.binary_search_by(|key| key.as_str().cmp(token)).is_ok() {
            return Some((token.to_string(), MatchStrategy::Exact));
        }

        let id = normalize_id(token);
        if id.is_empty() {
            return None;
        }
        if let Some(key) = self.by_normalized.get(&id) {
            return Some((key.clone(), MatchStrategy::Normalized));
        }

        if let Some(key) = self
            .keys
            .iter()
            .find(|key| !key.is_empty() && (key.contains(id.as_str()) || id.contains(key.as_str())))
        {
            return Some((key.clone(), MatchStrategy::Substring));
        }

        let stripped = id.replace('-', "");
        self.keys
            .iter()
            .find(|key| key.replace('-', "") == stripped)
            .map(|key| (key.clone(), MatchStrategy::HyphenStripped))
    }

    /// Up to `limit` keys that look like near misses for `token`, best first.
    pub fn suggestions(&self, token: &str, limit: usize) -> Vec<String> {
        let id = normalize_id(token);
        let mut scored: Vec<(usize, &String)> = self
            .keys
            .iter()
            .map(|key| (common_prefix_len(key, &id), key))
            .filter(|(score, _)| *score >= 2)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(limit).map(|(_, key)| key.clone()).collect()
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// One lookup made by a location extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub source: String,
    pub token: String,
    pub resolved: Option<String>,
    pub strategy: Option<MatchStrategy>,
    /// Near misses, `;`-separated. Empty for matched tokens.
    pub suggestions: String,
}

/// Matched and unmatched counts for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub source: String,
    pub matched: usize,
    pub unmatched: usize,
}

/// Every lookup of a run, in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    records: Vec<MatchRecord>,
}

impl MatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `token` with `matcher` and record the outcome under `source`.
    /// Misses are logged with up to three suggestions.
    pub fn resolve(&mut self, matcher: &mut ItemMatcher, source: &str, token: &str) -> Option<String> {
        let resolved = matcher.resolve(token);
        let mut suggestions = Vec::new();
        match &resolved {
            Some((key, strategy)) => {
                debug!("{}: matched {:?} to {:?} ({:?})", source, token, key, strategy);
            }
            None => {
                suggestions = matcher.suggestions(token, 3);
                if suggestions.is_empty() {
                    warn!("{}: no item matches {:?}", source, token);
                } else {
                    warn!(
                        "{}: no item matches {:?}, did you mean {}?",
                        source,
                        token,
                        suggestions.join(", ")
                    );
                }
            }
        }

        self.records.push(MatchRecord {
            source: source.to_string(),
            token: token.to_string(),
            resolved: resolved.as_ref().map(|(key, _)| key.clone()),
            strategy: resolved.as_ref().map(|(_, strategy)| *strategy),
            suggestions: suggestions.join(";"),
        });
        resolved.map(|(key, _)| key)
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.records.iter().filter(|r| r.resolved.is_some()).count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.records.len() - self.matched_count()
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter().filter(|r| r.resolved.is_none())
    }

    /// Per-source counts, sorted by source name.
    pub fn summaries(&self) -> Vec<MatchSummary> {
        let mut by_source: BTreeMap<&str, MatchSummary> = BTreeMap::new();
        for record in &self.records {
            let summary = by_source.entry(&record.source).or_insert_with(|| MatchSummary {
                source: record.source.clone(),
                ..Default::default()
            });
            if record.resolved.is_some() {
                summary.matched += 1;
            } else {
                summary.unmatched += 1;
            }
        }
        by_source.into_values().collect()
    }

    /// Append another report's records, keeping their order.
    pub fn merge(&mut self, other: MatchReport) {
        self.records.extend(other.records);
    }
}
