// crates/bizclass-server/src/fuzzy/mod.rs
// Trigram similarity index for fuzzy keyword matching
//
// Similarity follows pg_trgm semantics: each word is padded with two leading
// spaces and one trailing space, split into 3-char windows, and two strings
// are compared by |shared| / |union| of their trigram sets.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Extract the padded trigram set for a (possibly multi-word) string.
pub fn trigrams(text: &str) -> HashSet<String> {
    let mut grams = HashSet::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {} ", word.to_lowercase()).chars().collect();
        for window in padded.windows(3) {
            grams.insert(window.iter().collect());
        }
    }
    grams
}

/// Jaccard similarity of two trigram sets.
pub fn similarity_of(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_of(&trigrams(a), &trigrams(b))
}

/// One indexed keyword row
#[derive(Debug, Clone)]
pub struct TrigramEntry {
    pub keyword: String,
    pub industry: String,
    pub weight: f64,
    grams: HashSet<String>,
}

impl TrigramEntry {
    pub fn new(keyword: String, industry: String, weight: f64) -> Self {
        let grams = trigrams(&keyword);
        Self {
            keyword,
            industry,
            weight,
            grams,
        }
    }
}

/// A match returned by [`TrigramIndex::search`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrigramMatch {
    pub query: String,
    pub keyword: String,
    pub industry: String,
    pub weight: f64,
    pub similarity: f64,
}

/// In-memory trigram index over the keyword table, refreshed with a TTL.
#[derive(Debug, Default)]
pub struct TrigramIndex {
    loaded_at: Option<Instant>,
    entries: Vec<TrigramEntry>,
}

impl TrigramIndex {
    pub fn is_stale(&self, ttl: Duration) -> bool {
        match self.loaded_at {
            Some(t) => self.entries.is_empty() || t.elapsed() > ttl,
            None => true,
        }
    }

    pub fn replace(&mut self, entries: Vec<TrigramEntry>) {
        self.entries = entries;
        self.loaded_at = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.loaded_at = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every (query, keyword) pair whose similarity reaches `threshold`.
    ///
    /// Queries shorter than 3 characters produce too few trigrams to be
    /// meaningful and are skipped.
    pub fn search(&self, queries: &[String], threshold: f64) -> Vec<TrigramMatch> {
        let mut matches = Vec::new();
        for query in queries.iter().filter(|q| q.chars().count() >= 3) {
            let query_grams = trigrams(query);
            for entry in &self.entries {
                let sim = similarity_of(&query_grams, &entry.grams);
                if sim >= threshold {
                    matches.push(TrigramMatch {
                        query: query.clone(),
                        keyword: entry.keyword.clone(),
                        industry: entry.industry.clone(),
                        weight: entry.weight,
                        similarity: sim,
                    });
                }
            }
        }
        matches
    }
}
