// crates/bizclass-server/src/entities/mod.rs
// Pattern-based business entity recognition
//
// Applies the compiled pattern library to lowercased request text. Pure
// function of the input: no I/O, no shared state beyond the compiled regexes.

mod patterns;

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Confidence assigned to a direct pattern hit
pub const ENTITY_BASE_CONFIDENCE: f64 = 0.8;

/// Entity category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    BusinessType,
    Product,
    Service,
    IndustryIndicator,
    Location,
    Brand,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A recognized entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub entity_type: EntityType,
    /// Canonical lowercase value, shared with the co-occurrence pattern table
    pub value: String,
    pub confidence: f64,
    /// Industry this entity points to, if any
    pub industry: Option<String>,
}

struct CompiledPattern {
    entity_type: EntityType,
    regex: Regex,
    value: Option<&'static str>,
    industry: Option<&'static str>,
}

static PATTERN_LIBRARY: LazyLock<Vec<CompiledPattern>> = LazyLock::new(|| {
    patterns::PATTERNS
        .iter()
        .filter_map(
            |(entity_type, pattern, value, industry)| match Regex::new(pattern) {
                Ok(regex) => Some(CompiledPattern {
                    entity_type: *entity_type,
                    regex,
                    value: *value,
                    industry: *industry,
                }),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Skipping invalid entity pattern");
                    None
                }
            },
        )
        .collect()
});

/// Number of compiled patterns in the library
pub fn pattern_count() -> usize {
    PATTERN_LIBRARY.len()
}

fn normalize_match(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract entities from free text.
///
/// Results are deduplicated by (type, value) and sorted so the output does not
/// depend on pattern order.
pub fn extract_entities(text: &str) -> Vec<Entity> {
    let lowered = text.to_lowercase();
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    let mut entities = Vec::new();

    for pattern in PATTERN_LIBRARY.iter() {
        for m in pattern.regex.find_iter(&lowered) {
            let value = match pattern.value {
                Some(v) => v.to_string(),
                None => normalize_match(m.as_str()),
            };
            if seen.insert((pattern.entity_type, value.clone())) {
                entities.push(Entity {
                    entity_type: pattern.entity_type,
                    value,
                    confidence: ENTITY_BASE_CONFIDENCE,
                    industry: pattern.industry.map(String::from),
                });
            }
        }
    }

    entities.sort_by(|a, b| {
        a.entity_type
            .cmp(&b.entity_type)
            .then_with(|| a.value.cmp(&b.value))
    });
    entities
}
