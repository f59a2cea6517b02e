// crates/bizclass-server/src/context.rs
// Per-request classification context: keywords and entities extracted once
//
// The context is built a single time per request and then shared read-only
// (behind an Arc) by every strategy and by code generation.

use crate::entities::{Entity, extract_entities};
use bizclass_types::ClassificationRequest;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Generic words that carry no industry signal
const STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "are", "as", "at", "be", "best", "business", "by", "co",
    "com", "company", "corp", "corporation", "enterprise", "enterprises", "for", "from", "global",
    "group", "holding", "holdings", "http", "https", "in", "inc", "international", "is", "it",
    "llc", "llp", "ltd", "net", "of", "on", "or", "org", "our", "plc", "pllc", "service",
    "services", "solution", "solutions", "the", "to", "us", "we", "with", "www", "your",
];

/// Words ending in "s" that are not plurals
const SINGULAR_EXCEPTIONS: &[&str] = &[
    "aesthetics",
    "analytics",
    "athletics",
    "bus",
    "cosmetics",
    "electronics",
    "ethics",
    "fitness",
    "gas",
    "logistics",
    "news",
    "pilates",
    "saas",
    "starbucks",
    "wellness",
];

/// Rough measure of how much text the request carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextQuality {
    /// Nothing usable was extracted
    Empty,
    Sparse,
    Adequate,
    Rich,
}

/// Immutable, derived view of one request
#[derive(Debug, Clone)]
pub struct ClassificationContext {
    business_name: String,
    text: String,
    keywords: BTreeSet<String>,
    tokens: Vec<String>,
    phrase_text: String,
    entities: Vec<Entity>,
    text_len: usize,
    quality: ContextQuality,
}

impl ClassificationContext {
    /// Build the context from the request and any website text already fetched.
    pub fn build(request: &ClassificationRequest, website_text: Option<&str>) -> Self {
        let mut parts: Vec<String> = vec![request.business_name.clone()];
        if let Some(desc) = &request.description {
            parts.push(desc.clone());
        }
        if let Some(url) = &request.website_url {
            parts.extend(host_tokens(url));
        }
        if let Some(text) = website_text.or(request.website_text.as_deref()) {
            parts.push(text.to_string());
        }
        let text = parts.join(" . ");

        let raw_tokens = tokenize(&text);
        let mut keywords = BTreeSet::new();
        let mut tokens = Vec::new();
        let mut previous: Option<String> = None;

        for raw in &raw_tokens {
            let singular = singularize(raw);
            if is_stopword(raw) || is_stopword(&singular) {
                previous = None;
                continue;
            }
            keywords.insert(singular.clone());
            if raw != &singular {
                keywords.insert(raw.clone());
            }
            if let Some(prev) = &previous {
                keywords.insert(format!("{} {}", prev, singular));
            }
            tokens.push(singular.clone());
            previous = Some(singular);
        }

        let phrase_text = format!(
            " {} ",
            raw_tokens
                .iter()
                .map(|t| singularize(t))
                .collect::<Vec<_>>()
                .join(" ")
        );

        let entities = extract_entities(&text);
        let text_len = text.trim().len();
        let quality = if keywords.is_empty() && entities.is_empty() {
            ContextQuality::Empty
        } else if tokens.len() < 3 {
            ContextQuality::Sparse
        } else if text_len > 200 && tokens.len() >= 10 {
            ContextQuality::Rich
        } else {
            ContextQuality::Adequate
        };

        debug!(
            keywords = keywords.len(),
            entities = entities.len(),
            quality = ?quality,
            "Classification context built"
        );

        Self {
            business_name: request.business_name.trim().to_string(),
            text,
            keywords,
            tokens,
            phrase_text,
            entities,
            text_len,
            quality,
        }
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    /// Combined request text the context was derived from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Deduplicated keywords: content tokens, their plural forms and adjacent bigrams
    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords.iter().cloned().collect()
    }

    /// Content tokens in text order (stopwords removed), for term frequency
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Normalized text padded with spaces, for phrase containment checks
    pub fn phrase_text(&self) -> &str {
        &self.phrase_text
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn quality(&self) -> ContextQuality {
        self.quality
    }

    /// No keywords and no entities: too little signal to classify
    pub fn is_insufficient(&self) -> bool {
        self.quality == ContextQuality::Empty
    }

    /// Every (keyword, entity value) pair, excluding self-pairs, in sorted order
    pub fn keyword_entity_pairs(&self) -> Vec<(String, String)> {
        let values: BTreeSet<&str> = self.entities.iter().map(|e| e.value.as_str()).collect();
        let mut pairs = Vec::new();
        for keyword in &self.keywords {
            for value in &values {
                if keyword.as_str() != *value {
                    pairs.push((keyword.clone(), (*value).to_string()));
                }
            }
        }
        pairs
    }
}

/// Lowercase and split on anything that isn't alphanumeric.
///
/// Possessives fall out naturally: `joe's` splits into `joe` and a single
/// character that the length filter drops.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Light plural stripping; good enough to line keywords up with the taxonomy.
pub fn singularize(word: &str) -> String {
    if word.len() <= 3 || SINGULAR_EXCEPTIONS.contains(&word) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies")
        && word.len() > 4
    {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "ches", "shes", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Meaningful labels from a website host: `www.joes-pizza.com` -> joes, pizza
fn host_tokens(raw: &str) -> Vec<String> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let Ok(parsed) = url::Url::parse(&with_scheme) else {
        debug!(url = %raw, "Ignoring unparseable website URL");
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };

    let labels: Vec<&str> = host.split('.').filter(|l| *l != "www").collect();
    let meaningful = if labels.len() > 1 {
        &labels[..labels.len() - 1]
    } else {
        &labels[..]
    };
    meaningful
        .iter()
        .flat_map(|l| l.split('-'))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
