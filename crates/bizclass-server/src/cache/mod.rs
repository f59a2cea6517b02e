// crates/bizclass-server/src/cache/mod.rs
// Request fingerprints and the caching layers keyed by them

pub mod content;
pub mod dedup;
pub mod predictive;
pub mod result;
pub mod shared;

pub use content::{ContentSource, HttpContentSource, NoContentSource, RequestContent};
pub use dedup::{Claim, FlightGuard, FlightOutcome, InFlight, wait_for};
pub use predictive::{PredictiveCache, name_variations};
pub use result::ResultCache;
pub use shared::{SharedCache, SqliteSharedCache};

use crate::ml::ModelVariant;
use bizclass_types::ClassificationRequest;
use sha2::{Digest, Sha256};

/// Lowercase, trimmed, whitespace collapsed
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strip scheme, `www.` and trailing slashes so equivalent URLs collide
fn normalize_url(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme)
        .trim_end_matches('/')
        .to_string()
}

/// Feed one optional field as presence tag, byte length, then bytes, so no
/// two field sequences hash the same input.
fn hash_field(hasher: &mut Sha256, field: Option<&str>) {
    match field {
        None => hasher.update([0u8]),
        Some(value) => {
            hasher.update([1u8]);
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
    }
}

/// Deterministic cache key for a request.
///
/// Built from the normalized business name, description, website URL and
/// any supplied website text. The model variant is part of the key so fast
/// and full results never mix.
pub fn fingerprint(request: &ClassificationRequest, variant: ModelVariant) -> String {
    let mut hasher = Sha256::new();
    hash_field(&mut hasher, Some(variant.as_str()));
    hash_field(&mut hasher, Some(&normalize(&request.business_name)));
    hash_field(&mut hasher, request.description.as_deref().map(normalize).as_deref());
    hash_field(&mut hasher, request.website_url.as_deref().map(normalize_url).as_deref());
    hash_field(&mut hasher, request.website_text.as_deref().map(normalize).as_deref());
    format!("{}:{:x}", variant.as_str(), hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_normalizes() {
        let a = ClassificationRequest::new("Joe's Pizza").with_website("https://www.joes.com/");
        let b = ClassificationRequest::new("  joe's   PIZZA ").with_website("http://joes.com");
        assert_eq!(
            fingerprint(&a, ModelVariant::Full),
            fingerprint(&b, ModelVariant::Full)
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_fields_and_variant() {
        let base = ClassificationRequest::new("Joe's Pizza");
        let described = base.clone().with_description("pizza");
        assert_ne!(
            fingerprint(&base, ModelVariant::Full),
            fingerprint(&described, ModelVariant::Full)
        );
        assert_ne!(
            fingerprint(&base, ModelVariant::Full),
            fingerprint(&base, ModelVariant::Fast)
        );
        assert!(fingerprint(&base, ModelVariant::Fast).starts_with("fast:"));
    }

    #[test]
    fn test_fingerprint_ignores_request_id() {
        let a = ClassificationRequest::new("Acme").with_request_id("1");
        let b = ClassificationRequest::new("Acme").with_request_id("2");
        assert_eq!(
            fingerprint(&a, ModelVariant::Full),
            fingerprint(&b, ModelVariant::Full)
        );
    }

    #[test]
    fn test_fingerprint_separator_in_field_does_not_collide() {
        let a = ClassificationRequest::new("a|b");
        let b = ClassificationRequest::new("a").with_description("b|");
        assert_ne!(
            fingerprint(&a, ModelVariant::Full),
            fingerprint(&b, ModelVariant::Full)
        );

        let shifted = ClassificationRequest::new("a").with_website("b");
        assert_ne!(
            fingerprint(&ClassificationRequest::new("a").with_description("b"), ModelVariant::Full),
            fingerprint(&shifted, ModelVariant::Full)
        );
    }

    #[test]
    fn test_fingerprint_empty_field_differs_from_missing() {
        let missing = ClassificationRequest::new("Acme");
        let empty = ClassificationRequest::new("Acme").with_description("");
        assert_ne!(
            fingerprint(&missing, ModelVariant::Full),
            fingerprint(&empty, ModelVariant::Full)
        );
    }

    #[test]
    fn test_fingerprint_includes_supplied_website_text() {
        let mut a = ClassificationRequest::new("Acme");
        a.website_text = Some("wood fired pizza".into());
        let mut b = ClassificationRequest::new("Acme");
        b.website_text = Some("tax preparation".into());
        assert_ne!(
            fingerprint(&a, ModelVariant::Full),
            fingerprint(&b, ModelVariant::Full)
        );
    }
}
