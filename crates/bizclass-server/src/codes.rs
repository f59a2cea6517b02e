// crates/bizclass-server/src/codes.rs
// MCC/SIC/NAICS code generation for a classified industry
//
// Each code type is looked up as an independent task with its own deadline.
// Types that come back short are topped up from crosswalks of the codes the
// other types found directly.

use crate::config::Timeouts;
use crate::context::ClassificationContext;
use crate::error::{ClassifierError, Result};
use crate::store::TaxonomyStore;
use bizclass_types::{CodeSource, CodeType, GeneratedCode, IndustryCodes, IndustryScore};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Codes reported per type
pub const MAX_CODES_PER_TYPE: usize = 3;

/// Keyword-derived codes are trusted less than industry mappings
const KEYWORD_CODE_FACTOR: f64 = 0.8;

/// Secondary industries count half as much as the primary
const SECONDARY_FACTOR: f64 = 0.5;

pub struct CodeGenerator {
    store: Arc<dyn TaxonomyStore>,
    timeouts: Timeouts,
}

impl CodeGenerator {
    pub fn new(store: Arc<dyn TaxonomyStore>, timeouts: Timeouts) -> Self {
        Self { store, timeouts }
    }

    /// Generate up to three codes per type. Lookup failures and timeouts
    /// leave that type with whatever the other sources produced.
    pub async fn generate(
        &self,
        primary: &IndustryScore,
        secondary: &[IndustryScore],
        ctx: &ClassificationContext,
        token: &CancellationToken,
    ) -> IndustryCodes {
        let (mcc, sic, naics) = tokio::join!(
            self.bounded(CodeType::Mcc, token, self.direct(CodeType::Mcc, primary, secondary, ctx)),
            self.bounded(CodeType::Sic, token, self.direct(CodeType::Sic, primary, secondary, ctx)),
            self.bounded(
                CodeType::Naics,
                token,
                self.direct(CodeType::Naics, primary, secondary, ctx)
            ),
        );

        let mut codes = IndustryCodes::default();
        codes.set(CodeType::Mcc, mcc);
        codes.set(CodeType::Sic, sic);
        codes.set(CodeType::Naics, naics);

        let short: Vec<CodeType> = CodeType::ALL
            .into_iter()
            .filter(|t| codes.get(*t).len() < MAX_CODES_PER_TYPE)
            .collect();
        if short.is_empty() || codes.is_empty() || token.is_cancelled() {
            return codes;
        }

        let fills = futures::future::join_all(short.iter().map(|target| {
            let sources: Vec<&GeneratedCode> = CodeType::ALL
                .iter()
                .filter(|t| *t != target)
                .flat_map(|t| codes.get(*t))
                .collect();
            let fut = self.gap_fill(*target, sources, codes.get(*target));
            self.bounded(*target, token, fut)
        }))
        .await;

        for (target, filled) in short.into_iter().zip(fills) {
            if !filled.is_empty() {
                codes.set(target, filled);
            }
        }
        codes
    }

    async fn bounded<F>(
        &self,
        code_type: CodeType,
        token: &CancellationToken,
        fut: F,
    ) -> Vec<GeneratedCode>
    where
        F: Future<Output = Result<Vec<GeneratedCode>>>,
    {
        let deadline = self.timeouts.code_lookup();
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(ClassifierError::Cancelled),
            r = tokio::time::timeout(deadline, fut) => match r {
                Ok(r) => r,
                Err(_) => Err(ClassifierError::Store(format!(
                    "{} lookup timed out after {}ms",
                    code_type,
                    deadline.as_millis()
                ))),
            },
        };
        match outcome {
            Ok(codes) => codes,
            Err(ClassifierError::Cancelled) => Vec::new(),
            Err(e) => {
                warn!(code_type = %code_type, error = %e, "Code lookup failed");
                Vec::new()
            }
        }
    }

    /// Industry mappings first, then keyword mappings
    async fn direct(
        &self,
        code_type: CodeType,
        primary: &IndustryScore,
        secondary: &[IndustryScore],
        ctx: &ClassificationContext,
    ) -> Result<Vec<GeneratedCode>> {
        let mut found: Vec<GeneratedCode> = Vec::new();

        let industries = std::iter::once((primary, 1.0))
            .chain(secondary.iter().map(|s| (s, SECONDARY_FACTOR)));
        for (industry, factor) in industries {
            let rows = self
                .store
                .codes_for_industry(&industry.industry, code_type, MAX_CODES_PER_TYPE)
                .await?;
            found.extend(rows.into_iter().map(|row| GeneratedCode {
                code: row.code,
                code_type,
                description: row.description,
                source: CodeSource::IndustryLookup,
                confidence: row.weight * industry.confidence * factor,
            }));
        }

        let keyword_rows = match self
            .store
            .codes_for_keywords(
                &ctx.keyword_list(),
                ctx.phrase_text(),
                code_type,
                MAX_CODES_PER_TYPE,
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(code_type = ?code_type, error = %e, "Keyword code lookup failed, keeping industry codes");
                Vec::new()
            }
        };
        found.extend(keyword_rows.into_iter().map(|row| GeneratedCode {
            code: row.code,
            code_type,
            description: row.description,
            source: CodeSource::KeywordLookup,
            confidence: row.weight * KEYWORD_CODE_FACTOR,
        }));

        Ok(top_codes(found))
    }

    /// Fill `target` from crosswalks of codes found for the other types
    async fn gap_fill(
        &self,
        target: CodeType,
        sources: Vec<&GeneratedCode>,
        existing: &[GeneratedCode],
    ) -> Result<Vec<GeneratedCode>> {
        if sources.is_empty() {
            return Ok(existing.to_vec());
        }
        let keys: Vec<(CodeType, String)> = sources
            .iter()
            .map(|c| (c.code_type, c.code.clone()))
            .collect();
        let source_confidence: HashMap<(CodeType, &str), f64> = sources
            .iter()
            .map(|c| ((c.code_type, c.code.as_str()), c.confidence))
            .collect();

        let rows = self.store.crosswalk(&keys, target).await?;
        let mut merged = existing.to_vec();
        let before = merged.len();
        for row in rows {
            let base = source_confidence
                .get(&(row.from_type, row.from_code.as_str()))
                .copied()
                .unwrap_or(0.0);
            merged.push(GeneratedCode {
                code: row.to_code,
                code_type: target,
                description: row.description,
                source: CodeSource::CrosswalkGapfill,
                confidence: base * row.confidence,
            });
        }
        let merged = top_codes(merged);
        debug!(
            code_type = %target,
            before,
            after = merged.len(),
            "Crosswalk gap fill"
        );
        Ok(merged)
    }
}

/// Deduplicate by code keeping the most confident entry, best three first
fn top_codes(codes: Vec<GeneratedCode>) -> Vec<GeneratedCode> {
    let mut best: HashMap<String, GeneratedCode> = HashMap::new();
    for code in codes {
        match best.get(&code.code) {
            Some(existing) if existing.confidence >= code.confidence => {}
            _ => {
                best.insert(code.code.clone(), code);
            }
        }
    }
    let mut ranked: Vec<GeneratedCode> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.code.cmp(&b.code))
    });
    ranked.truncate(MAX_CODES_PER_TYPE);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CodeRow, CrosswalkRow, KeywordRow, PatternRow, TopicRow};
    use crate::fuzzy::TrigramMatch;
    use crate::store::test_support::seeded_store;
    use async_trait::async_trait;
    use bizclass_types::ClassificationRequest;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn industry(name: &str, confidence: f64) -> IndustryScore {
        IndustryScore {
            industry: name.into(),
            confidence,
            raw_score: confidence,
            contributions: BTreeMap::new(),
            reasoning: String::new(),
            ambiguous: false,
        }
    }

    fn ctx(name: &str) -> ClassificationContext {
        ClassificationContext::build(&ClassificationRequest::new(name), None)
    }

    fn code(code: &str, confidence: f64, source: CodeSource) -> GeneratedCode {
        GeneratedCode {
            code: code.into(),
            code_type: CodeType::Mcc,
            description: None,
            source,
            confidence,
        }
    }

    #[test]
    fn test_top_codes_dedups_and_limits() {
        let ranked = top_codes(vec![
            code("5812", 0.5, CodeSource::KeywordLookup),
            code("5812", 0.9, CodeSource::IndustryLookup),
            code("5814", 0.7, CodeSource::IndustryLookup),
            code("5811", 0.4, CodeSource::IndustryLookup),
            code("5499", 0.1, CodeSource::KeywordLookup),
        ]);
        let codes: Vec<&str> = ranked.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["5812", "5814", "5811"]);
        assert_eq!(ranked[0].source, CodeSource::IndustryLookup);
    }

    #[tokio::test]
    async fn test_restaurant_codes() {
        let generator = CodeGenerator::new(seeded_store().await, Timeouts::default());
        let codes = generator
            .generate(
                &industry("Restaurants", 0.95),
                &[],
                &ctx("Joe's Pizza Restaurant"),
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(codes.mcc[0].code, "5812");
        assert!(codes.mcc.len() <= MAX_CODES_PER_TYPE);
        assert_eq!(codes.sic[0].code, "5812");
        assert_eq!(codes.naics[0].code, "722511");
        assert!(
            CodeType::ALL
                .iter()
                .all(|t| codes.get(*t).iter().all(|c| c.code_type == *t))
        );
    }

    #[tokio::test]
    async fn test_unknown_industry_no_codes() {
        let generator = CodeGenerator::new(seeded_store().await, Timeouts::default());
        let codes = generator
            .generate(
                &industry("General Business", 0.35),
                &[],
                &ctx("ABC Corporation"),
                &CancellationToken::new(),
            )
            .await;
        assert!(codes.is_empty());
    }

    /// Only MCC has direct mappings; SIC and NAICS come from crosswalks.
    /// NAICS lookups hang.
    struct SparseStore {
        keyword_lookup_fails: bool,
    }

    #[async_trait]
    impl TaxonomyStore for SparseStore {
        async fn match_keywords(&self, _: &[String], _: &str) -> Result<Vec<KeywordRow>> {
            Ok(Vec::new())
        }
        async fn similar_keywords(&self, _: &[String], _: f64) -> Result<Vec<TrigramMatch>> {
            Ok(Vec::new())
        }
        async fn topic_mappings(&self) -> Result<Vec<TopicRow>> {
            Ok(Vec::new())
        }
        async fn match_patterns(&self, _: &[(String, String)]) -> Result<Vec<PatternRow>> {
            Ok(Vec::new())
        }
        async fn codes_for_industry(
            &self,
            _: &str,
            code_type: CodeType,
            _: usize,
        ) -> Result<Vec<CodeRow>> {
            match code_type {
                CodeType::Mcc => Ok(vec![CodeRow {
                    code_type,
                    code: "5812".into(),
                    description: Some("Eating Places".into()),
                    weight: 1.0,
                }]),
                CodeType::Naics => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Vec::new())
                }
                CodeType::Sic => Ok(Vec::new()),
            }
        }
        async fn codes_for_keywords(
            &self,
            _: &[String],
            _: &str,
            _: CodeType,
            _: usize,
        ) -> Result<Vec<CodeRow>> {
            if self.keyword_lookup_fails {
                return Err(ClassifierError::Store("keyword index offline".into()));
            }
            Ok(Vec::new())
        }
        async fn crosswalk(
            &self,
            from: &[(CodeType, String)],
            to: CodeType,
        ) -> Result<Vec<CrosswalkRow>> {
            Ok(from
                .iter()
                .filter(|(t, c)| *t == CodeType::Mcc && c == "5812")
                .map(|(t, c)| CrosswalkRow {
                    from_type: *t,
                    from_code: c.clone(),
                    to_type: to,
                    to_code: if to == CodeType::Sic { "5812" } else { "722511" }.into(),
                    description: None,
                    confidence: 0.5,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_gap_fill_and_per_type_deadline() {
        let timeouts = Timeouts {
            code_lookup_ms: 50,
            ..Timeouts::default()
        };
        let generator = CodeGenerator::new(
            Arc::new(SparseStore {
                keyword_lookup_fails: false,
            }),
            timeouts,
        );
        let codes = generator
            .generate(
                &industry("Restaurants", 0.8),
                &[],
                &ctx("Joe's"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(codes.mcc.len(), 1);
        assert_eq!(codes.sic.len(), 1);
        assert_eq!(codes.sic[0].source, CodeSource::CrosswalkGapfill);
        assert!((codes.sic[0].confidence - 0.4).abs() < 1e-9);
        // NAICS timed out on its direct lookup but is still filled
        assert_eq!(codes.naics[0].code, "722511");
    }

    #[tokio::test]
    async fn test_keyword_lookup_failure_keeps_industry_codes() {
        let timeouts = Timeouts {
            code_lookup_ms: 50,
            ..Timeouts::default()
        };
        let generator = CodeGenerator::new(
            Arc::new(SparseStore {
                keyword_lookup_fails: true,
            }),
            timeouts,
        );
        let codes = generator
            .generate(
                &industry("Restaurants", 0.8),
                &[],
                &ctx("Joe's"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(codes.mcc.len(), 1);
        assert_eq!(codes.mcc[0].code, "5812");
        assert_eq!(codes.mcc[0].source, CodeSource::IndustryLookup);
        assert_eq!(codes.sic[0].source, CodeSource::CrosswalkGapfill);
    }
}
