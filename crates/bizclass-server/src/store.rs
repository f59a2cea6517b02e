// crates/bizclass-server/src/store.rs
// Taxonomy store seam: the queryable collaborator behind strategies and codes

use crate::db::DatabasePool;
use crate::db::taxonomy::{
    CodeRow, CrosswalkRow, KeywordRow, PatternRow, TopicRow, all_keywords_sync, all_topics_sync,
    codes_for_industry_sync, codes_for_keywords_sync, crosswalk_sync, match_keywords_sync,
    match_patterns_sync,
};
use crate::error::Result;
use crate::fuzzy::{TrigramEntry, TrigramIndex, TrigramMatch};
use async_trait::async_trait;
use bizclass_types::CodeType;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Read-only access to the industry taxonomy.
///
/// All list arguments are sent in one batched query per call.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Exact keyword hits plus phrase hits inside `phrase_text`
    async fn match_keywords(&self, keywords: &[String], phrase_text: &str)
    -> Result<Vec<KeywordRow>>;

    /// Trigram similarity search over the keyword table
    async fn similar_keywords(&self, keywords: &[String], threshold: f64)
    -> Result<Vec<TrigramMatch>>;

    async fn topic_mappings(&self) -> Result<Vec<TopicRow>>;

    async fn match_patterns(&self, pairs: &[(String, String)]) -> Result<Vec<PatternRow>>;

    async fn codes_for_industry(
        &self,
        industry: &str,
        code_type: CodeType,
        limit: usize,
    ) -> Result<Vec<CodeRow>>;

    async fn codes_for_keywords(
        &self,
        keywords: &[String],
        phrase_text: &str,
        code_type: CodeType,
        limit: usize,
    ) -> Result<Vec<CodeRow>>;

    async fn crosswalk(&self, from: &[(CodeType, String)], to: CodeType)
    -> Result<Vec<CrosswalkRow>>;
}

/// SQLite-backed store with an in-memory trigram index refreshed on a TTL
pub struct SqliteTaxonomyStore {
    pool: Arc<DatabasePool>,
    trigram: RwLock<TrigramIndex>,
    index_ttl: Duration,
}

impl SqliteTaxonomyStore {
    pub fn new(pool: Arc<DatabasePool>, index_ttl: Duration) -> Self {
        Self {
            pool,
            trigram: RwLock::new(TrigramIndex::default()),
            index_ttl,
        }
    }

    pub fn pool(&self) -> &Arc<DatabasePool> {
        &self.pool
    }

    /// Drop the trigram index so the next search reloads it
    pub async fn invalidate_index(&self) {
        self.trigram.write().await.invalidate();
    }

    async fn ensure_trigram_index(&self) -> Result<()> {
        if !self.trigram.read().await.is_stale(self.index_ttl) {
            return Ok(());
        }

        let rows = self.pool.run(all_keywords_sync).await?;
        let entries: Vec<TrigramEntry> = rows
            .into_iter()
            .map(|r| TrigramEntry::new(r.keyword, r.industry, r.weight))
            .collect();

        let mut index = self.trigram.write().await;
        // Another task may have refreshed while we were loading
        if index.is_stale(self.index_ttl) {
            debug!(entries = entries.len(), "Trigram index refreshed");
            index.replace(entries);
        }
        Ok(())
    }
}

#[async_trait]
impl TaxonomyStore for SqliteTaxonomyStore {
    async fn match_keywords(
        &self,
        keywords: &[String],
        phrase_text: &str,
    ) -> Result<Vec<KeywordRow>> {
        let keywords = keywords.to_vec();
        let phrase_text = phrase_text.to_string();
        self.pool
            .run(move |conn| match_keywords_sync(conn, &keywords, &phrase_text))
            .await
    }

    async fn similar_keywords(
        &self,
        keywords: &[String],
        threshold: f64,
    ) -> Result<Vec<TrigramMatch>> {
        self.ensure_trigram_index().await?;
        Ok(self.trigram.read().await.search(keywords, threshold))
    }

    async fn topic_mappings(&self) -> Result<Vec<TopicRow>> {
        self.pool.run(all_topics_sync).await
    }

    async fn match_patterns(&self, pairs: &[(String, String)]) -> Result<Vec<PatternRow>> {
        let pairs = pairs.to_vec();
        self.pool
            .run(move |conn| match_patterns_sync(conn, &pairs))
            .await
    }

    async fn codes_for_industry(
        &self,
        industry: &str,
        code_type: CodeType,
        limit: usize,
    ) -> Result<Vec<CodeRow>> {
        let industry = industry.to_string();
        self.pool
            .run(move |conn| codes_for_industry_sync(conn, &industry, code_type, limit))
            .await
    }

    async fn codes_for_keywords(
        &self,
        keywords: &[String],
        phrase_text: &str,
        code_type: CodeType,
        limit: usize,
    ) -> Result<Vec<CodeRow>> {
        let keywords = keywords.to_vec();
        let phrase_text = phrase_text.to_string();
        self.pool
            .run(move |conn| {
                codes_for_keywords_sync(conn, &keywords, &phrase_text, code_type, limit)
            })
            .await
    }

    async fn crosswalk(
        &self,
        from: &[(CodeType, String)],
        to: CodeType,
    ) -> Result<Vec<CrosswalkRow>> {
        let from = from.to_vec();
        self.pool
            .run(move |conn| crosswalk_sync(conn, &from, to))
            .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::seed_default_taxonomy;
    use crate::error::ClassifierError;

    /// In-memory store loaded with the default taxonomy
    pub async fn seeded_store() -> Arc<SqliteTaxonomyStore> {
        let pool = Arc::new(DatabasePool::open_in_memory().await.unwrap());
        pool.interact(|conn| seed_default_taxonomy(conn).map(|_| ()))
            .await
            .unwrap();
        Arc::new(SqliteTaxonomyStore::new(pool, Duration::from_secs(300)))
    }

    /// Store whose every query fails
    pub struct FailingStore;

    fn unavailable<T>() -> Result<T> {
        Err(ClassifierError::Store("taxonomy unavailable".into()))
    }

    #[async_trait]
    impl TaxonomyStore for FailingStore {
        async fn match_keywords(&self, _: &[String], _: &str) -> Result<Vec<KeywordRow>> {
            unavailable()
        }
        async fn similar_keywords(&self, _: &[String], _: f64) -> Result<Vec<TrigramMatch>> {
            unavailable()
        }
        async fn topic_mappings(&self) -> Result<Vec<TopicRow>> {
            unavailable()
        }
        async fn match_patterns(&self, _: &[(String, String)]) -> Result<Vec<PatternRow>> {
            unavailable()
        }
        async fn codes_for_industry(&self, _: &str, _: CodeType, _: usize) -> Result<Vec<CodeRow>> {
            unavailable()
        }
        async fn codes_for_keywords(
            &self,
            _: &[String],
            _: &str,
            _: CodeType,
            _: usize,
        ) -> Result<Vec<CodeRow>> {
            unavailable()
        }
        async fn crosswalk(&self, _: &[(CodeType, String)], _: CodeType) -> Result<Vec<CrosswalkRow>> {
            unavailable()
        }
    }
}
