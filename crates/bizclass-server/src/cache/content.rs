// crates/bizclass-server/src/cache/content.rs
// Request-scoped content: website text fetched at most once per request

use crate::context::ClassificationContext;
use crate::error::{ClassifierError, Result};
use async_trait::async_trait;
use bizclass_types::ClassificationRequest;
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Cap on website text fed into extraction
const MAX_WEBSITE_CHARS: usize = 20_000;

#[allow(clippy::expect_used)]
static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Reduce an HTML page to its visible text
pub fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let text = without_tags
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_WEBSITE_CHARS).collect()
}

/// Where website text comes from when the request didn't include it
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<String>>;
}

/// Never fetches; only text supplied with the request is used
pub struct NoContentSource;

#[async_trait]
impl ContentSource for NoContentSource {
    async fn fetch(&self, _url: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Fetches the page over HTTP and strips it to text
pub struct HttpContentSource {
    client: reqwest::Client,
}

impl HttpContentSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let target = if url.contains("://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        };
        let parsed = url::Url::parse(&target)
            .map_err(|e| ClassifierError::InvalidInput(format!("website_url: {}", e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(crate::ml::map_transport_error)?;
        if !response.status().is_success() {
            debug!(url = %target, status = %response.status(), "Website fetch returned non-success");
            return Ok(None);
        }
        let html = response.text().await?;
        Ok(Some(html_to_text(&html)))
    }
}

/// Content and derived context for a single request.
///
/// Every consumer in the request shares these cells, so the website is
/// fetched at most once and the context is built at most once. Dropped with
/// the request; nothing here outlives it.
pub struct RequestContent<'a> {
    request: &'a ClassificationRequest,
    source: &'a dyn ContentSource,
    fetch_timeout: Duration,
    website: OnceCell<Option<String>>,
    context: OnceCell<Arc<ClassificationContext>>,
    fetches: AtomicU32,
}

impl<'a> RequestContent<'a> {
    pub fn new(
        request: &'a ClassificationRequest,
        source: &'a dyn ContentSource,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            request,
            source,
            fetch_timeout,
            website: OnceCell::new(),
            context: OnceCell::new(),
            fetches: AtomicU32::new(0),
        }
    }

    /// Website text: supplied text wins, otherwise one fetch attempt
    pub async fn website_text(&self) -> Option<&str> {
        self.website
            .get_or_init(|| async {
                if let Some(text) = &self.request.website_text {
                    return Some(text.clone());
                }
                let url = self.request.website_url.as_deref()?;
                self.fetches.fetch_add(1, Ordering::Relaxed);
                match tokio::time::timeout(self.fetch_timeout, self.source.fetch(url)).await {
                    Ok(Ok(text)) => text,
                    Ok(Err(e)) => {
                        warn!(url = %url, error = %e, "Website fetch failed");
                        None
                    }
                    Err(_) => {
                        warn!(url = %url, "Website fetch timed out");
                        None
                    }
                }
            })
            .await
            .as_deref()
    }

    pub async fn context(&self) -> Arc<ClassificationContext> {
        self.context
            .get_or_init(|| async {
                let text = self.website_text().await;
                Arc::new(ClassificationContext::build(self.request, text))
            })
            .await
            .clone()
    }

    /// Network fetches actually attempted
    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::Relaxed)
    }
}
