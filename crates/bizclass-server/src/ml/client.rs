// crates/bizclass-server/src/ml/client.rs
// HTTP client for the ML classification service

use super::{MlClient, MlPrediction, MlRequest, ModelVariant};
use crate::error::{ClassifierError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use tracing::debug;

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

pub struct HttpMlClient {
    client: Client,
    base_url: String,
}

impl HttpMlClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Map a transport error onto the classes the retry policy understands
pub(crate) fn map_transport_error(err: reqwest::Error) -> ClassifierError {
    if err.is_connect() {
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string().to_lowercase();
            if text.contains("dns") || text.contains("failed to lookup address") {
                return ClassifierError::Dns(err.to_string());
            }
            source = cause.source();
        }
        return ClassifierError::Connect(err.to_string());
    }
    ClassifierError::Http(err)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(ClassifierError::MlStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MlClient for HttpMlClient {
    async fn classify(&self, request: &MlRequest, variant: ModelVariant) -> Result<MlPrediction> {
        let url = match variant {
            ModelVariant::Full => self.endpoint("classify"),
            ModelVariant::Fast => self.endpoint("classify-fast"),
        };
        debug!(url = %url, business = %request.business_name, "Calling ML service");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<MlPrediction>()
            .await
            .map_err(ClassifierError::Http)
    }

    async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        let client = HttpMlClient::new(Client::new(), "http://ml.internal:9000/");
        assert_eq!(client.endpoint("health"), "http://ml.internal:9000/health");
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        let client = HttpMlClient::new(Client::new(), "http://127.0.0.1:1");
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ClassifierError::Connect(_)));
    }
}
