//! Natural-language to DSL translation via the external query-language service.

use crate::config::TranslatorConfig;
use crate::error::{Result, TranslateError};
use crate::query::dsl::{EntityParser, StructuredQuery, repair_dsl};
use crate::worker::Checkpoint;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Client side of the query-language service. One query in, one DSL string
/// out.
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    /// Whether the service can be reached right now.
    async fn connect(&self) -> bool;

    /// Translate free text into a backend-grammar string.
    async fn translate(&self, text: &str) -> std::result::Result<String, TranslateError>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    dsl: String,
}

/// Query-language service reached over HTTP.
///
/// `GET {endpoint}/health` probes reachability, `POST {endpoint}/query` with
/// `{"query": ...}` answers `{"dsl": ...}`.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TranslateError::from)?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .as_ref()
                .map(|endpoint| endpoint.trim_end_matches('/').to_string()),
        })
    }
}

#[async_trait]
impl QueryTranslator for HttpTranslator {
    async fn connect(&self) -> bool {
        let Some(endpoint) = &self.endpoint else {
            return false;
        };

        match self.client.get(format!("{endpoint}/health")).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "query-language service unhealthy");
                false
            }
            Err(error) => {
                tracing::warn!(%error, "query-language service unreachable");
                false
            }
        }
    }

    async fn translate(&self, text: &str) -> std::result::Result<String, TranslateError> {
        let endpoint = self.endpoint.as_ref().ok_or(TranslateError::NotConfigured)?;

        let response: TranslateResponse = self
            .client
            .post(format!("{endpoint}/query"))
            .json(&TranslateRequest { query: text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.dsl.trim().is_empty() {
            return Err(TranslateError::Empty);
        }
        Ok(response.dsl)
    }
}

/// Translation stage of a run: service call, dialect repair, entity parsing.
#[derive(Clone)]
pub struct QueryTranslation {
    translator: Arc<dyn QueryTranslator>,
    parser: Arc<dyn EntityParser>,
}

impl QueryTranslation {
    pub fn new(translator: Arc<dyn QueryTranslator>, parser: Arc<dyn EntityParser>) -> Self {
        Self { translator, parser }
    }

    /// Produce the structured query for `text`.
    ///
    /// `Ok(None)` means degraded mode: the service is unreachable, failed, or
    /// the DSL yielded no entities. Only cancellation is an error.
    pub async fn structured_query(
        &self,
        text: &str,
        checkpoint: &Checkpoint,
    ) -> Result<Option<StructuredQuery>> {
        if !self.translator.connect().await {
            tracing::info!("query-language service unavailable, skipping semantic backends");
            return Ok(None);
        }
        checkpoint.ensure_running()?;

        let started = Instant::now();
        let raw = match self.translator.translate(text).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, "query translation failed, skipping semantic backends");
                return Ok(None);
            }
        };

        let dsl = repair_dsl(&raw);
        tracing::info!(
            context = text,
            dsl = %dsl,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query translated"
        );

        let entities = self.parser.parse(&dsl);
        for (index, entity) in entities.iter().enumerate() {
            tracing::debug!(index, %entity, "query entity");
        }

        if entities.is_empty() {
            return Ok(None);
        }
        Ok(Some(StructuredQuery::new(entities)))
    }
}
