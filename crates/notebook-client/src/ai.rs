//! HTTP implementation of the AI service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use notebook_core::file_safety::check_size;
use notebook_core::{
    defaults, AiService, Error, Extraction, Mindmap, Quiz, Result, UploadFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::fallback::FallbackChain;
use crate::response::{check_status, log_completion, read_json};

/// AI service client: text generation endpoints plus document extraction
/// across a primary and a fallback endpoint.
#[derive(Debug, Clone)]
pub struct HttpAiService {
    client: Client,
    ai_base_url: String,
    extract_base_url: String,
    extract_chain: FallbackChain<String>,
    extract_timeout: Duration,
    max_upload_bytes: u64,
}

/// Extraction endpoint response.
#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pages: Option<u32>,
}

impl HttpAiService {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            ai_base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            extract_base_url: config.extract_base_url.trim_end_matches('/').to_string(),
            extract_chain: FallbackChain::new(vec![
                defaults::EXTRACT_PRIMARY_PATH.to_string(),
                defaults::EXTRACT_FALLBACK_PATH.to_string(),
            ]),
            extract_timeout: config.extract_timeout(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Replace the extraction endpoints (paths relative to the extraction base URL).
    pub fn with_extract_endpoints(mut self, paths: Vec<String>) -> Self {
        self.extract_chain = FallbackChain::new(paths);
        self
    }

    /// POST `{content}` to a generation endpoint and return the field named `key`.
    async fn generate(&self, path: &str, key: &str, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "Please enter some content first".to_string(),
            ));
        }

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}{}", self.ai_base_url, path))
            .json(&json!({ "content": text }))
            .send()
            .await?;
        let mut body = read_json(check_status(response).await?).await?;
        log_completion(path, start);

        match body.get_mut(key).map(Value::take) {
            None | Some(Value::Null) => Err(Error::InvalidResponse(format!(
                "response from {} has no {}",
                path, key
            ))),
            // Some backends return the structure as JSON text.
            Some(Value::String(raw)) if key != "summary" => serde_json::from_str(&raw)
                .map_err(|e| Error::Parse(format!("{} is not valid JSON: {}", key, e))),
            Some(value) => Ok(value),
        }
    }

    async fn extract_once(&self, path: String, file: &UploadFile) -> Result<Extraction> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| Error::Validation(format!("invalid content type: {}", e)))?;
        let form = Form::new().part(defaults::UPLOAD_FIELD, part);

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}{}", self.extract_base_url, path))
            .timeout(self.extract_timeout)
            .multipart(form)
            .send()
            .await?;
        let body = read_json(check_status(response).await?).await?;
        log_completion(&path, start);

        let parsed: ExtractResponse = serde_json::from_value(body)?;
        let text = parsed
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidResponse("No text extracted from document".to_string()))?;

        Ok(Extraction {
            text,
            suggested_title: parsed.title.filter(|t| !t.trim().is_empty()),
            page_count: parsed.pages,
            endpoint: path,
        })
    }
}

#[async_trait]
impl AiService for HttpAiService {
    #[instrument(skip(self, text), fields(subsystem = "ai", component = "http_ai", op = "summarize", input_len = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let value = self.generate(defaults::SUMMARIZE_PATH, "summary", text).await?;
        match value {
            Value::String(summary) if !summary.trim().is_empty() => {
                debug!(response_len = summary.len(), "Summary generated");
                Ok(summary)
            }
            _ => Err(Error::InvalidResponse("No summary received".to_string())),
        }
    }

    #[instrument(skip(self, text), fields(subsystem = "ai", component = "http_ai", op = "generate_quiz", input_len = text.len()))]
    async fn generate_quiz(&self, text: &str) -> Result<Quiz> {
        let value = self.generate(defaults::QUIZ_PATH, "quiz", text).await?;
        if !value.is_object() {
            return Err(Error::InvalidResponse("quiz is not an object".to_string()));
        }
        let mut quiz: Quiz = serde_json::from_value(value)?;
        if !quiz.has_any_section() {
            return Err(Error::InvalidResponse(
                "quiz has no mcq, true_false or fill_blank section".to_string(),
            ));
        }
        let dropped = quiz.sanitize();
        if dropped > 0 {
            warn!(dropped, "Dropped inconsistent quiz questions");
        }
        debug!(questions = quiz.question_count(), "Quiz generated");
        Ok(quiz)
    }

    #[instrument(skip(self, text), fields(subsystem = "ai", component = "http_ai", op = "generate_mindmap", input_len = text.len()))]
    async fn generate_mindmap(&self, text: &str) -> Result<Mindmap> {
        let value = self.generate(defaults::MINDMAP_PATH, "mindmap", text).await?;
        if !value.is_object() {
            return Err(Error::InvalidResponse("mindmap is not an object".to_string()));
        }
        let mindmap: Mindmap = serde_json::from_value(value)?;
        if !mindmap.is_valid() {
            return Err(Error::InvalidResponse(
                "mindmap has no central topic".to_string(),
            ));
        }
        debug!(branches = mindmap.branches.len(), "Mind map generated");
        Ok(mindmap)
    }

    #[instrument(skip(self, file), fields(subsystem = "ai", component = "http_ai", op = "extract_text", payload_bytes = file.size()))]
    async fn extract_text(&self, file: &UploadFile) -> Result<Extraction> {
        check_size(&file.bytes, self.max_upload_bytes)?;

        // One bound covers the primary attempt and the fallback together.
        let extraction = tokio::time::timeout(
            self.extract_timeout,
            self.extract_chain.run(|path| self.extract_once(path, file)),
        )
        .await
        .map_err(|_| {
            warn!(timeout_secs = self.extract_timeout.as_secs(), "Text extraction timed out");
            Error::Network("extraction timed out".to_string())
        })??;
        info!(
            endpoint = %extraction.endpoint,
            response_len = extraction.text.len(),
            pages = ?extraction.page_count,
            "Text extracted"
        );
        Ok(extraction)
    }

    #[instrument(skip(self), fields(subsystem = "ai", component = "http_ai", op = "health_check"))]
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}{}", self.ai_base_url, defaults::STATUS_PATH))
            .timeout(Duration::from_secs(defaults::HEALTH_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                debug!("AI service health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "AI service health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "AI service health check error");
                Ok(false)
            }
        }
    }
}
