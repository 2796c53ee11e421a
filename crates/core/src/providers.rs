use crate::types::{TranslateRequest, TranslateResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider response invalid: {0}")]
    InvalidResponse(String),
}

/// Boundary to an external machine-translation service.
///
/// Every backend performs exactly one network exchange per call; batching,
/// caching, and retries are all outside this contract. Failures surface as
/// [`ProviderError`] and are handled fail-soft by the pipeline.
#[async_trait]
pub trait TranslatorProvider: Send + Sync {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError>;
}

#[async_trait]
impl<T> TranslatorProvider for Box<T>
where
    T: TranslatorProvider + ?Sized,
{
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        (**self).translate(req).await
    }
}

/// LibreTranslate-compatible REST backend: JSON POST to `/translate`.
#[derive(Debug, Clone)]
pub struct LibreProvider {
    pub endpoint: String,
    pub api_key: Option<String>,
    client: Client,
}

impl LibreProvider {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LibreRequestBody {
    q: String,
    source: String,
    target: String,
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

#[async_trait]
impl TranslatorProvider for LibreProvider {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        let payload = LibreRequestBody {
            q: req.text,
            source: req.source_lang,
            target: req.target_lang,
            format: "text".to_string(),
            api_key: self.api_key.clone(),
        };

        let request = self.client.post(&self.endpoint).json(&payload);
        let value = send_json(request).await?;
        let text = parse_libre_response(&value)?;

        let mut meta = BTreeMap::new();
        meta.insert("raw".to_string(), value);

        Ok(TranslateResult {
            text,
            raw_provider_meta: meta,
        })
    }
}

fn parse_libre_response(value: &Value) -> Result<String, ProviderError> {
    value
        .get("translatedText")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing string field `translatedText`".to_string())
        })
}

/// MyMemory community API backend: GET with `q` and `langpair` parameters.
#[derive(Debug, Clone)]
pub struct MyMemoryProvider {
    pub endpoint: String,
    client: Client,
}

impl MyMemoryProvider {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TranslatorProvider for MyMemoryProvider {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        let langpair = format!("{}|{}", req.source_lang, req.target_lang);
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", req.text.as_str()), ("langpair", langpair.as_str())]);

        let value = send_json(request).await?;
        let text = parse_mymemory_response(&value)?;

        let mut meta = BTreeMap::new();
        meta.insert("raw".to_string(), value);

        Ok(TranslateResult {
            text,
            raw_provider_meta: meta,
        })
    }
}

fn parse_mymemory_response(value: &Value) -> Result<String, ProviderError> {
    let status = value
        .get("responseStatus")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if status != 200 {
        return Err(ProviderError::InvalidResponse(format!(
            "mymemory responseStatus {status}"
        )));
    }
    value
        .get("responseData")
        .and_then(|data| data.get("translatedText"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse(
                "missing responseData.translatedText in mymemory response".to_string(),
            )
        })
}

/// Lingva backend: GET `{endpoint}/{source}/{target}/{text}` with the text
/// percent-encoded as a path segment.
#[derive(Debug, Clone)]
pub struct LingvaProvider {
    pub endpoint: String,
    client: Client,
}

impl LingvaProvider {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    fn request_url(&self, req: &TranslateRequest) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ProviderError::Request(format!("invalid lingva endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Request("lingva endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&req.source_lang)
            .push(&req.target_lang)
            .push(&req.text);
        Ok(url)
    }
}

#[async_trait]
impl TranslatorProvider for LingvaProvider {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        let url = self.request_url(&req)?;
        let value = send_json(self.client.get(url)).await?;
        let text = parse_lingva_response(&value)?;

        let mut meta = BTreeMap::new();
        meta.insert("raw".to_string(), value);

        Ok(TranslateResult {
            text,
            raw_provider_meta: meta,
        })
    }
}

fn parse_lingva_response(value: &Value) -> Result<String, ProviderError> {
    value
        .get("translation")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing string field `translation`".to_string())
        })
}

/// Web-endpoint Google Translate backend (`client=gtx`), no API key.
///
/// The response is a bare nested array; the translation is the concatenation
/// of the first element of each segment in `[0]`.
#[derive(Debug, Clone)]
pub struct GoogleWebProvider {
    pub endpoint: String,
    client: Client,
}

impl GoogleWebProvider {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TranslatorProvider for GoogleWebProvider {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("client", "gtx"),
            ("sl", req.source_lang.as_str()),
            ("tl", req.target_lang.as_str()),
            ("dt", "t"),
            ("q", req.text.as_str()),
        ]);

        let value = send_json(request).await?;
        let text = parse_google_response(&value)?;

        let mut meta = BTreeMap::new();
        meta.insert("raw".to_string(), value);

        Ok(TranslateResult {
            text,
            raw_provider_meta: meta,
        })
    }
}

fn parse_google_response(value: &Value) -> Result<String, ProviderError> {
    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing segment array in google response".to_string())
        })?;

    let mut text = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            text.push_str(piece);
        }
    }

    if text.is_empty() && !segments.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "google response segments carried no text".to_string(),
        ));
    }
    Ok(text)
}

/// Deterministic offline backend used by tests and as a no-network fallback:
/// uppercases the text so substitution is visible without a real service.
#[derive(Debug, Clone)]
pub struct MockProvider;

#[async_trait]
impl TranslatorProvider for MockProvider {
    async fn translate(&self, req: TranslateRequest) -> Result<TranslateResult, ProviderError> {
        let mut meta = BTreeMap::new();
        meta.insert("provider".to_string(), json!("mock"));

        Ok(TranslateResult {
            text: req.text.to_uppercase(),
            raw_provider_meta: meta,
        })
    }
}

async fn send_json(request: RequestBuilder) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Request(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Request(format!(
            "http status {} from provider",
            status
        )));
    }
    response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
