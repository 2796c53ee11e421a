use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One translation exchange with a provider: the literal's inner text plus
/// the language pair it should be translated across.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResult {
    pub text: String,
    pub raw_provider_meta: BTreeMap<String, Value>,
}

/// Machine-readable result envelope emitted by the CLI under `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub status: String,
    pub phase: String,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Explicit endpoint override; empty/absent falls back to the env var
    /// below, then the provider's built-in default.
    pub endpoint: Option<String>,
    pub endpoint_env_var: String,
    pub api_key_env_var: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "libre".to_string(),
            endpoint: None,
            endpoint_env_var: "LITRANS_ENDPOINT".to_string(),
            api_key_env_var: "LITRANS_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    pub source: String,
    pub target: String,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            source: "pt".to_string(),
            target: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilesConfig {
    /// Default input path used when the CLI gets no positional argument.
    pub input: Option<String>,
    /// Default output path; absent means derive `{stem}_{target}.{ext}`
    /// from the input path.
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound on translation requests in flight for one line.
    /// 1 keeps the pipeline strictly sequential.
    pub max_in_flight: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_in_flight: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub languages: LanguagesConfig,
    pub files: FilesConfig,
    pub limits: LimitsConfig,
}
