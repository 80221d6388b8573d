//! OpenAI client configuration and error mapping.

use crate::config::OpenAISettings;
use crate::error::{EnkelError, Result};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;

/// Create an OpenAI client from settings.
///
/// The API key comes from `OPENAI_API_KEY`. Every request carries the configured
/// timeout so a stalled call surfaces as [`EnkelError::DeadlineExceeded`].
pub fn create_client(settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let mut config = OpenAIConfig::default();
    if let Some(api_base) = &settings.api_base {
        config = config.with_api_base(api_base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Translate an async-openai error into the crate taxonomy.
pub fn map_error(service: &'static str, err: OpenAIError) -> EnkelError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            EnkelError::DeadlineExceeded(format!("{} request timed out", service))
        }
        OpenAIError::Reqwest(e) => {
            let transient = e.is_connect() || e.status().is_some_and(|s| s.is_server_error());
            EnkelError::external(service, e.to_string(), transient)
        }
        OpenAIError::ApiError(api) => {
            // Rate limits carry their kind in `code`; `type` names the exhausted quota
            let code = api.code.as_ref().map(|c| c.to_string()).unwrap_or_default();
            let kind = api.r#type.as_deref().unwrap_or_default();
            let transient = is_transient_api_kind(&code) || is_transient_api_kind(kind);
            EnkelError::external(service, api.message, transient)
        }
        other => EnkelError::external(service, other.to_string(), false),
    }
}

fn is_transient_api_kind(kind: &str) -> bool {
    kind.contains("rate_limit") || kind.contains("server_error") || kind.contains("overloaded")
}
