//! Wikipedia search via the MediaWiki action API.

use crate::config::WikipediaSettings;
use crate::error::{EnkelError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SERVICE: &str = "wikipedia";

/// An encyclopedia that turns a free-text query into summary text.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Search and return one block of summary text for the best hits.
    async fn search(&self, query: &str) -> Result<String>;
}

/// Client for the MediaWiki search and extracts APIs.
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
    top_k_results: u32,
    max_chars: usize,
    retry: RetryPolicy,
}

impl WikipediaClient {
    /// Create a client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_settings(&WikipediaSettings::default(), RetryPolicy::default())
    }

    pub fn with_settings(settings: &WikipediaSettings, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("enkel/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            top_k_results: settings.top_k_results,
            max_chars: settings.max_chars,
            retry,
        })
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<String> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        response.text().await.map_err(map_http_error)
    }

    /// Titles of the top search hits.
    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.top_k_results.to_string();
        let body = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        parse_search_titles(&body)
    }

    /// Plain-text introduction of one page, if it exists.
    async fn fetch_extract(&self, title: &str) -> Result<Option<(String, String)>> {
        let body = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        parse_extract(&body)
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<String> {
        let titles = self
            .retry
            .run("Wikipedia search", move || self.search_titles(query))
            .await?;

        if titles.is_empty() {
            return Err(EnkelError::external(
                SERVICE,
                format!("no search results for '{}'", query),
                false,
            ));
        }
        debug!("Wikipedia hits: {:?}", titles);

        let mut summaries = Vec::new();
        for title in &titles {
            let extract = self
                .retry
                .run("Wikipedia extract", move || self.fetch_extract(title))
                .await?;
            if let Some((page_title, summary)) = extract {
                summaries.push(format_page(&page_title, &summary));
            }
        }

        if summaries.is_empty() {
            return Err(EnkelError::external(
                SERVICE,
                format!("no page summaries found for '{}'", query),
                false,
            ));
        }

        info!("Fetched {} Wikipedia summaries", summaries.len());
        Ok(truncate_chars(&summaries.join("\n\n"), self.max_chars))
    }
}

fn map_http_error(err: reqwest::Error) -> EnkelError {
    if err.is_timeout() {
        return EnkelError::DeadlineExceeded("wikipedia request timed out".to_string());
    }
    let transient = err.is_connect()
        || err
            .status()
            .is_some_and(|s| s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS);
    EnkelError::external(SERVICE, err.to_string(), transient)
}

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    query: Option<Q>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

fn decode<Q: serde::de::DeserializeOwned>(body: &str) -> Result<Option<Q>> {
    let response: ApiResponse<Q> = serde_json::from_str(body)
        .map_err(|e| EnkelError::external(SERVICE, format!("unexpected response: {}", e), false))?;
    if let Some(error) = response.error {
        return Err(EnkelError::external(
            SERVICE,
            format!("{}: {}", error.code, error.info),
            false,
        ));
    }
    Ok(response.query)
}

fn parse_search_titles(body: &str) -> Result<Vec<String>> {
    let query: Option<SearchQuery> = decode(body)?;
    Ok(query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

fn parse_extract(body: &str) -> Result<Option<(String, String)>> {
    let query: Option<ExtractQuery> = decode(body)?;
    Ok(query.and_then(|q| {
        q.pages
            .into_iter()
            .filter(|page| !page.missing)
            .find_map(|page| {
                let extract = page.extract?.trim().to_string();
                (!extract.is_empty()).then_some((page.title, extract))
            })
    }))
}

fn format_page(title: &str, summary: &str) -> String {
    format!("Page: {}\nSummary: {}", title, summary)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_titles() {
        let body = r#"{
            "batchcomplete": true,
            "query": {
                "searchinfo": {"totalhits": 2},
                "search": [
                    {"ns": 0, "title": "Python (programming language)", "pageid": 23862},
                    {"ns": 0, "title": "History of Python", "pageid": 5118}
                ]
            }
        }"#;

        let titles = parse_search_titles(body).unwrap();
        assert_eq!(titles, vec!["Python (programming language)", "History of Python"]);
    }

    #[test]
    fn test_parse_search_without_hits() {
        let body = r#"{"batchcomplete": true, "query": {"searchinfo": {"totalhits": 0}, "search": []}}"#;
        assert!(parse_search_titles(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"error": {"code": "nosrsearch", "info": "The \"srsearch\" parameter must be set."}}"#;
        let err = parse_search_titles(body).unwrap_err();
        assert!(err.to_string().contains("nosrsearch"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_extract() {
        let body = r#"{
            "batchcomplete": true,
            "query": {
                "pages": [{
                    "pageid": 23862,
                    "ns": 0,
                    "title": "Python (programming language)",
                    "extract": "Python is a high-level, general-purpose programming language.\nIts design philosophy emphasizes code readability."
                }]
            }
        }"#;

        let (title, extract) = parse_extract(body).unwrap().unwrap();
        assert_eq!(title, "Python (programming language)");
        assert_eq!(extract.lines().count(), 2);
    }

    #[test]
    fn test_parse_missing_page() {
        let body = r#"{"query": {"pages": [{"ns": 0, "title": "Nope", "missing": true}]}}"#;
        assert!(parse_extract(body).unwrap().is_none());
    }

    #[test]
    fn test_format_and_truncate() {
        let page = format_page("Rust", "Rust is a language.");
        assert_eq!(page, "Page: Rust\nSummary: Rust is a language.");

        assert_eq!(truncate_chars("åäöabc", 4), "åäöa");
        assert_eq!(truncate_chars("short", 4000), "short");
    }

    #[test]
    fn test_client_from_settings() {
        let client = WikipediaClient::with_settings(&WikipediaSettings::default(), RetryPolicy::none()).unwrap();
        assert_eq!(client.top_k_results, 3);
        assert_eq!(client.max_chars, 4000);
    }
}
