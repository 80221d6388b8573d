//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail at the first API call.

use crate::error::{EnkelError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering a question needs the API key.
    Ask,
    /// The web interface answers questions too.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ask | Operation::Serve => check_api_key(std::env::var("OPENAI_API_KEY").ok()),
    }
}

/// Check that an OpenAI API key is configured.
fn check_api_key(key: Option<String>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(EnkelError::Config(
            "OPENAI_API_KEY is empty. Set it in .env or with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(EnkelError::Config(
            "OPENAI_API_KEY not set. Set it in .env or with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
