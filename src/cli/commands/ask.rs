//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::source::{DataSource, QueryRequest, UploadDirectory, UploadedDocument};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    source: &str,
    file: Option<String>,
    model: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    // Reject bad input before touching the network
    let mut request = match QueryRequest::parse(source, question) {
        Ok(request) => request,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }
    if let Some(top_k) = top_k {
        settings.retrieval.top_k = top_k;
    }
    settings.validate()?;

    if let Some(path) = file {
        if request.source == DataSource::Wikipedia {
            Output::warning("--file is ignored for the wikipedia source.");
        } else {
            let document = UploadedDocument::from_path(&Settings::expand_path(&path)).await?;
            request = request.with_document(document);
        }
    }

    let uploads = UploadDirectory::new(settings.upload_dir());
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(match request.source {
        DataSource::Document => "Reading document...",
        DataSource::Wikipedia => "Searching Wikipedia...",
    });

    match orchestrator.get_answer(&request, &uploads).await {
        Ok(result) => {
            spinner.finish_and_clear();

            println!("\n{}\n", result.answer_or_default());

            if !result.context.is_empty() {
                Output::header("Sources");
                for source in &result.context {
                    Output::source(source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
