//! Text acquisition: which source a question is asked against and how its text is obtained.
//!
//! Two sources exist. A [`DataSource::Document`] question is answered from a single
//! uploaded PDF, supplied either directly with the request or through the upload
//! directory. A [`DataSource::Wikipedia`] question is answered from the summaries of a
//! live Wikipedia search for the question text.

mod pdf;
mod upload;
mod wikipedia;

pub use pdf::load_pages;
pub use upload::UploadDirectory;
pub use wikipedia::{Encyclopedia, WikipediaClient};

use crate::error::{EnkelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where the text for a question comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// An uploaded PDF document.
    Document,
    /// A Wikipedia search on the question.
    Wikipedia,
}

impl DataSource {
    /// All supported sources, in display order.
    pub const ALL: [DataSource; 2] = [DataSource::Document, DataSource::Wikipedia];
}

impl std::str::FromStr for DataSource {
    type Err = EnkelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" => Ok(DataSource::Document),
            "wikipedia" => Ok(DataSource::Wikipedia),
            _ => Err(EnkelError::UnsupportedSource(s.to_string())),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Document => write!(f, "document"),
            DataSource::Wikipedia => write!(f, "wikipedia"),
        }
    }
}

/// A validated question against one source.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub source: DataSource,
    pub question: String,
    /// Document supplied with the request; takes precedence over the upload directory.
    pub document: Option<UploadedDocument>,
}

impl QueryRequest {
    /// Validate raw user input. Fails before any external call is made.
    pub fn parse(source: &str, question: &str) -> Result<Self> {
        let source: DataSource = source.parse()?;
        Self::new(source, question)
    }

    /// Build a request for an already-typed source.
    pub fn new(source: DataSource, question: &str) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EnkelError::InvalidInput("question must not be empty".to_string()));
        }
        Ok(Self {
            source,
            question: question.to_string(),
            document: None,
        })
    }

    /// Attach the document to answer from.
    pub fn with_document(mut self, document: UploadedDocument) -> Self {
        self.document = Some(document);
        self
    }
}

/// A unit of raw text before chunking, such as one PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub content: String,
    pub source: Option<String>,
    /// Page number (1-based) for paged documents.
    pub page: Option<u32>,
}

impl TextUnit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
            page: None,
        }
    }

    /// One page of a named document.
    pub fn page(source: &str, page: u32, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: Some(source.to_string()),
            page: Some(page),
        }
    }

    /// Text returned by a Wikipedia search.
    pub fn wikipedia(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: Some("wikipedia".to_string()),
            page: None,
        }
    }
}

/// A document held in memory: the file name and its raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a document from disk.
    pub async fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok(Self { filename, bytes })
    }
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Somewhere uploaded documents can be found.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Names of the documents currently available.
    async fn list_available(&self) -> Result<Vec<String>>;

    /// Load a document by a name returned from [`list_available`](Self::list_available).
    async fn open(&self, name: &str) -> Result<UploadedDocument>;
}

#[async_trait]
impl DocumentSource for UploadedDocument {
    async fn list_available(&self) -> Result<Vec<String>> {
        Ok(vec![self.filename.clone()])
    }

    async fn open(&self, name: &str) -> Result<UploadedDocument> {
        if name == self.filename {
            Ok(self.clone())
        } else {
            Err(EnkelError::NoDocumentUploaded)
        }
    }
}

/// Load the one document a source holds; zero or several is an error.
pub async fn require_single(documents: &dyn DocumentSource) -> Result<UploadedDocument> {
    let names = documents.list_available().await?;
    match names.as_slice() {
        [] => Err(EnkelError::NoDocumentUploaded),
        [name] => documents.open(name).await,
        _ => Err(EnkelError::MultipleDocumentsUploaded(names.len())),
    }
}
