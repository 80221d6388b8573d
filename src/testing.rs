//! In-process stand-ins for the external services, used by unit tests.

use crate::embedding::Embedder;
use crate::error::{EnkelError, Result};
use crate::rag::{ChatMessage, ChatModel, Completion, Role};
use crate::source::Encyclopedia;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const HASH_DIMENSIONS: usize = 64;

/// Deterministic bag-of-words embedder. Texts sharing words score as similar.
pub struct HashEmbedder {
    fail: bool,
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// An embedder whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of embed requests made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; HASH_DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % HASH_DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }

    fn record(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EnkelError::external("embedding", "stub failure", false));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.record()?;
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.record()?;
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        HASH_DIMENSIONS
    }
}

/// Chat model that answers with the context it was given.
pub struct EchoChatModel {
    silent: bool,
    calls: AtomicUsize,
    last_question: Mutex<Option<String>>,
}

impl EchoChatModel {
    pub fn new() -> Self {
        Self {
            silent: false,
            calls: AtomicUsize::new(0),
            last_question: Mutex::new(None),
        }
    }

    /// A model that replies without any text.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The human turn of the most recent prompt.
    pub fn last_question(&self) -> Option<String> {
        self.last_question.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for EchoChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let question = messages
            .iter()
            .find(|m| m.role == Role::Human)
            .map(|m| m.content.clone());
        *self.last_question.lock().unwrap() = question;

        if self.silent {
            return Ok(Completion::default());
        }

        let context = messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.split_once("Context: "))
            .map(|(_, context)| context.to_string());

        Ok(Completion {
            content: context,
            model: Some("echo".to_string()),
            usage: None,
        })
    }
}

/// Encyclopedia returning canned text.
pub struct StubEncyclopedia {
    text: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubEncyclopedia {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// An encyclopedia that is unreachable.
    pub fn failing() -> Self {
        Self {
            text: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay every search by `delay`.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encyclopedia for StubEncyclopedia {
    async fn search(&self, _query: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.text
            .clone()
            .ok_or_else(|| EnkelError::external("wikipedia", "stub failure", false))
    }
}

/// Build a PDF with one line of text on each page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    save(build_pdf(pages))
}

/// Build a one-page PDF whose trailer declares standard password security.
pub fn encrypted_pdf(text: &str) -> Vec<u8> {
    let mut doc = build_pdf(&[text]);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![1u8; 16]),
            Object::string_literal(vec![1u8; 16]),
        ],
    );
    save(doc)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn build_pdf(pages: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}
