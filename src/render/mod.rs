//! Document previews for the comparison panes.
//!
//! A terminal cannot embed a PDF viewer, so a preview is the document's
//! structure (page count, title), a short text excerpt and a SHA-256
//! fingerprint that shows whether two versions are byte-identical.

use crate::storage::Origin;
use lopdf::{Document, Object};
use sha2::{Digest, Sha256};

/// Maximum excerpt lines kept per preview.
const EXCERPT_LINES: usize = 40;

/// Parsed preview of one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPreview {
    pub key: String,
    pub page_count: usize,
    pub title: Option<String>,
    pub excerpt: Vec<String>,
    pub size_bytes: usize,
    pub sha256: String,
    pub origin: Option<Origin>,
}

/// What a comparison pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Document(DocumentPreview),
    Placeholder { key: String, title: String, message: String },
}

impl Preview {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Preview::Placeholder { .. })
    }

    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            Preview::Document(doc) => Some(&doc.sha256),
            Preview::Placeholder { .. } => None,
        }
    }
}

/// Turn document bytes into a preview.
///
/// Missing bytes or bytes that do not parse as PDF yield a placeholder.
pub fn render(key: &str, bytes: Option<&[u8]>) -> Preview {
    let Some(bytes) = bytes else {
        return Preview::Placeholder {
            key: key.to_string(),
            title: "PDF Preview Not Available".to_string(),
            message: "Storage connection failed and no local fallback found".to_string(),
        };
    };

    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to parse document");
            return Preview::Placeholder {
                key: key.to_string(),
                title: "Error Loading PDF".to_string(),
                message: e.to_string(),
            };
        }
    };

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let excerpt = match doc.extract_text(&pages) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(EXCERPT_LINES)
            .map(String::from)
            .collect(),
        Err(e) => {
            tracing::debug!(key, error = %e, "no text extracted");
            Vec::new()
        }
    };

    Preview::Document(DocumentPreview {
        key: key.to_string(),
        page_count: pages.len(),
        title: document_title(&doc),
        excerpt,
        size_bytes: bytes.len(),
        sha256: fingerprint(bytes),
        origin: None,
    })
}

/// Render bytes fetched from storage, recording where they came from.
pub fn render_fetched(key: &str, fetched: Option<crate::storage::Fetched>) -> Preview {
    match fetched {
        Some(fetched) => match render(key, Some(&fetched.bytes)) {
            Preview::Document(mut doc) => {
                doc.origin = Some(fetched.origin);
                Preview::Document(doc)
            }
            placeholder => placeholder,
        },
        None => render(key, None),
    }
}

/// Hex SHA-256 of the raw bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Title from the document information dictionary, if any.
fn document_title(doc: &Document) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let title = info.get(b"Title").and_then(Object::as_str).ok()?;
    let title = String::from_utf8_lossy(title).trim().to_string();
    (!title.is_empty()).then_some(title)
}
