pub mod file_service;
pub mod filter;
pub mod markdown_service;
pub mod memory_store;
pub mod render_service;

pub use file_service::FileStore;
pub use filter::DocumentFilter;
pub use markdown_service::MarkdownService;
pub use memory_store::MemoryStore;
pub use render_service::{RenderOptions, RenderPlan, RenderService, RenderedDocument, Renderer};

use log::debug;

use crate::errors::WikiError;
use crate::gemtext;
use crate::types::{Document, Node};
use crate::utils::base_mime_type;

/// Document storage and markup rendering provided by the host wiki
pub trait ContentEngine: Send + Sync {
    /// Look up a document by title; `Ok(None)` when nothing matches
    fn resolve_document(&self, title: &str) -> Result<Option<Document>, WikiError>;

    /// Render a document's markup to a hypertext tree
    fn render_to_hypertext(&self, document: &Document) -> Result<Vec<Node>, WikiError> {
        Ok(render_markup(document))
    }
}

/// Convert document markup to hypertext according to its content type.
///
/// Gemtext and Markdown are parsed; any other type is kept as
/// preformatted text.
pub fn render_markup(document: &Document) -> Vec<Node> {
    let content_type = base_mime_type(&document.content_type);
    debug!("Rendering '{}' as {} to hypertext", document.title, content_type);
    match content_type.as_str() {
        "text/gemini" => gemtext::to_hypertext(&document.text),
        "text/markdown" | "text/x-markdown" => MarkdownService::new().render(&document.text),
        _ => vec![Node::element("pre", vec![Node::text(document.text.as_str())])],
    }
}
