//! Gemwiki - serves a wiki over the Gemini protocol
//!
//! Documents are parsed into a generic hypertext tree and rendered back as
//! Gemtext, plain text or HTML, or passed through untouched.

pub mod config;
pub mod errors;
pub mod gemtext;
pub mod handlers;
pub mod logger;
pub mod response;
pub mod rewrite;
pub mod router;
pub mod server;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, DebugLevel};
pub use errors::WikiError;
pub use response::{Response, Status};
pub use rewrite::rewrite_internal_links;
pub use router::{Request, Router};
pub use services::{ContentEngine, DocumentFilter, FileStore, MemoryStore, RenderService, Renderer};
pub use types::{AppState, Document, Node};
