mod node;

use std::sync::Arc;

pub use node::{Attributes, Node};

use crate::config::Config;
use crate::services::ContentEngine;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ContentEngine>,
    pub config: Arc<Config>,
}

/// A wiki document as handed out by the content engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub text: String,
    /// Declared content type of `text`, e.g. `text/gemini`
    pub content_type: String,
    /// Explicit renderer override (`gemini-render-type`)
    pub render_type: Option<String>,
    /// Explicit response mime type override (`gemini-mime-type`)
    pub mime_type: Option<String>,
    pub lang: Option<String>,
    pub tags: Vec<String>,
}

impl Document {
    pub fn new(title: impl Into<String>, text: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            content_type: content_type.into(),
            render_type: None,
            mime_type: None,
            lang: None,
            tags: Vec::new(),
        }
    }

    pub fn with_render_type(mut self, render_type: impl Into<String>) -> Self {
        self.render_type = Some(render_type.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}
