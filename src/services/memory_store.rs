use std::collections::BTreeMap;

use crate::errors::WikiError;
use crate::services::ContentEngine;
use crate::types::Document;

/// Content engine over documents held in memory, keyed by title
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: BTreeMap<String, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.insert(document.title.clone(), document);
    }

    pub fn with(mut self, document: Document) -> Self {
        self.insert(document);
        self
    }
}

impl ContentEngine for MemoryStore {
    fn resolve_document(&self, title: &str) -> Result<Option<Document>, WikiError> {
        Ok(self.documents.get(title).cloned())
    }
}
