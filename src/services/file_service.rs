use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::WikiError;
use crate::services::ContentEngine;
use crate::types::Document;
use crate::utils::ensure_safe_path;

/// Extensions tried, in order, when a title has no exact file
const EXTENSIONS: [&str; 4] = ["gmi", "md", "txt", "html"];

/// Content engine over a directory of wiki documents
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        debug!("Creating FileStore with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    /// Find the file backing `title`, if any
    fn locate(&self, title: &str) -> Option<PathBuf> {
        let exact = self.base_dir.join(title);
        if exact.is_file() {
            return Some(exact);
        }
        EXTENSIONS
            .iter()
            .map(|ext| self.base_dir.join(format!("{title}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn read_file(&self, path: &Path) -> Result<String, WikiError> {
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read file {:?}: {}", path, e);
            WikiError::Io(e)
        })?;
        debug!("Read file {:?}, {} bytes", path, content.len());
        Ok(content)
    }
}

impl ContentEngine for FileStore {
    fn resolve_document(&self, title: &str) -> Result<Option<Document>, WikiError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        ensure_safe_path(title).inspect_err(|_| warn!("Rejected document path: {:?}", title))?;

        let Some(path) = self.locate(title) else {
            warn!("No document for title {:?} under {:?}", title, self.base_dir);
            return Ok(None);
        };

        let raw = self.read_file(&path)?;
        let (fields, body) = split_front_matter(&raw);
        let content_type = fields
            .get("type")
            .cloned()
            .unwrap_or_else(|| content_type_for(&path).to_string());

        let mut document = Document::new(
            fields.get("title").map(String::as_str).unwrap_or(title),
            body,
            content_type,
        );
        document.render_type = fields.get("gemini-render-type").cloned();
        document.mime_type = fields.get("gemini-mime-type").cloned();
        document.lang = fields.get("lang").cloned();
        if let Some(tags) = fields.get("tags") {
            document.tags = parse_tags(tags);
        }

        info!("Resolved {:?} to {:?} ({})", title, path, document.content_type);
        Ok(Some(document))
    }
}

/// Determine content type from a file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "gmi" | "gemini" => "text/gemini",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "txt" | "" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Split leading `---` delimited `key: value` fields from the body.
///
/// Without a closing delimiter the whole input is body.
pub fn split_front_matter(raw: &str) -> (BTreeMap<String, String>, &str) {
    let mut fields = BTreeMap::new();
    let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return (fields, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim() == "---" {
            return (fields, &rest[offset..]);
        }
        if let Some((key, value)) = line.split_once(':') {
            let mut value = value.trim();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            fields.insert(key.trim().to_ascii_lowercase(), value.to_string());
        }
    }
    (BTreeMap::new(), raw)
}

/// Parse a tag list: space separated, `[[multi word]]` for tags with spaces
pub fn parse_tags(field: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut rest = field.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("[[") {
            let (tag, remainder) = after.split_once("]]").unwrap_or((after, ""));
            tags.push(tag.to_string());
            rest = remainder.trim_start();
        } else {
            let (tag, remainder) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            tags.push(tag.to_string());
            rest = remainder.trim_start();
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_front_matter_fields() {
        let (fields, body) = split_front_matter("---\ntitle: \"Hello\"\nlang: ja\n---\n# Body\n");
        assert_eq!(fields.get("title").map(String::as_str), Some("Hello"));
        assert_eq!(fields.get("lang").map(String::as_str), Some("ja"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let raw = "---\ntitle: x\nno end";
        let (fields, body) = split_front_matter(raw);
        assert!(fields.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("a [[b c]]  d"), vec!["a", "b c", "d"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn test_resolves_by_extension() {
        let (_dir, store) = store_with(&[("HelloGemini.gmi", "# Hello\n"), ("Notes.md", "*hi*")]);
        let doc = store.resolve_document("HelloGemini").unwrap().unwrap();
        assert_eq!(doc.content_type, "text/gemini");
        assert_eq!(doc.title, "HelloGemini");
        assert_eq!(doc.text, "# Hello\n");

        let doc = store.resolve_document("Notes").unwrap().unwrap();
        assert_eq!(doc.content_type, "text/markdown");
    }

    #[test]
    fn test_front_matter_overrides() {
        let (_dir, store) = store_with(&[(
            "Page.txt",
            "---\ntype: text/gemini\ngemini-mime-type: text/plain\ngemini-render-type: text/html\nlang: ja\ntags: [[a b]] c\n---\nbody",
        )]);
        let doc = store.resolve_document("Page").unwrap().unwrap();
        assert_eq!(doc.content_type, "text/gemini");
        assert_eq!(doc.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(doc.render_type.as_deref(), Some("text/html"));
        assert_eq!(doc.lang.as_deref(), Some("ja"));
        assert_eq!(doc.tags, vec!["a b", "c"]);
        assert_eq!(doc.text, "body");
    }

    #[test]
    fn test_missing_document() {
        let (_dir, store) = store_with(&[]);
        assert!(store.resolve_document("Nothing").unwrap().is_none());
        assert!(store.resolve_document("").unwrap().is_none());
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, store) = store_with(&[]);
        assert!(matches!(store.resolve_document("../secret"), Err(WikiError::InvalidPath(_))));
    }
}
