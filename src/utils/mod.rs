use std::borrow::Cow;
use std::path::{Component, Path};

use crate::errors::WikiError;

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Reject paths that could leave the wiki directory
pub fn ensure_safe_path(path: &str) -> Result<(), WikiError> {
    let unsafe_component = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if unsafe_component || path.contains('\0') {
        return Err(WikiError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Percent-decode a link target or path segment.
///
/// Input that does not decode to UTF-8 is returned as is.
pub fn decode_component(text: &str) -> String {
    urlencoding::decode(text)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string())
}

/// Percent-encode a document name for use in a link
pub fn encode_component(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Mime type without parameters, lowercased: `text/gemini; lang=en` gives `text/gemini`
pub fn base_mime_type(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attr("say \"hi\" 'x'"), "say &quot;hi&quot; &#39;x&#39;");
    }

    #[rstest]
    #[case("HelloGemini", true)]
    #[case("notes/today", true)]
    #[case("../etc/passwd", false)]
    #[case("a/../../b", false)]
    #[case("/etc/passwd", false)]
    fn test_ensure_safe_path(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(ensure_safe_path(input).is_ok(), ok);
    }

    #[test]
    fn test_component_coding() {
        assert_eq!(decode_component("Hello%20Gemini"), "Hello Gemini");
        assert_eq!(decode_component("bad%FF"), "bad%FF");
        assert_eq!(encode_component("Hello Gemini"), "Hello%20Gemini");
    }

    #[test]
    fn test_base_mime_type() {
        assert_eq!(base_mime_type("Text/Gemini; lang=en"), "text/gemini");
        assert_eq!(base_mime_type("text/markdown"), "text/markdown");
    }
}
