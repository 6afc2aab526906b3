use std::str::FromStr;

use crate::errors::WikiError;
use crate::types::Document;
use crate::utils::base_mime_type;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Criterion {
    Type(String),
    Tag(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    negated: bool,
    criterion: Criterion,
}

/// Selects which documents may be served.
///
/// A whitespace separated list of `type:`, `tag:` and `prefix:` terms, each
/// optionally negated with `!`. A document must satisfy every term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    terms: Vec<Term>,
}

impl DocumentFilter {
    pub fn parse(expression: &str) -> Result<Self, WikiError> {
        let terms = expression
            .split_whitespace()
            .map(parse_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.terms.iter().all(|term| {
            let hit = match &term.criterion {
                Criterion::Type(mime) => base_mime_type(&document.content_type) == *mime,
                Criterion::Tag(tag) => document.tags.iter().any(|t| t == tag),
                Criterion::Prefix(prefix) => document.title.starts_with(prefix.as_str()),
            };
            hit != term.negated
        })
    }
}

impl FromStr for DocumentFilter {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_term(raw: &str) -> Result<Term, WikiError> {
    let (negated, body) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (key, value) = body
        .split_once(':')
        .filter(|(_, value)| !value.is_empty())
        .ok_or_else(|| WikiError::Config(format!("malformed filter term {raw:?}")))?;
    let criterion = match key {
        "type" => Criterion::Type(base_mime_type(value)),
        "tag" => Criterion::Tag(value.to_string()),
        "prefix" => Criterion::Prefix(value.to_string()),
        other => return Err(WikiError::Config(format!("unknown filter key {other:?}"))),
    };
    Ok(Term { negated, criterion })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn doc() -> Document {
        Document::new("Journal/2024", "", "text/gemini; lang=en").with_tags(["public", "log"])
    }

    #[rstest]
    #[case("", true)]
    #[case("type:text/gemini", true)]
    #[case("type:text/markdown", false)]
    #[case("tag:public", true)]
    #[case("!tag:draft", true)]
    #[case("!tag:log", false)]
    #[case("prefix:Journal/ tag:public", true)]
    #[case("prefix:Journal/ !type:text/gemini", false)]
    fn test_matches(#[case] expression: &str, #[case] expected: bool) {
        let filter: DocumentFilter = expression.parse().unwrap();
        assert_eq!(filter.matches(&doc()), expected);
    }

    #[rstest]
    #[case("colour:red")]
    #[case("tag:")]
    #[case("justaword")]
    fn test_invalid_terms(#[case] expression: &str) {
        assert!(matches!(DocumentFilter::parse(expression), Err(WikiError::Config(_))));
    }
}
