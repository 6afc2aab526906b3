use crate::types::Node;
use crate::utils::decode_component;

use super::parser::Line;

pub const LINK_REL: &str = "noopener noreferrer";

/// Fold parsed Gemtext lines into a hypertext tree.
///
/// Consecutive list items, quote lines and preformatted lines are coalesced
/// into the block opened last.
pub fn build(lines: &[Line]) -> Vec<Node> {
    let mut tree: Vec<Node> = Vec::with_capacity(lines.len());
    for line in lines {
        match line {
            Line::Text(text) if text.is_empty() => tree.push(line_break()),
            Line::Text(text) => tree.push(Node::element("p", vec![Node::text(text)])),
            Line::Link { href: None, .. } => tree.push(line_break()),
            Line::Link {
                href: Some(href),
                title,
            } => tree.push(link_block(href, title.as_deref())),
            Line::Preformatted { text, alt, opens } => match tree.last_mut() {
                Some(Node::Codeblock { code, .. }) if !opens => {
                    code.push('\n');
                    code.push_str(text);
                }
                _ => tree.push(Node::Codeblock {
                    code: text.clone(),
                    language: alt.clone(),
                }),
            },
            Line::Heading { level, text } => {
                let tag = format!("h{level}");
                tree.push(Node::element(&tag, vec![Node::text(text)]));
            }
            Line::ListItem(text) => append_to(&mut tree, "ul", Node::element("li", vec![Node::text(text)])),
            Line::Quote(text) => append_to(&mut tree, "blockquote", Node::element("div", vec![Node::text(text)])),
        }
    }
    tree
}

fn line_break() -> Node {
    Node::element("br", Vec::new())
}

fn link_block(href: &str, title: Option<&str>) -> Node {
    let link = match href.strip_prefix('#') {
        Some(reference) => {
            let target = decode_component(reference);
            let label = title.map(str::to_string).unwrap_or_else(|| target.clone());
            Node::Link {
                target,
                children: vec![Node::text(label)],
            }
        }
        None => Node::element("a", vec![Node::text(title.unwrap_or(href))])
            .with_attr("target", "_blank")
            .with_attr("rel", LINK_REL)
            .with_attr("href", href),
    };
    Node::element("div", vec![link])
}

/// Append `child` to the trailing `tag` element, opening one if needed
fn append_to(tree: &mut Vec<Node>, tag: &str, child: Node) {
    if tree.last().and_then(Node::tag) != Some(tag) {
        tree.push(Node::element(tag, Vec::new()));
    }
    if let Some(Node::Element { children, .. }) = tree.last_mut() {
        children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemtext::parse;
    use pretty_assertions::assert_eq;

    fn build_text(text: &str) -> Vec<Node> {
        build(&parse(text))
    }

    fn p(text: &str) -> Node {
        Node::element("p", vec![Node::text(text)])
    }

    #[test]
    fn test_text_and_blank_lines() {
        assert_eq!(build_text("hello\n\ngemini\n"), vec![p("hello"), line_break(), p("gemini")]);
    }

    #[test]
    fn test_external_link() {
        let tree = build_text("=>  http://example.com  Example Website");
        let anchor = Node::element("a", vec![Node::text("Example Website")])
            .with_attr("href", "http://example.com")
            .with_attr("rel", "noopener noreferrer")
            .with_attr("target", "_blank");
        assert_eq!(tree, vec![Node::element("div", vec![anchor])]);
    }

    #[test]
    fn test_external_link_text_defaults_to_href() {
        let tree = build_text("=>http://example.com/?q=a%20b");
        assert_eq!(tree[0].children()[0].text_content(), "http://example.com/?q=a%20b");
    }

    #[test]
    fn test_internal_link_is_decoded() {
        let tree = build_text("=> #Hello%20Gemini");
        assert_eq!(tree, vec![Node::element("div", vec![Node::Link {
            target: "Hello Gemini".into(),
            children: vec![Node::text("Hello Gemini")],
        }])]);
    }

    #[test]
    fn test_incomplete_links_become_breaks() {
        assert_eq!(build_text("=>\n=> "), vec![line_break(), line_break()]);
    }

    #[test]
    fn test_preformatted_lines_join() {
        let tree = build_text("before\n```gemini\n# hello\n\nworld\n```\nafter");
        assert_eq!(tree, vec![
            p("before"),
            Node::Codeblock {
                code: "# hello\n\nworld".into(),
                language: Some("gemini".into()),
            },
            p("after"),
        ]);
    }

    #[test]
    fn test_adjacent_fences_stay_separate() {
        let tree = build_text("```\na\n```\n```\nb\n```");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_headings() {
        let tree = build_text("#h1\n## h2\n###h3");
        let tags: Vec<_> = tree.iter().filter_map(Node::tag).collect();
        assert_eq!(tags, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_list_items_coalesce() {
        let tree = build_text("* a\n* b\n\n* c");
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].tag(), Some("ul"));
        assert_eq!(tree[0].children().len(), 2);
        assert_eq!(tree[2].children().len(), 1);
    }

    #[test]
    fn test_quote_lines_one_child_each() {
        let tree = build_text("quote\n>a\n> b\nby foo");
        assert_eq!(tree, vec![
            p("quote"),
            Node::element("blockquote", vec![
                Node::element("div", vec![Node::text("a")]),
                Node::element("div", vec![Node::text(" b")]),
            ]),
            p("by foo"),
        ]);
    }
}
