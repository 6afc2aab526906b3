use log::trace;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::types::Node;
use crate::utils::decode_component;

/// Service for turning Markdown into a hypertext tree
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownService;

impl MarkdownService {
    pub fn new() -> Self {
        Self
    }

    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);
        options
    }

    /// Fold the Markdown event stream into hypertext nodes.
    ///
    /// Relative links name other wiki documents and become `Node::Link`
    /// cross-references; absolute and rooted links stay anchors.
    pub fn render(&self, content: &str) -> Vec<Node> {
        let mut tree = TreeBuilder::default();
        for event in Parser::new_ext(content, Self::options()) {
            match event {
                Event::Start(tag) => tree.open(tag),
                Event::End(_) => tree.close(),
                Event::Text(text) => tree.text(&text),
                Event::Code(code) => tree.push(Node::element("code", vec![Node::text(code.to_string())])),
                Event::SoftBreak => tree.text("\n"),
                Event::HardBreak => tree.push(Node::element("br", Vec::new())),
                Event::Rule => tree.push(Node::element("hr", Vec::new())),
                Event::TaskListMarker(checked) => tree.text(if checked { "[x] " } else { "[ ] " }),
                Event::FootnoteReference(label) => tree.text(&format!("[{label}]")),
                other => trace!("Skipping markdown event {:?}", other),
            }
        }
        tree.finish()
    }
}

/// Deepest element nesting kept; anything below is flattened into the
/// innermost kept element
const MAX_NESTING: usize = 64;

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Node>,
    /// Start events past `MAX_NESTING` whose end is still to come
    flattened: usize,
}

impl TreeBuilder {
    fn open(&mut self, tag: Tag<'_>) {
        if self.open.len() >= MAX_NESTING {
            self.flattened += 1;
            return;
        }
        let node = match tag {
            Tag::Paragraph => Node::element("p", Vec::new()),
            Tag::Heading { level, .. } => Node::element(heading_tag(level), Vec::new()),
            Tag::BlockQuote => Node::element("blockquote", Vec::new()),
            Tag::CodeBlock(kind) => Node::Codeblock {
                code: String::new(),
                language: match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
            },
            Tag::List(None) => Node::element("ul", Vec::new()),
            Tag::List(Some(_)) => Node::element("ol", Vec::new()),
            Tag::Item => Node::element("li", Vec::new()),
            Tag::Emphasis => Node::element("em", Vec::new()),
            Tag::Strong => Node::element("strong", Vec::new()),
            Tag::Strikethrough => Node::element("del", Vec::new()),
            Tag::TableHead | Tag::TableRow => Node::element("div", Vec::new()),
            Tag::TableCell => {
                let row_started = self.open.last().is_some_and(|row| !row.children().is_empty());
                if row_started {
                    self.push(Node::text(" | "));
                }
                Node::element("td", Vec::new())
            }
            Tag::Link { dest_url, title, .. } => link_node(&dest_url, &title),
            Tag::Image { dest_url, title, .. } => {
                let img = Node::element("img", Vec::new()).with_attr("src", &*dest_url);
                if title.is_empty() { img } else { img.with_attr("title", &*title) }
            }
            _ => Node::element("div", Vec::new()),
        };
        self.open.push(node);
    }

    fn close(&mut self) {
        if self.flattened > 0 {
            self.flattened -= 1;
            return;
        }
        let Some(mut node) = self.open.pop() else {
            return;
        };
        if let Node::Codeblock { code, .. } = &mut node {
            if code.ends_with('\n') {
                code.pop();
            }
        }
        self.push(node);
    }

    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(Node::Element { children, .. } | Node::Link { children, .. }) => children.push(node),
            Some(Node::Codeblock { code, .. }) => code.push_str(&node.text_content()),
            Some(Node::Text(_)) | None => self.root.push(node),
        }
    }

    fn text(&mut self, text: &str) {
        self.push(Node::text(text));
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.open.is_empty() {
            self.close();
        }
        self.root
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// Relative destinations are wiki cross-references
fn link_node(dest: &str, title: &str) -> Node {
    let is_reference = !dest.is_empty()
        && !dest.starts_with('/')
        && !dest.starts_with('#')
        && url::Url::parse(dest).is_err();

    if is_reference {
        let decoded = decode_component(dest.trim_start_matches("./"));
        let target = [".md", ".gmi"]
            .iter()
            .find_map(|ext| decoded.strip_suffix(ext))
            .unwrap_or(decoded.as_str())
            .to_string();
        return Node::Link {
            target,
            children: Vec::new(),
        };
    }

    let anchor = Node::element("a", Vec::new()).with_attr("href", dest);
    if title.is_empty() { anchor } else { anchor.with_attr("title", title) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(content: &str) -> Vec<Node> {
        MarkdownService::new().render(content)
    }

    #[test]
    fn test_heading_and_paragraph() {
        let tree = render("# Title\n\nSome *em* text\n");
        assert_eq!(tree, vec![
            Node::element("h1", vec![Node::text("Title")]),
            Node::element("p", vec![
                Node::text("Some "),
                Node::element("em", vec![Node::text("em")]),
                Node::text(" text"),
            ]),
        ]);
    }

    #[test]
    fn test_relative_link_is_cross_reference() {
        let tree = render("[notes](Daily%20Notes.md)");
        assert_eq!(tree, vec![Node::element("p", vec![Node::Link {
            target: "Daily Notes".into(),
            children: vec![Node::text("notes")],
        }])]);
    }

    #[test]
    fn test_absolute_link_stays_anchor() {
        let tree = render("[site](gemini://example.org/ \"Example\")");
        let anchor = &tree[0].children()[0];
        assert_eq!(anchor.tag(), Some("a"));
        assert_eq!(anchor.attr("href"), Some("gemini://example.org/"));
        assert_eq!(anchor.attr("title"), Some("Example"));
    }

    #[test]
    fn test_fenced_code() {
        let tree = render("```rust\nfn main() {}\n\nlet x = 1;\n```\n");
        assert_eq!(tree, vec![Node::Codeblock {
            code: "fn main() {}\n\nlet x = 1;".into(),
            language: Some("rust".into()),
        }]);
    }

    #[test]
    fn test_lists_and_tasks() {
        let tree = render("- [x] done\n- open\n");
        assert_eq!(tree[0].tag(), Some("ul"));
        assert_eq!(tree[0].children().len(), 2);
        assert_eq!(tree[0].children()[0].text_content(), "[x] done");
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let tree = render(&format!("{} deep\n", ">".repeat(5000)));
        let depth = tree.iter().map(Node::depth).max().unwrap_or(0);
        assert!(depth <= MAX_NESTING + 1, "depth {depth}");
        assert!(tree.iter().any(|node| node.text_content().contains("deep")));
    }

    #[test]
    fn test_nesting_below_the_limit_is_kept() {
        let tree = render("> > > inner\n");
        assert_eq!(tree[0].depth(), 5);
    }

    #[test]
    fn test_table_cells_are_separated() {
        let tree = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(tree[0].text_content(), "a | b1 | 2");
        assert_eq!(tree[0].children().len(), 2);
    }
}
