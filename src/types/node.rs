use std::collections::BTreeMap;

/// Element attributes, kept sorted so serialization is deterministic
pub type Attributes = BTreeMap<String, String>;

/// A node of the generic hypertext tree shared by every markup dialect.
///
/// Children order is significant and preserved by every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: String,
        attributes: Attributes,
        children: Vec<Node>,
    },
    Text(String),
    /// Cross-reference to another document of the wiki, by title
    Link { target: String, children: Vec<Node> },
    Codeblock {
        code: String,
        language: Option<String>,
    },
}

impl Node {
    pub fn element(tag: &str, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            attributes: Attributes::new(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Add an attribute; a no-op on anything but an element
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } | Node::Link { children, .. } => children,
            Node::Text(_) | Node::Codeblock { .. } => &[],
        }
    }

    /// Levels of nesting, counting this node as one. Walks with an explicit
    /// stack so it is safe on trees of any depth.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Codeblock { code, .. } => out.push_str(code),
            Node::Element { children, .. } | Node::Link { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}
