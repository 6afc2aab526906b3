use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};

use crate::errors::WikiError;
use crate::gemtext::GemtextRenderer;
use crate::rewrite::rewrite_internal_links;
use crate::services::ContentEngine;
use crate::types::{Document, Node};
use crate::utils::{base_mime_type, encode_component, escape_attr, escape_html};

const MAX_TREE_DEPTH: usize = 256;

/// How a document body is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Text content of the hypertext tree
    PlainText,
    /// HTML serialization of the hypertext tree
    Html,
    /// Gemtext rendering of the hypertext tree
    Gemtext,
    /// Raw document text
    Passthrough,
}

impl Renderer {
    /// Renderer registered for a key (a mime type or `passthrough`)
    pub fn for_key(key: &str) -> Option<Self> {
        match base_mime_type(key).as_str() {
            "text/plain" => Some(Renderer::PlainText),
            "text/html" => Some(Renderer::Html),
            "text/gemini" => Some(Renderer::Gemtext),
            "passthrough" | "raw" => Some(Renderer::Passthrough),
            _ => None,
        }
    }

    /// Mime type of the output, if the renderer fixes one
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            Renderer::PlainText => Some("text/plain"),
            Renderer::Html => Some("text/html"),
            Renderer::Gemtext => Some("text/gemini"),
            Renderer::Passthrough => None,
        }
    }
}

impl FromStr for Renderer {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Renderer::for_key(s).ok_or_else(|| WikiError::Config(format!("unknown renderer {s:?}")))
    }
}

impl fmt::Display for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Renderer::PlainText => "text/plain",
            Renderer::Html => "text/html",
            Renderer::Gemtext => "text/gemini",
            Renderer::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

/// Chosen renderer and the mime type sent with its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub renderer: Renderer,
    pub mime_type: String,
}

impl RenderPlan {
    /// Pick the renderer and response mime type for `document`.
    ///
    /// The renderer override, else the content type, selects the renderer;
    /// `default` applies when no renderer is registered for that key. The
    /// mime type is the override, else the renderer's own type, else the
    /// content type, with the document language appended as `lang`.
    pub fn for_document(document: &Document, default: Renderer) -> Self {
        let key = document.render_type.as_deref().unwrap_or(&document.content_type);
        let renderer = Renderer::for_key(key).unwrap_or(default);

        let mut mime_type = document
            .mime_type
            .clone()
            .or_else(|| renderer.mime_type().map(str::to_string))
            .unwrap_or_else(|| document.content_type.clone());
        if let Some(lang) = &document.lang {
            mime_type.push_str("; lang=");
            mime_type.push_str(lang);
        }
        Self { renderer, mime_type }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Renderer for documents whose key has none registered
    pub default_renderer: Renderer,
    /// Path cross-references are rewritten under, e.g. `/t`
    pub link_prefix: String,
    /// Prefix passthrough Gemtext and Markdown with a `# title` line
    pub title_heading: bool,
    pub trace: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_renderer: Renderer::Passthrough,
            link_prefix: "/t".to_string(),
            title_heading: false,
            trace: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub mime_type: String,
    pub body: String,
}

/// Produces response bodies for documents of a content engine
#[derive(Clone)]
pub struct RenderService {
    engine: Arc<dyn ContentEngine>,
    options: RenderOptions,
}

impl RenderService {
    pub fn new(engine: Arc<dyn ContentEngine>, options: RenderOptions) -> Self {
        Self { engine, options }
    }

    pub fn render(&self, document: &Document) -> Result<RenderedDocument, WikiError> {
        let plan = RenderPlan::for_document(document, self.options.default_renderer);
        debug!(
            "Rendering '{}' ({}) with {} as {}",
            document.title, document.content_type, plan.renderer, plan.mime_type
        );

        let body = match plan.renderer {
            Renderer::Passthrough => self.passthrough(document),
            Renderer::PlainText => {
                let tree = self.hypertext(document)?;
                plain_text(&tree)
            }
            Renderer::Html => {
                let mut tree = self.hypertext(document)?;
                rewrite_internal_links(&mut tree, &self.options.link_prefix);
                html(&tree)
            }
            Renderer::Gemtext => {
                let mut tree = self.hypertext(document)?;
                rewrite_internal_links(&mut tree, &self.options.link_prefix);
                let from_gemtext = base_mime_type(&document.content_type) == "text/gemini";
                GemtextRenderer::new()
                    .trace(self.options.trace)
                    .paragraph_spacing(!from_gemtext)
                    .render_to_string(&tree)?
            }
        };

        info!("Rendered '{}': {} bytes of {}", document.title, body.len(), plan.mime_type);
        Ok(RenderedDocument {
            mime_type: plan.mime_type,
            body,
        })
    }

    /// The engine's tree for `document`, refused when nested too deeply for
    /// the recursive walks that follow
    fn hypertext(&self, document: &Document) -> Result<Vec<Node>, WikiError> {
        let tree = self.engine.render_to_hypertext(document)?;
        let depth = tree.iter().map(Node::depth).max().unwrap_or(0);
        if depth > MAX_TREE_DEPTH {
            return Err(WikiError::Render(format!(
                "'{}' nests {depth} levels deep, limit is {MAX_TREE_DEPTH}",
                document.title
            )));
        }
        Ok(tree)
    }

    fn passthrough(&self, document: &Document) -> String {
        let heading = self.options.title_heading
            && matches!(
                base_mime_type(&document.content_type).as_str(),
                "text/gemini" | "text/markdown" | "text/x-markdown"
            );
        if heading {
            format!("# {}\n{}", document.title, document.text)
        } else {
            document.text.clone()
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "pre", "hr", "table",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Text content with a line break after each block
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_plain(node, &mut out);
    }
    out
}

fn write_plain(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Codeblock { code, .. } => {
            out.push_str(code);
            out.push('\n');
        }
        Node::Link { children, .. } => children.iter().for_each(|child| write_plain(child, out)),
        Node::Element { tag, children, .. } => {
            if tag == "br" {
                out.push('\n');
                return;
            }
            children.iter().for_each(|child| write_plain(child, out));
            if BLOCK_TAGS.contains(&tag.as_str()) && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

/// Serialize a hypertext tree as an HTML fragment
pub fn html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_html(node, &mut out);
    }
    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_html(text)),
        Node::Codeblock { code, language } => {
            match language {
                Some(lang) => out.push_str(&format!("<pre><code class=\"language-{}\">", escape_attr(lang))),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_html(code));
            out.push_str("</code></pre>");
        }
        Node::Link { target, children } => {
            out.push_str(&format!("<a href=\"#{}\">", escape_attr(&encode_component(target))));
            children.iter().for_each(|child| write_html(child, out));
            out.push_str("</a>");
        }
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
            }
            out.push('>');
            if VOID_TAGS.contains(&tag.as_str()) {
                return;
            }
            children.iter().for_each(|child| write_html(child, out));
            out.push_str(&format!("</{tag}>"));
        }
    }
}
