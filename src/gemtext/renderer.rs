//! Hypertext tree to Gemtext.
//!
//! Gemtext has no inline markup, so the renderer flattens inline content
//! into lines. Links that cannot stand on a line of their own are cited as
//! ` [n]` and listed as `=> href [n]` lines at the next flush point: before a
//! heading, paragraph, list or quote, and at the end of the document.

use std::io::{self, Write};

use log::trace;

use crate::types::Node;
use crate::utils::encode_component;

use super::references::LinkReferences;

/// How text nodes are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TextMode {
    /// Whitespace runs collapse to one space
    Flowing,
    /// Line structure is kept, blank lines are dropped
    Lines,
    /// Written as is, blank lines included
    Verbatim,
}

/// Scoped traversal state; each scope gets its own copy
#[derive(Debug, Clone)]
struct Context {
    prefix: String,
    quote_depth: usize,
    text_mode: TextMode,
    plain_block: bool,
}

impl Context {
    fn root() -> Self {
        Self {
            prefix: String::new(),
            quote_depth: 0,
            text_mode: TextMode::Flowing,
            plain_block: true,
        }
    }

    fn block(&self, plain: bool) -> Self {
        Self {
            plain_block: self.plain_block && plain,
            ..self.clone()
        }
    }

    fn quoted(&self) -> Self {
        let quote_depth = self.quote_depth + 1;
        Self {
            prefix: ">".repeat(quote_depth),
            quote_depth,
            text_mode: self.text_mode.max(TextMode::Lines),
            plain_block: self.plain_block,
        }
    }

    fn verbatim(&self) -> Self {
        Self {
            text_mode: TextMode::Verbatim,
            ..self.clone()
        }
    }
}

/// Position of a node among its siblings
#[derive(Debug, Clone, Copy)]
struct Siblings {
    index: usize,
    count: usize,
}

/// Renders hypertext trees as Gemtext
#[derive(Debug, Clone, Copy)]
pub struct GemtextRenderer {
    trace: bool,
    paragraph_spacing: bool,
}

impl Default for GemtextRenderer {
    fn default() -> Self {
        Self {
            trace: false,
            paragraph_spacing: true,
        }
    }
}

impl GemtextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every write and block decision at trace level
    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Separate consecutive paragraphs with a blank line.
    ///
    /// Trees built from Gemtext carry their blank lines explicitly and
    /// render back unchanged with spacing turned off.
    pub fn paragraph_spacing(mut self, enabled: bool) -> Self {
        self.paragraph_spacing = enabled;
        self
    }

    /// Render `nodes` as the children of an implicit plain container
    pub fn render<W: Write>(&self, nodes: &[Node], out: &mut W) -> io::Result<()> {
        let mut writer = Writer::new(out, *self);
        let ctx = Context::root();
        writer.visit_children(&ctx, nodes)?;
        writer.finish(&ctx)
    }

    pub fn render_to_string(&self, nodes: &[Node]) -> io::Result<String> {
        let mut buf = Vec::new();
        self.render(nodes, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Render with default options
pub fn render<W: Write>(nodes: &[Node], out: &mut W, trace: bool) -> io::Result<()> {
    GemtextRenderer::new().trace(trace).render(nodes, out)
}

struct Writer<'a, W: Write> {
    out: &'a mut W,
    options: GemtextRenderer,
    written: bool,
    /// Consecutive newlines at the end of the output so far
    newlines: usize,
    /// A paragraph or reference block closed and nothing has been written
    /// since; the next content is preceded by a blank line
    gap_pending: bool,
    /// Flowing text ended in whitespace not yet written
    pending_space: bool,
    references: LinkReferences,
}

impl<'a, W: Write> Writer<'a, W> {
    fn new(out: &'a mut W, options: GemtextRenderer) -> Self {
        Self {
            out,
            options,
            written: false,
            newlines: 0,
            gap_pending: false,
            pending_space: false,
            references: LinkReferences::new(),
        }
    }

    fn at_line_start(&self) -> bool {
        !self.written || self.newlines > 0
    }

    fn raw(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    fn nl(&mut self, why: &str) -> io::Result<()> {
        if self.options.trace {
            trace!("nl {why}");
        }
        self.raw("\n")?;
        self.written = true;
        self.newlines += 1;
        self.pending_space = false;
        Ok(())
    }

    fn soft_nl(&mut self, why: &str) -> io::Result<()> {
        if self.written && self.newlines == 0 {
            self.nl(why)?;
        }
        Ok(())
    }

    fn ensure_empty_line(&mut self, why: &str) -> io::Result<()> {
        if !self.written {
            return Ok(());
        }
        while self.newlines < 2 {
            self.nl(why)?;
        }
        Ok(())
    }

    fn take_gap(&mut self) -> io::Result<()> {
        if self.gap_pending && self.at_line_start() {
            self.gap_pending = false;
            self.ensure_empty_line("gap")?;
        }
        Ok(())
    }

    /// Write one line fragment (no line feeds), opening the line with the
    /// quote prefix when needed. Returns whether anything was written.
    fn write_segment(&mut self, ctx: &Context, segment: &str) -> io::Result<bool> {
        let mut segment = segment;
        if self.at_line_start() && !ctx.prefix.is_empty() {
            segment = segment.trim_start_matches([' ', '\t']);
            if segment.is_empty() {
                return Ok(false);
            }
            self.take_gap()?;
            self.raw(&ctx.prefix)?;
            self.raw(" ")?;
        } else {
            self.take_gap()?;
        }
        if self.options.trace {
            trace!("write prefix={:?} line={:?}", ctx.prefix, segment);
        }
        self.raw(segment)?;
        self.written = true;
        self.newlines = 0;
        self.gap_pending = false;
        self.pending_space = false;
        Ok(true)
    }

    /// Write a chunk line by line; empty lines are skipped
    fn write(&mut self, ctx: &Context, chunk: &str) -> io::Result<()> {
        let segments: Vec<&str> = chunk.split('\n').collect();
        let last = segments.len() - 1;
        for (i, segment) in segments.into_iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            if self.write_segment(ctx, segment)? && i < last {
                self.nl("line-end")?;
            }
        }
        Ok(())
    }

    /// Write text keeping every line, blank ones included
    fn write_verbatim(&mut self, ctx: &Context, text: &str) -> io::Result<()> {
        self.take_gap()?;
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.nl("verbatim")?;
            }
            if self.at_line_start() && !ctx.prefix.is_empty() {
                self.raw(&ctx.prefix)?;
                if !segment.is_empty() {
                    self.raw(" ")?;
                }
            } else if segment.is_empty() {
                continue;
            }
            self.raw(segment)?;
            self.written = true;
            self.newlines = 0;
            self.gap_pending = false;
        }
        Ok(())
    }

    fn block<F>(&mut self, ctx: &Context, name: &str, plain: bool, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self, &Context) -> io::Result<()>,
    {
        let inner = ctx.block(plain);
        if self.options.trace {
            trace!("block {name} plain={}", inner.plain_block);
        }
        body(self, &inner)?;
        self.soft_nl(name)
    }

    fn flush_references(&mut self, ctx: &Context) -> io::Result<()> {
        if self.references.pending() == 0 || ctx.quote_depth > 0 || !self.at_line_start() {
            return Ok(());
        }
        self.ensure_empty_line("linkrefs-pre")?;
        for (number, href) in self.references.flush() {
            self.write(ctx, &format!("=> {href} [{number}]"))?;
            self.nl("linkref-each")?;
        }
        self.gap_pending = true;
        Ok(())
    }

    fn finish(&mut self, ctx: &Context) -> io::Result<()> {
        self.soft_nl("document-end")?;
        self.flush_references(ctx)?;
        self.out.flush()
    }

    fn visit_children(&mut self, ctx: &Context, children: &[Node]) -> io::Result<()> {
        let count = children.len();
        for (index, child) in children.iter().enumerate() {
            self.visit(ctx, child, Siblings { index, count })?;
        }
        Ok(())
    }

    fn visit(&mut self, ctx: &Context, node: &Node, siblings: Siblings) -> io::Result<()> {
        match node {
            Node::Text(text) => self.visit_text(ctx, text),
            Node::Element { tag, children, .. } => self.visit_element(ctx, node, tag, children, siblings),
            Node::Link { target, children } => {
                let href = format!("#{}", encode_component(target));
                self.visit_anchor(ctx, &href, children, siblings)
            }
            Node::Codeblock { code, language } => self.visit_code(ctx, code, language.as_deref()),
        }
    }

    fn visit_text(&mut self, ctx: &Context, text: &str) -> io::Result<()> {
        if self.options.trace {
            trace!("text mode={:?} {:?}", ctx.text_mode, text);
        }
        match ctx.text_mode {
            TextMode::Flowing => {
                if text.starts_with(char::is_whitespace) {
                    self.pending_space = true;
                }
                for (i, word) in text.split_whitespace().enumerate() {
                    if (i > 0 || self.pending_space) && !self.at_line_start() {
                        self.write(ctx, " ")?;
                    }
                    self.write(ctx, word)?;
                }
                if text.ends_with(char::is_whitespace) {
                    self.pending_space = true;
                }
                Ok(())
            }
            TextMode::Lines => self.write(ctx, text),
            TextMode::Verbatim => self.write_verbatim(ctx, text),
        }
    }

    fn visit_element(
        &mut self,
        ctx: &Context,
        node: &Node,
        tag: &str,
        children: &[Node],
        siblings: Siblings,
    ) -> io::Result<()> {
        match tag {
            "br" => self.nl("br"),
            "h1" => self.visit_heading(ctx, tag, 1, children),
            "h2" => self.visit_heading(ctx, tag, 2, children),
            "h3" => self.visit_heading(ctx, tag, 3, children),
            "blockquote" => {
                self.flush_references(ctx)?;
                let quoted = ctx.quoted();
                self.block(&quoted, tag, false, |w, inner| w.visit_children(inner, children))
            }
            "div" => self.block(ctx, tag, true, |w, inner| w.visit_children(inner, children)),
            "li" => self.block(ctx, tag, false, |w, inner| {
                w.write(inner, "* ")?;
                w.visit_children(inner, children)
            }),
            "img" => self.visit_children(ctx, children),
            "a" => self.visit_anchor(ctx, node.attr("href").unwrap_or(""), children, siblings),
            "p" => {
                self.flush_references(ctx)?;
                self.block(ctx, tag, true, |w, inner| w.visit_children(inner, children))?;
                if self.options.paragraph_spacing {
                    self.gap_pending = true;
                }
                Ok(())
            }
            "ul" => {
                self.flush_references(ctx)?;
                self.block(ctx, tag, true, |w, inner| w.visit_children(inner, children))
            }
            "pre" => self.block(ctx, tag, false, |w, inner| {
                w.write(inner, "```\n")?;
                w.visit_children(&inner.verbatim(), children)?;
                w.soft_nl("pre-close")?;
                w.write(inner, "```")
            }),
            "head" | "script" | "style" => Ok(()),
            _ => self.visit_children(ctx, children),
        }
    }

    fn visit_heading(&mut self, ctx: &Context, tag: &str, level: usize, children: &[Node]) -> io::Result<()> {
        self.flush_references(ctx)?;
        self.block(ctx, tag, false, |w, inner| {
            w.write(inner, &"#".repeat(level))?;
            w.write(inner, " ")?;
            w.visit_children(inner, children)
        })
    }

    fn visit_code(&mut self, ctx: &Context, code: &str, language: Option<&str>) -> io::Result<()> {
        self.block(ctx, "codeblock", false, |w, inner| {
            w.write(inner, &format!("```{}\n", language.unwrap_or("")))?;
            w.write_verbatim(inner, code)?;
            w.soft_nl("pre-close")?;
            w.write(inner, "```")
        })
    }

    /// An anchor becomes a link line only when it is the sole child of a
    /// plain block, starts a line and holds nothing but text; otherwise its
    /// text is inlined and the target cited as a numbered reference.
    fn visit_anchor(&mut self, ctx: &Context, href: &str, children: &[Node], siblings: Siblings) -> io::Result<()> {
        let href = href.trim();
        let simple_text = match children {
            [Node::Text(text)] => Some(text.as_str()),
            _ => None,
        };
        if self.options.trace {
            trace!(
                "link plain={} simple={} sibling={}/{}",
                ctx.plain_block,
                simple_text.is_some(),
                siblings.index,
                siblings.count
            );
        }

        let standalone = ctx.plain_block && siblings.count == 1 && self.at_line_start();
        if let Some(text) = simple_text.filter(|_| standalone) {
            if href.is_empty() {
                return Ok(());
            }
            let label = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let label = label.as_str();
            let mut line = format!("=> {href}");
            if !label.is_empty() && label != href {
                line.push(' ');
                line.push_str(label);
            }
            self.soft_nl("link-pre")?;
            self.write(ctx, &line)?;
            return self.soft_nl("link-post");
        }

        self.visit_children(ctx, children)?;
        // Nothing to cite, so no number is spent on it
        if href.is_empty() {
            return Ok(());
        }
        let number = self.references.add(href);
        let citation = if self.at_line_start() {
            format!("[{number}]")
        } else {
            format!(" [{number}]")
        };
        self.write(ctx, &citation)
    }
}
