//! Gemtext parsing, tree building and rendering

mod builder;
mod parser;
mod references;
mod renderer;

pub use builder::{LINK_REL, build};
pub use parser::{Line, parse};
pub use references::LinkReferences;
pub use renderer::{GemtextRenderer, render};

use crate::types::Node;

/// Parse Gemtext and build its hypertext tree
pub fn to_hypertext(text: &str) -> Vec<Node> {
    build(&parse(text))
}
