use std::sync::LazyLock;

use regex::Regex;

/// One logical line of a Gemtext document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Plain text; an empty string is a blank line
    Text(String),
    /// `=>` line; `href` is `None` when the line carries no target
    Link {
        href: Option<String>,
        title: Option<String>,
    },
    /// A line inside a fenced region. `opens` marks the first line of the
    /// region, `alt` is the label that followed the opening fence.
    Preformatted {
        text: String,
        alt: Option<String>,
        opens: bool,
    },
    Heading { level: u8, text: String },
    ListItem(String),
    Quote(String),
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Fence,
    Link,
    Heading,
    ListItem,
    Quote,
}

const FENCE: &str = "```";

/// Line markers in priority order; the first match wins
static MARKERS: LazyLock<Vec<(Marker, Regex)>> = LazyLock::new(|| {
    [
        (Marker::Fence, r"^```"),
        (Marker::Link, r"^=>"),
        (Marker::Heading, r"^#{1,3}"),
        (Marker::ListItem, r"^\* "),
        (Marker::Quote, r"^>"),
    ]
    .into_iter()
    .map(|(marker, pattern)| (marker, Regex::new(pattern).expect("valid line marker pattern")))
    .collect()
});

#[derive(Default)]
struct State {
    preformatted: bool,
    alt: Option<String>,
    opened: bool,
}

/// Split Gemtext into typed lines.
///
/// Total over any input. A final line feed terminates the last line rather
/// than starting an empty one, and a carriage return before a line feed is
/// dropped.
///
/// An empty line is an empty `Text` line only outside a fence. Inside one it
/// stays an empty `Preformatted` line, so blank lines in code survive and
/// the fenced region is not split.
pub fn parse(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut state = State::default();

    for raw in body.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if state.preformatted {
            if line.starts_with(FENCE) {
                state = State::default();
            } else {
                lines.push(Line::Preformatted {
                    text: line.to_string(),
                    alt: state.alt.clone(),
                    opens: !state.opened,
                });
                state.opened = true;
            }
            continue;
        }

        if line.is_empty() {
            lines.push(Line::Text(String::new()));
            continue;
        }

        let matched = MARKERS
            .iter()
            .find_map(|(marker, re)| re.find(line).map(|m| (*marker, m.as_str(), &line[m.end()..])));

        match matched {
            Some((Marker::Fence, _, rest)) => {
                let alt = rest.trim();
                state.preformatted = true;
                state.opened = false;
                state.alt = (!alt.is_empty()).then(|| alt.to_string());
            }
            Some((Marker::Link, _, rest)) => lines.push(parse_link(rest)),
            Some((Marker::Heading, hashes, rest)) => lines.push(Line::Heading {
                level: hashes.len() as u8,
                text: rest.trim_start().to_string(),
            }),
            Some((Marker::ListItem, _, rest)) => lines.push(Line::ListItem(rest.trim_start().to_string())),
            Some((Marker::Quote, _, rest)) => lines.push(Line::Quote(rest.to_string())),
            None => lines.push(Line::Text(line.to_string())),
        }
    }
    lines
}

fn parse_link(rest: &str) -> Line {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return Line::Link { href: None, title: None };
    }
    match trimmed.split_once(char::is_whitespace) {
        Some((href, title)) => {
            let title = title.trim();
            Line::Link {
                href: Some(href.to_string()),
                title: (!title.is_empty()).then(|| title.to_string()),
            }
        }
        None => Line::Link {
            href: Some(trimmed.to_string()),
            title: None,
        },
    }
}
