/// Deferred link references of a single render.
///
/// Numbers are 1-based and keep counting across flushes, so a number is
/// never reused within one document.
#[derive(Debug, Default)]
pub struct LinkReferences {
    hrefs: Vec<String>,
    flushed: usize,
}

impl LinkReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `href` and return the number it is cited as
    pub fn add(&mut self, href: &str) -> usize {
        self.hrefs.push(href.to_string());
        self.hrefs.len()
    }

    pub fn pending(&self) -> usize {
        self.hrefs.len() - self.flushed
    }

    /// Take every reference not yet flushed, in ascending number order
    pub fn flush(&mut self) -> Vec<(usize, String)> {
        let start = self.flushed;
        self.flushed = self.hrefs.len();
        self.hrefs[start..]
            .iter()
            .enumerate()
            .map(|(offset, href)| (start + offset + 1, href.clone()))
            .collect()
    }
}
