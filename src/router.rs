//! Regular expression request routing

use log::debug;
use regex::Regex;
use url::Url;

use crate::errors::WikiError;
use crate::response::Response;
use crate::types::AppState;

/// A parsed Gemini request
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
}

impl Request {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Percent-encoded path of the request URL
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Handles a matched request; receives the route's captured groups in order
pub type Handler = fn(&Request, &[String], &AppState) -> Result<Response, WikiError>;

pub struct Route {
    pub name: &'static str,
    pub path: Regex,
    pub handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("path", &self.path.as_str())
            .finish()
    }
}

/// Ordered route table; the first matching route wins
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route after those already present
    pub fn route(mut self, name: &'static str, pattern: &str, handler: Handler) -> Result<Self, WikiError> {
        let path = Regex::new(pattern)?;
        debug!("Loading route {} ({})", name, pattern);
        self.routes.push(Route { name, path, handler });
        Ok(self)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the route for `path` and its captured parameters.
    ///
    /// With a `prefix`, paths outside it match nothing and the prefix is
    /// removed before matching. An empty remainder matches as `/`. Groups
    /// that did not participate in the match are passed as empty strings.
    pub fn find_match(&self, path: &str, prefix: Option<&str>) -> Option<(&Route, Vec<String>)> {
        let stripped = match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => path.strip_prefix(prefix)?,
            None => path,
        };
        let stripped = if stripped.is_empty() { "/" } else { stripped };

        self.routes.iter().find_map(|route| {
            route.path.captures(stripped).map(|captures| {
                let params = captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                (route, params)
            })
        })
    }
}
