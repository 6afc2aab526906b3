use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::WikiError;
use crate::services::{DocumentFilter, RenderOptions, Renderer};

/// How much request detail is logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugLevel {
    #[default]
    None,
    Debug,
    /// Also traces every renderer decision
    Trace,
}

impl FromStr for DebugLevel {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(DebugLevel::None),
            "debug" => Ok(DebugLevel::Debug),
            "trace" => Ok(DebugLevel::Trace),
            other => Err(WikiError::Config(format!("unknown debug level {other:?}"))),
        }
    }
}

/// Application configuration and constants
#[derive(Debug, Clone)]
pub struct Config {
    pub wiki_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Only requests under this path are served; it is removed before routing
    pub path_prefix: Option<String>,
    /// Document served at `/`
    pub root_document: String,
    pub filter: Option<DocumentFilter>,
    pub debug_level: DebugLevel,
    pub default_renderer: Renderer,
    pub title_heading: bool,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            wiki_dir: PathBuf::from("wiki"),
            host: "127.0.0.1".to_string(),
            port: 1965,
            path_prefix: None,
            root_document: "HelloGemini".to_string(),
            filter: None,
            debug_level: DebugLevel::None,
            default_renderer: Renderer::Passthrough,
            title_heading: false,
        }
    }

    /// Create configuration with custom values
    pub fn with_custom(wiki_dir: PathBuf, port: Option<u16>, host: Option<String>) -> Self {
        let defaults = Self::new();
        Self {
            wiki_dir,
            port: port.unwrap_or(defaults.port),
            host: host.unwrap_or(defaults.host),
            ..defaults
        }
    }

    /// Load from `GEMWIKI_*` environment variables
    pub fn from_env() -> Result<Self, WikiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset or empty keys keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WikiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::new();

        if let Some(dir) = get("GEMWIKI_DIR") {
            config.wiki_dir = PathBuf::from(dir);
        }
        if let Some(host) = get("GEMWIKI_HOST") {
            config.host = host;
        }
        if let Some(port) = get("GEMWIKI_PORT") {
            config.port = port
                .parse()
                .map_err(|_| WikiError::Config(format!("invalid port {port:?}")))?;
        }
        if let Some(prefix) = get("GEMWIKI_PATH_PREFIX") {
            let prefix = prefix.trim_end_matches('/');
            if !prefix.is_empty() {
                config.path_prefix = Some(format!("/{}", prefix.trim_start_matches('/')));
            }
        }
        if let Some(root) = get("GEMWIKI_ROOT") {
            config.root_document = root;
        }
        if let Some(filter) = get("GEMWIKI_FILTER") {
            config.filter = Some(filter.parse()?);
        }
        if let Some(level) = get("GEMWIKI_DEBUG") {
            config.debug_level = level.parse()?;
        }
        if let Some(renderer) = get("GEMWIKI_DEFAULT_RENDERER") {
            config.default_renderer = renderer.parse()?;
        }
        if let Some(flag) = get("GEMWIKI_TITLE_HEADING") {
            config.title_heading = parse_flag(&flag)?;
        }
        Ok(config)
    }

    /// Get the address for binding
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// Path prefix, or the empty string
    pub fn prefix(&self) -> &str {
        self.path_prefix.as_deref().unwrap_or("")
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            default_renderer: self.default_renderer,
            link_prefix: format!("{}/t", self.prefix()),
            title_heading: self.title_heading,
            trace: self.debug_level == DebugLevel::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(value: &str) -> Result<bool, WikiError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(WikiError::Config(format!("invalid flag {other:?}"))),
    }
}
