use log::{debug, info, warn};

use crate::errors::WikiError;
use crate::response::Response;
use crate::router::{Request, Router};
use crate::services::RenderService;
use crate::types::{AppState, Document};
use crate::utils::decode_component;

/// Routes served by the wiki, in match order
pub fn wiki_router() -> Result<Router, WikiError> {
    Router::new()
        .route("root", r"^/$", handle_root)?
        .route("document", r"^/t/(.+)$", handle_document)?
        .route("document-index", r"^/t/?$", handle_redirect_root)
}

/// Serve the configured root document
pub fn handle_root(_request: &Request, _params: &[String], state: &AppState) -> Result<Response, WikiError> {
    let title = &state.config.root_document;
    match state.engine.resolve_document(title)? {
        Some(document) => serve_document(&document, state),
        None => {
            warn!("Root document '{}' not found", title);
            Ok(Response::not_found())
        }
    }
}

/// Send clients that strip the document title back to the root
pub fn handle_redirect_root(_request: &Request, _params: &[String], state: &AppState) -> Result<Response, WikiError> {
    let target = format!("{}/", state.config.prefix());
    debug!("Redirecting to {}", target);
    Ok(Response::redirect(target))
}

/// Serve a document by its percent-encoded title
pub fn handle_document(request: &Request, params: &[String], state: &AppState) -> Result<Response, WikiError> {
    let encoded = params.first().map(String::as_str).unwrap_or_default();
    let title = decode_component(encoded);
    info!("Document request received: '{}' ({})", title, request.path());

    let Some(document) = state.engine.resolve_document(&title)? else {
        warn!("Document '{}' not found", title);
        return Ok(Response::not_found());
    };
    if let Some(filter) = &state.config.filter {
        if !filter.matches(&document) {
            warn!("Document '{}' excluded by filter", title);
            return Ok(Response::not_found());
        }
    }
    serve_document(&document, state)
}

fn serve_document(document: &Document, state: &AppState) -> Result<Response, WikiError> {
    let service = RenderService::new(state.engine.clone(), state.config.render_options());
    let rendered = service.render(document)?;
    Ok(Response::success(rendered.mime_type, rendered.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::response::Status;
    use crate::services::{DocumentFilter, MemoryStore};

    fn state(config: Config) -> AppState {
        let store = MemoryStore::new()
            .with(Document::new("HelloGemini", "# Hello\n", "text/gemini").with_lang("en"))
            .with(Document::new("Draft Notes", "wip", "text/markdown").with_tags(["draft"]));
        AppState {
            engine: Arc::new(store),
            config: Arc::new(config),
        }
    }

    fn dispatch(path: &str, state: &AppState) -> Response {
        let router = wiki_router().unwrap();
        let request = Request::new(url::Url::parse(&format!("gemini://localhost{path}")).unwrap());
        let (route, params) = router
            .find_match(request.path(), state.config.path_prefix.as_deref())
            .expect("route");
        (route.handler)(&request, &params, state).unwrap()
    }

    #[test]
    fn test_root_document() {
        let response = dispatch("/", &state(Config::new()));
        assert_eq!(response.status, Status::Success);
        assert_eq!(response.meta, "text/gemini; lang=en");
        assert_eq!(response.body, b"# Hello\n");
    }

    #[test]
    fn test_document_title_is_decoded() {
        let response = dispatch("/t/Draft%20Notes", &state(Config::new()));
        assert_eq!(response.status, Status::Success);
        assert_eq!(response.meta, "text/markdown");
        assert_eq!(response.body, b"wip");
    }

    #[test]
    fn test_missing_document() {
        let response = dispatch("/t/Nope", &state(Config::new()));
        assert_eq!(response.status, Status::NotFound);
    }

    #[test]
    fn test_filter_hides_documents() {
        let mut config = Config::new();
        config.filter = Some(DocumentFilter::parse("!tag:draft").unwrap());
        let state = state(config);
        assert_eq!(dispatch("/t/Draft%20Notes", &state).status, Status::NotFound);
        assert_eq!(dispatch("/t/HelloGemini", &state).status, Status::Success);
    }

    #[test]
    fn test_bare_document_path_redirects() {
        let mut config = Config::new();
        config.path_prefix = Some("/wiki".into());
        let response = dispatch("/wiki/t/", &state(config));
        assert_eq!(response.status, Status::Redirect);
        assert_eq!(response.meta, "/wiki/");
    }
}
