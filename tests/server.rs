use std::fs;
use std::sync::Arc;

use gemwiki::handlers::wiki_router;
use gemwiki::server::Server;
use gemwiki::{AppState, Config, DocumentFilter, FileStore, Status};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn wiki() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("HelloGemini.gmi", "---\nlang: ja\n---\n# Hello\n\n=> #Markdown%20Page Notes\n"),
        (
            "Markdown Page.md",
            "---\ngemini-render-type: text/gemini\ntags: public\n---\nRead [the guide](Guide.md) first.\n",
        ),
        ("Guide.md", "---\ntags: draft\n---\n# Guide\n"),
        ("raw.txt", "plain  text\n"),
    ];
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn server(dir: &TempDir, configure: impl FnOnce(&mut Config)) -> Server {
    let mut config = Config::with_custom(dir.path().to_path_buf(), None, None);
    configure(&mut config);
    let state = AppState {
        engine: Arc::new(FileStore::new(dir.path())),
        config: Arc::new(config),
    };
    Server::new(state, wiki_router().unwrap())
}

fn fetch(server: &Server, url: &str) -> String {
    String::from_utf8(server.handle_request(url).to_bytes()).unwrap()
}

#[test]
fn test_root_document_with_language() {
    let dir = wiki();
    let server = server(&dir, |_| {});
    assert_eq!(
        fetch(&server, "gemini://localhost/"),
        "20 text/gemini; lang=ja\r\n# Hello\n\n=> /t/Markdown%20Page Notes\n"
    );
}

#[test]
fn test_markdown_rendered_as_gemtext() {
    let dir = wiki();
    let server = server(&dir, |_| {});
    assert_eq!(
        fetch(&server, "gemini://localhost/t/Markdown%20Page"),
        "20 text/gemini\r\nRead the guide [1] first.\n\n=> /t/Guide [1]\n"
    );
}

#[test]
fn test_passthrough_by_default() {
    let dir = wiki();
    let server = server(&dir, |_| {});
    assert_eq!(fetch(&server, "gemini://localhost/t/Guide"), "20 text/markdown\r\n# Guide\n");
    assert_eq!(fetch(&server, "gemini://localhost/t/raw"), "20 text/plain\r\nplain  text\n");
}

#[test]
fn test_path_prefix() {
    let dir = wiki();
    let server = server(&dir, |config| config.path_prefix = Some("/wiki".into()));
    let root = fetch(&server, "gemini://localhost/wiki");
    assert!(root.starts_with("20 text/gemini; lang=ja\r\n"));
    assert!(root.contains("=> /wiki/t/Markdown%20Page Notes"));
    assert_eq!(server.handle_request("gemini://localhost/other/t/Guide").status, Status::NotFound);
    assert_eq!(fetch(&server, "gemini://localhost/wiki/t"), "31 /wiki/\r\n");
}

#[test]
fn test_filter_excludes_documents() {
    let dir = wiki();
    let server = server(&dir, |config| config.filter = Some(DocumentFilter::parse("!tag:draft").unwrap()));
    assert_eq!(fetch(&server, "gemini://localhost/t/Guide"), "51 Not found\r\n");
    assert!(fetch(&server, "gemini://localhost/t/Markdown%20Page").starts_with("20 "));
}

#[test]
fn test_request_errors() {
    let dir = wiki();
    let server = server(&dir, |_| {});
    assert_eq!(server.handle_request("gemini://localhost/t/Missing").status, Status::NotFound);
    assert_eq!(server.handle_request("https://localhost/").status.code(), 53);
    assert_eq!(server.handle_request("::not a url::").status.code(), 59);
    assert_eq!(server.handle_request("gemini://localhost/t/..%2Fsecret").status.code(), 59);
}

#[test]
fn test_missing_root_document() {
    let dir = wiki();
    let server = server(&dir, |config| config.root_document = "Nowhere".into());
    assert_eq!(fetch(&server, "gemini://localhost/"), "51 Not found\r\n");
}

#[tokio::test]
async fn test_connection_over_duplex_stream() {
    let dir = wiki();
    let server = server(&dir, |_| {});
    let (mut client, conn) = tokio::io::duplex(8192);
    let talk = async {
        client.write_all(b"gemini://localhost/t/Guide\r\n").await.unwrap();
        let mut reply = String::new();
        client.read_to_string(&mut reply).await.unwrap();
        reply
    };
    let (served, reply) = tokio::join!(server.handle_connection(conn), talk);
    served.unwrap();
    assert_eq!(reply, "20 text/markdown\r\n# Guide\n");
}
