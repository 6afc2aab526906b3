use std::sync::Arc;

use gemwiki::handlers::wiki_router;
use gemwiki::logger::Logger;
use gemwiki::server::Server;
use gemwiki::services::FileStore;
use gemwiki::{AppState, Config, WikiError};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), WikiError> {
    if let Err(e) = Logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = Config::from_env().inspect_err(|e| error!("{}", e))?;
    if !config.wiki_dir.is_dir() {
        error!("Wiki directory {:?} does not exist", config.wiki_dir);
        return Err(WikiError::Config(format!("missing wiki directory {:?}", config.wiki_dir)));
    }
    info!(
        "Serving {:?} (root '{}', prefix '{}')",
        config.wiki_dir,
        config.root_document,
        config.prefix()
    );

    let state = AppState {
        engine: Arc::new(FileStore::new(config.wiki_dir.clone())),
        config: Arc::new(config),
    };
    let server = Arc::new(Server::new(state, wiki_router()?));
    server.listen().await
}
