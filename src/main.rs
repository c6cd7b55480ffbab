use author_store::config::Config;
use author_store::http::{AppState, HttpServer, HttpServerConfig};
use author_store::storage::JsonFileAuthorRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let author_repo = JsonFileAuthorRepository::open(config.authors_file()).await?;
    tracing::info!(path = %author_repo.path().display(), "using authors file");

    let state = AppState::new(author_repo);
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
