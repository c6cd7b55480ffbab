mod handler;

use crate::repositories::AuthorRepository;
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub struct AppState<AR: AuthorRepository> {
    author_repo: Arc<AR>,
}

impl<AR: AuthorRepository> AppState<AR> {
    pub fn new(author_repo: AR) -> Self {
        Self {
            author_repo: Arc::new(author_repo),
        }
    }
}

impl<AR: AuthorRepository> Clone for AppState<AR> {
    fn clone(&self) -> Self {
        Self {
            author_repo: Arc::clone(&self.author_repo),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<AR: AuthorRepository>(
        state: AppState<AR>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let router = Router::new()
            .nest("/api", api_routes())
            .fallback(handler::not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// The address actually bound, which differs from the configured one when
    /// port 0 was requested.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "listening");
        }
        axum::serve(self.listener, self.router)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

fn api_routes<AR: AuthorRepository>() -> Router<AppState<AR>> {
    Router::new()
        .route(
            "/authors",
            get(handler::list_authors::<AR>)
                .post(handler::create_author::<AR>)
                .put(handler::update_author::<AR>)
                .delete(handler::delete_author::<AR>)
                .fallback(handler::method_not_allowed),
        )
        .route(
            "/contact",
            post(handler::submit_contact).fallback(handler::method_not_allowed),
        )
}
