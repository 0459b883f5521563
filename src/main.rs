//! Articulate Back binary entrypoint wiring REST, SSE, storage and question generation.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use articulate_back::{
    config::{AppConfig, StorageBackend, StorageConfig},
    dao::{
        kv_store::{KeyValueStore, file::FileStore, memory::MemoryStore},
        openai::OpenAiClient,
        storage::StorageError,
    },
    routes,
    services::{storage_supervisor, timer_service},
    state::{AppState, SharedState},
};
use axum::Router;
use futures::{FutureExt, future::BoxFuture};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let completion = OpenAiClient::new(
        config.completion.endpoint.clone(),
        config.completion.request_timeout,
    )
    .context("building completion client")?;
    let storage = config.storage.clone();

    let app_state = AppState::new(config, Arc::new(completion))
        .context("building initial game from configuration")?;

    let connect = backend_connector(storage);
    tokio::spawn(storage_supervisor::run(app_state.clone(), connect));
    tokio::spawn(timer_service::run(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

type Connect = BoxFuture<'static, Result<Arc<dyn KeyValueStore>, StorageError>>;

/// Build the connection factory used by the storage supervisor for the configured backend.
fn backend_connector(storage: StorageConfig) -> impl FnMut() -> Connect + Send + 'static {
    // Reconnects must keep the same in-memory data.
    let memory = match storage.quota_bytes {
        Some(quota) => MemoryStore::with_quota(quota),
        None => MemoryStore::new(),
    };

    move || -> Connect {
        match storage.backend {
            StorageBackend::Memory => {
                let memory = memory.clone();
                async move { Ok::<_, StorageError>(Arc::new(memory) as Arc<dyn KeyValueStore>) }
                    .boxed()
            }
            StorageBackend::File => {
                let directory = storage.directory.clone();
                async move {
                    let store = FileStore::open(directory).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn KeyValueStore>)
                }
                .boxed()
            }
            StorageBackend::Couch => connect_couch(),
        }
    }
}

#[cfg(feature = "couch-store")]
fn connect_couch() -> Connect {
    use articulate_back::dao::kv_store::couchdb::{CouchConfig, CouchKeyValueStore};

    async move {
        let config = CouchConfig::from_env()?;
        let store = CouchKeyValueStore::connect(config).await?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn KeyValueStore>)
    }
    .boxed()
}

#[cfg(not(feature = "couch-store"))]
fn connect_couch() -> Connect {
    async move {
        Err::<Arc<dyn KeyValueStore>, _>(StorageError::unavailable(
            "CouchDB support is not compiled in".into(),
            std::io::Error::other("couch-store feature disabled"),
        ))
    }
    .boxed()
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
