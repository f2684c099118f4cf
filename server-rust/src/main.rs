use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;
use visionprompt_sdk::connect;
use visionprompt_server::{app, AppState, ServerConfig};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxedError> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    let gateway = connect(config.gateway.clone());
    let router = app(AppState::new(gateway), &config);

    let port = config.port();
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Server listening on http://localhost:{port}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
