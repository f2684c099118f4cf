mod config;

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use visionprompt_sdk::{
    EditImageRequest, EngineerPromptRequest, EngineerVideoPromptRequest, ErrorBody, GatewayError,
    GenerateImageRequest, GenerationGateway, DOWNLOAD_PATH, EDIT_IMAGE_PATH, ENGINEER_PROMPT_PATH,
    ENGINEER_VIDEO_PROMPT_PATH, GENERATE_IMAGE_PATH,
};

pub use config::ServerConfig;

const DOWNLOAD_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn GenerationGateway>,
    /// Client used by the download proxy.
    pub http: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            gateway,
            http: reqwest::Client::new(),
        }
    }
}

/// A gateway failure rendered as `{ "error": message }` with its status.
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Parse a JSON body. An unparsable body is an internal error.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|error| ApiError(error.into()))
}

async fn engineer_prompt_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: EngineerPromptRequest = parse_body(&body)?;
    Ok(Json(state.gateway.engineer_prompt(request).await?))
}

async fn engineer_video_prompt_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: EngineerVideoPromptRequest = parse_body(&body)?;
    Ok(Json(state.gateway.engineer_video_prompt(request).await?))
}

async fn generate_image_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: GenerateImageRequest = parse_body(&body)?;
    Ok(Json(state.gateway.generate_image(request).await?))
}

async fn edit_image_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: EditImageRequest = parse_body(&body)?;
    Ok(Json(state.gateway.edit_image(request).await?))
}

#[derive(Deserialize)]
struct DownloadQuery {
    url: Option<String>,
}

/// Fetch an image and return it as a file attachment.
///
/// Any `http` or `https` URL is fetched, including loopback and private
/// addresses; deployments exposing this route publicly must restrict
/// egress themselves.
async fn download_handler(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(url) = query.url.filter(|url| !url.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing URL parameter").into_response();
    };
    if !is_fetchable(&url) {
        return (StatusCode::BAD_REQUEST, "Invalid URL parameter").into_response();
    }

    match fetch_download(&state.http, &url).await {
        Ok((content_type, bytes)) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, content_type);
            let disposition = format!(
                "attachment; filename=\"visionprompt-generation-{}.png\"",
                chrono::Utc::now().timestamp_millis()
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(DOWNLOAD_CACHE_CONTROL),
            );
            (headers, bytes).into_response()
        }
        Err(error) => {
            warn!(%url, %error, "proxy download failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to download image").into_response()
        }
    }
}

fn is_fetchable(url: &str) -> bool {
    reqwest::Url::parse(url.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

async fn fetch_download(
    client: &reqwest::Client,
    url: &str,
) -> Result<(HeaderValue, Bytes), reqwest::Error> {
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("image/png"));
    let bytes = response.bytes().await?;
    Ok((content_type, bytes))
}

async fn home_handler() -> &'static str {
    "VisionPrompt server"
}

/// Routes without CORS or request tracing.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route(ENGINEER_PROMPT_PATH, post(engineer_prompt_handler))
        .route(ENGINEER_VIDEO_PROMPT_PATH, post(engineer_video_prompt_handler))
        .route(GENERATE_IMAGE_PATH, post(generate_image_handler))
        .route(EDIT_IMAGE_PATH, post(edit_image_handler))
        .route(DOWNLOAD_PATH, get(download_handler))
        .with_state(state)
}

/// The full application: API routes plus CORS for the configured origin
/// and request tracing.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let mut router = api_router(state).layer(TraceLayer::new_for_http());
    if let Some(cors) = cors_layer(config) {
        router = router.layer(cors);
    }
    router
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let app_url = config.app_url.as_deref()?;
    match app_url.parse::<HeaderValue>() {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin([origin])
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        ),
        Err(error) => {
            warn!(%app_url, %error, "ignoring invalid APP_URL for CORS");
            None
        }
    }
}
