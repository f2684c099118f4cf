use crate::{
    opentelemetry::trace_call, EditImageRequest, EditedImage, EngineerPromptRequest,
    EngineerVideoPromptRequest, EngineeredPrompt, GatewayError, GatewayResult,
    GenerateImageRequest, GeneratedImages, GenerationGateway, VideoPrompt,
};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "http";

pub const ENGINEER_PROMPT_PATH: &str = "/api/generate-prompt";
pub const ENGINEER_VIDEO_PROMPT_PATH: &str = "/api/generate-video-prompt";
pub const GENERATE_IMAGE_PATH: &str = "/api/generate-image";
pub const EDIT_IMAGE_PATH: &str = "/api/edit-image";
pub const DOWNLOAD_PATH: &str = "/api/download";

/// Error body returned by the generation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
}

/// Gateway that calls the generation endpoints of a running server.
pub struct HttpGateway {
    base_url: String,
    client: Client,
    timeout: Duration,
}

#[derive(Clone, Default)]
pub struct HttpGatewayOptions {
    pub client: Option<Client>,
    pub timeout: Option<Duration>,
}

impl HttpGateway {
    #[must_use]
    pub fn new(base_url: impl Into<String>, options: HttpGatewayOptions) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: options.client.unwrap_or_default(),
            timeout: options.timeout.unwrap_or(crate::grok::DEFAULT_TIMEOUT),
        }
    }

    async fn post<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> GatewayResult<R> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(unreachable)?;
        if status.is_success() {
            return serde_json::from_slice::<R>(&bytes).map_err(GatewayError::from);
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        if status == StatusCode::BAD_REQUEST {
            Err(GatewayError::InvalidRequest(message))
        } else {
            Err(GatewayError::upstream("Generation server", status, &message))
        }
    }
}

fn unreachable(error: reqwest::Error) -> GatewayError {
    GatewayError::Upstream(format!("Generation server request failed: {error}"))
}

#[async_trait::async_trait]
impl GenerationGateway for HttpGateway {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn engineer_prompt(
        &self,
        request: EngineerPromptRequest,
    ) -> GatewayResult<EngineeredPrompt> {
        trace_call(PROVIDER, "engineer_prompt", &self.base_url, async {
            request.validate()?;
            self.post(ENGINEER_PROMPT_PATH, &request).await
        })
        .await
    }

    async fn engineer_video_prompt(
        &self,
        request: EngineerVideoPromptRequest,
    ) -> GatewayResult<VideoPrompt> {
        trace_call(PROVIDER, "engineer_video_prompt", &self.base_url, async {
            request.validate()?;
            self.post(ENGINEER_VIDEO_PROMPT_PATH, &request).await
        })
        .await
    }

    async fn generate_image(
        &self,
        request: GenerateImageRequest,
    ) -> GatewayResult<GeneratedImages> {
        trace_call(PROVIDER, "generate_image", &self.base_url, async {
            request.validate()?;
            self.post(GENERATE_IMAGE_PATH, &request).await
        })
        .await
    }

    async fn edit_image(&self, request: EditImageRequest) -> GatewayResult<EditedImage> {
        trace_call(PROVIDER, "edit_image", &self.base_url, async {
            request.validate()?;
            self.post(EDIT_IMAGE_PATH, &request).await
        })
        .await
    }
}
