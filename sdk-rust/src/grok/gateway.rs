use super::api::{
    ChatCompletionRequest, ChatCompletionResponse, ChatContent, ChatContentPart, ChatMessage,
    ChatRole, ImageEditRequest, ImageGenerationRequest, ImageUrl, ImagesResponse,
};
use crate::{
    client_utils,
    opentelemetry::trace_call,
    prompt::{self, IMAGE_SYSTEM_PROMPT, UPSTREAM_NEGATIVE_PROMPT, VIDEO_SYSTEM_PROMPT},
    EditImageRequest, EditedImage, EngineerPromptRequest, EngineerVideoPromptRequest,
    EngineeredPrompt, GatewayError, GatewayResult, GenerateImageRequest, GeneratedImages,
    GenerationGateway, VideoPrompt,
};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client,
};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "grok";
const DISPLAY_NAME: &str = "Grok";

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_TEXT_MODEL: &str = "grok-3-mini";
pub const DEFAULT_VISION_MODEL: &str = "grok-2-vision-1212";
pub const DEFAULT_IMAGE_MODEL: &str = "grok-imagine-image";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gateway backed by the xAI API with bearer-token authentication.
pub struct GrokGateway {
    api_key: String,
    base_url: String,
    client: Client,
    timeout: Duration,
    text_model: String,
    vision_model: String,
    image_model: String,
}

#[derive(Clone, Default)]
pub struct GrokGatewayOptions {
    pub base_url: Option<String>,
    pub api_key: String,
    pub client: Option<Client>,
    /// Per-request timeout. Defaults to [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
    pub text_model: Option<String>,
    /// Model used for prompt engineering when a reference image is attached.
    pub vision_model: Option<String>,
    pub image_model: Option<String>,
}

impl GrokGateway {
    #[must_use]
    pub fn new(options: GrokGatewayOptions) -> Self {
        let GrokGatewayOptions {
            base_url,
            api_key,
            client,
            timeout,
            text_model,
            vision_model,
            image_model,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_key,
            base_url,
            client: client.unwrap_or_default(),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            text_model: text_model.unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            vision_model: vision_model.unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            image_model: image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        }
    }

    fn request_headers(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth_header =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|error| {
                GatewayError::Internal(format!("Invalid Grok API key header value: {error}"))
            })?;
        headers.insert(header::AUTHORIZATION, auth_header);
        Ok(headers)
    }

    async fn complete(&self, model: &str, messages: Vec<ChatMessage>) -> GatewayResult<String> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
        };
        let response: ChatCompletionResponse = client_utils::send_json(
            &self.client,
            &format!("{}/chat/completions", self.base_url),
            &request,
            self.request_headers()?,
            DISPLAY_NAME,
            self.timeout,
        )
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                GatewayError::Internal("Grok returned no completion content".to_string())
            })
    }

    async fn images(
        &self,
        endpoint: &str,
        body: &(impl serde::Serialize + Sync),
    ) -> GatewayResult<Vec<String>> {
        let response: ImagesResponse = client_utils::send_json(
            &self.client,
            &format!("{}/images/{endpoint}", self.base_url),
            body,
            self.request_headers()?,
            DISPLAY_NAME,
            self.timeout,
        )
        .await?;

        if response.data.is_empty() {
            return Err(GatewayError::Internal(format!(
                "Grok images/{endpoint} returned no images"
            )));
        }
        Ok(response.data.into_iter().map(|item| item.url).collect())
    }
}

#[async_trait::async_trait]
impl GenerationGateway for GrokGateway {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn engineer_prompt(
        &self,
        request: EngineerPromptRequest,
    ) -> GatewayResult<EngineeredPrompt> {
        let model = if request.reference().is_some() {
            &self.vision_model
        } else {
            &self.text_model
        };

        trace_call(PROVIDER, "engineer_prompt", model, async {
            request.validate()?;

            let instruction =
                prompt::compose_image_instruction(&request.idea_text, &request.settings);
            let user_content = match request.reference() {
                Some(reference) => ChatContent::Parts(vec![
                    ChatContentPart::Text { text: instruction },
                    ChatContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: reference.to_string(),
                            detail: "high".to_string(),
                        },
                    },
                ]),
                None => ChatContent::Text(instruction),
            };
            debug!(model = %model, vision = request.reference().is_some(), "engineering prompt");

            let advanced_prompt = self
                .complete(
                    model,
                    vec![
                        ChatMessage {
                            role: ChatRole::System,
                            content: ChatContent::Text(IMAGE_SYSTEM_PROMPT.to_string()),
                        },
                        ChatMessage {
                            role: ChatRole::User,
                            content: user_content,
                        },
                    ],
                )
                .await?;

            Ok(EngineeredPrompt {
                basic_prompt: request.idea_text.clone(),
                advanced_prompt,
                negative_prompt: UPSTREAM_NEGATIVE_PROMPT.to_string(),
                explanation: "Generated via Grok API".to_string(),
            })
        })
        .await
    }

    async fn engineer_video_prompt(
        &self,
        request: EngineerVideoPromptRequest,
    ) -> GatewayResult<VideoPrompt> {
        trace_call(PROVIDER, "engineer_video_prompt", &self.text_model, async {
            request.validate()?;
            let instruction =
                prompt::compose_video_instruction(&request.idea_text, &request.video_settings);

            let prompt = self
                .complete(
                    &self.text_model,
                    vec![
                        ChatMessage {
                            role: ChatRole::System,
                            content: ChatContent::Text(VIDEO_SYSTEM_PROMPT.to_string()),
                        },
                        ChatMessage {
                            role: ChatRole::User,
                            content: ChatContent::Text(instruction),
                        },
                    ],
                )
                .await?;
            Ok(VideoPrompt { prompt })
        })
        .await
    }

    async fn generate_image(
        &self,
        request: GenerateImageRequest,
    ) -> GatewayResult<GeneratedImages> {
        trace_call(PROVIDER, "generate_image", &self.image_model, async {
            request.validate()?;
            let body = ImageGenerationRequest {
                prompt: prompt::with_aspect_ratio(&request.prompt, &request.aspect_ratio),
                model: self.image_model.clone(),
            };
            let images = self.images("generations", &body).await?;
            Ok(GeneratedImages { images })
        })
        .await
    }

    async fn edit_image(&self, request: EditImageRequest) -> GatewayResult<EditedImage> {
        trace_call(PROVIDER, "edit_image", &self.image_model, async {
            request.validate()?;
            let new_prompt =
                prompt::combine_edit_prompt(request.original_prompt.as_deref(), &request.prompt);
            let body = ImageEditRequest {
                image_url: request.image.clone(),
                prompt: new_prompt.clone(),
                model: self.image_model.clone(),
            };
            let images = self.images("edits", &body).await?;
            Ok(EditedImage { images, new_prompt })
        })
        .await
    }
}
