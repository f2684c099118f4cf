use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::{
    opentelemetry::trace_call,
    prompt::{self, SYNTHETIC_NEGATIVE_PROMPT},
    EditImageRequest, EditedImage, EngineerPromptRequest, EngineerVideoPromptRequest,
    EngineeredPrompt, GatewayResult, GenerateImageRequest, GeneratedImages, GenerationGateway,
    VideoPrompt,
};

const PROVIDER: &str = "synthetic";

pub const PLACEHOLDER_IMAGE_URLS: [&str; 2] = [
    "https://images.unsplash.com/photo-1620641788421-7a1c342ea42e?w=800&q=80",
    "https://images.unsplash.com/photo-1618005182384-a83a8bd57fbe?w=800&q=80",
];

pub const PLACEHOLDER_EDITED_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1620641788421-7a1c342ea42e?w=800&q=80&blend=ff0000";

/// Gateway used when no provider credential is configured. Responses are
/// fixed or derived deterministically from the request, after a fixed delay
/// that stands in for network latency.
#[derive(Debug, Clone)]
pub struct SyntheticGateway {
    prompt_delay: Duration,
    image_delay: Duration,
}

impl Default for SyntheticGateway {
    fn default() -> Self {
        Self {
            prompt_delay: Duration::from_secs(1),
            image_delay: Duration::from_secs(2),
        }
    }
}

impl SyntheticGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A synthetic gateway that answers immediately.
    #[must_use]
    pub fn instant() -> Self {
        Self::with_delays(Duration::ZERO, Duration::ZERO)
    }

    #[must_use]
    pub fn with_delays(prompt_delay: Duration, image_delay: Duration) -> Self {
        Self {
            prompt_delay,
            image_delay,
        }
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis(), "simulating provider latency");
            sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl GenerationGateway for SyntheticGateway {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn engineer_prompt(
        &self,
        request: EngineerPromptRequest,
    ) -> GatewayResult<EngineeredPrompt> {
        trace_call(PROVIDER, "engineer_prompt", PROVIDER, async move {
            request.validate()?;
            Self::pause(self.prompt_delay).await;
            Ok(EngineeredPrompt {
                basic_prompt: request.idea_text.clone(),
                advanced_prompt: prompt::synthetic_image_prompt(
                    &request.idea_text,
                    &request.settings,
                ),
                negative_prompt: SYNTHETIC_NEGATIVE_PROMPT.to_string(),
                explanation: "Enhanced your idea with specific photography and style tags to \
                              ensure high-quality output."
                    .to_string(),
            })
        })
        .await
    }

    async fn engineer_video_prompt(
        &self,
        request: EngineerVideoPromptRequest,
    ) -> GatewayResult<VideoPrompt> {
        trace_call(PROVIDER, "engineer_video_prompt", PROVIDER, async move {
            request.validate()?;
            Self::pause(self.prompt_delay).await;
            Ok(VideoPrompt {
                prompt: prompt::synthetic_video_prompt(
                    &request.idea_text,
                    &request.video_settings,
                ),
            })
        })
        .await
    }

    async fn generate_image(
        &self,
        request: GenerateImageRequest,
    ) -> GatewayResult<GeneratedImages> {
        trace_call(PROVIDER, "generate_image", PROVIDER, async move {
            request.validate()?;
            Self::pause(self.image_delay).await;
            Ok(GeneratedImages {
                images: PLACEHOLDER_IMAGE_URLS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })
        })
        .await
    }

    async fn edit_image(&self, request: EditImageRequest) -> GatewayResult<EditedImage> {
        trace_call(PROVIDER, "edit_image", PROVIDER, async move {
            request.validate()?;
            Self::pause(self.image_delay).await;
            Ok(EditedImage {
                images: vec![PLACEHOLDER_EDITED_IMAGE_URL.to_string()],
                new_prompt: prompt::combine_edit_prompt(
                    request.original_prompt.as_deref(),
                    &request.prompt,
                ),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GatewayError, GenerationSettings};
    use std::time::Instant;

    #[tokio::test]
    async fn cat_in_space_prompt_and_images_within_expected_latency() {
        let gateway = SyntheticGateway::new();

        let started = Instant::now();
        let engineered = gateway
            .engineer_prompt(EngineerPromptRequest {
                idea_text: "a cat in space".to_string(),
                settings: GenerationSettings::default(),
                reference_image: None,
            })
            .await
            .expect("engineer prompt succeeds");
        let prompt_elapsed = started.elapsed();
        assert!(!engineered.advanced_prompt.is_empty());
        assert_eq!(engineered.basic_prompt, "a cat in space");
        assert!(prompt_elapsed >= Duration::from_millis(900));
        assert!(prompt_elapsed < Duration::from_millis(1900));

        let started = Instant::now();
        let generated = gateway
            .generate_image(GenerateImageRequest {
                prompt: engineered.advanced_prompt,
                aspect_ratio: "16:9".to_string(),
            })
            .await
            .expect("generate image succeeds");
        let image_elapsed = started.elapsed();
        assert_eq!(generated.images, PLACEHOLDER_IMAGE_URLS.to_vec());
        assert!(image_elapsed >= Duration::from_millis(1900));
        assert!(image_elapsed < Duration::from_millis(3500));
    }

    #[tokio::test]
    async fn edit_returns_prompt_lineage() {
        let edited = SyntheticGateway::instant()
            .edit_image(EditImageRequest {
                image: PLACEHOLDER_IMAGE_URLS[0].to_string(),
                prompt: "make the sky red".to_string(),
                aspect_ratio: "16:9".to_string(),
                original_prompt: Some("a cat in space".to_string()),
            })
            .await
            .expect("edit succeeds");
        assert_eq!(edited.images.len(), 1);
        assert_eq!(edited.new_prompt, "a cat in space [EDIT]: make the sky red");
    }

    #[tokio::test]
    async fn validation_runs_before_the_delay() {
        let gateway = SyntheticGateway::with_delays(Duration::from_secs(30), Duration::from_secs(30));
        let started = Instant::now();
        let error = gateway
            .generate_image(GenerateImageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::InvalidRequest(ref m) if m == "Prompt is required"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
