use crate::{
    EditImageRequest, EditedImage, EngineerPromptRequest, EngineerVideoPromptRequest,
    EngineeredPrompt, GatewayResult, GenerateImageRequest, GeneratedImages, VideoPrompt,
};

/// Boundary to a remote generative service.
///
/// Implementations validate the request before doing any work and never
/// return a partially parsed response: a malformed upstream body is an
/// [`crate::GatewayError::Internal`].
#[async_trait::async_trait]
pub trait GenerationGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Turn an idea and settings into a model-ready prompt.
    async fn engineer_prompt(
        &self,
        request: EngineerPromptRequest,
    ) -> GatewayResult<EngineeredPrompt>;

    async fn engineer_video_prompt(
        &self,
        request: EngineerVideoPromptRequest,
    ) -> GatewayResult<VideoPrompt>;

    async fn generate_image(&self, request: GenerateImageRequest)
        -> GatewayResult<GeneratedImages>;

    /// Edit an existing image. The edit instruction is sent as-is, combined
    /// with the original prompt; prompt engineering is not re-run.
    async fn edit_image(&self, request: EditImageRequest) -> GatewayResult<EditedImage>;
}
