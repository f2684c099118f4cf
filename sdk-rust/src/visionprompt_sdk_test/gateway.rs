use std::{collections::VecDeque, sync::Mutex};

use tokio::sync::oneshot;

use crate::{
    EditImageRequest, EditedImage, EngineerPromptRequest, EngineerVideoPromptRequest,
    EngineeredPrompt, GatewayError, GatewayResult, GenerateImageRequest, GeneratedImages,
    GenerationGateway, VideoPrompt,
};

/// Result for a mocked gateway call.
/// It can either be a response or an error to return.
pub enum MockResult<T> {
    Response(T),
    Error(GatewayError),
}

impl<T> MockResult<T> {
    pub fn response(response: T) -> Self {
        Self::Response(response)
    }

    pub fn error(error: GatewayError) -> Self {
        Self::Error(error)
    }

    fn into_result(self) -> GatewayResult<T> {
        match self {
            Self::Response(response) => Ok(response),
            Self::Error(error) => Err(error),
        }
    }
}

impl<T> From<GatewayResult<T>> for MockResult<T> {
    fn from(result: GatewayResult<T>) -> Self {
        match result {
            Ok(response) => Self::Response(response),
            Err(error) => Self::Error(error),
        }
    }
}

impl From<EngineeredPrompt> for MockResult<EngineeredPrompt> {
    fn from(response: EngineeredPrompt) -> Self {
        Self::Response(response)
    }
}

impl From<VideoPrompt> for MockResult<VideoPrompt> {
    fn from(response: VideoPrompt) -> Self {
        Self::Response(response)
    }
}

impl From<GeneratedImages> for MockResult<GeneratedImages> {
    fn from(response: GeneratedImages) -> Self {
        Self::Response(response)
    }
}

impl From<EditedImage> for MockResult<EditedImage> {
    fn from(response: EditedImage) -> Self {
        Self::Response(response)
    }
}

/// Holds a gated mocked result until released.
///
/// The call that consumes the gated result stays pending until
/// [`MockGate::release`] is called or the gate is dropped.
pub struct MockGate(oneshot::Sender<()>);

impl MockGate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct MockEntry<T> {
    result: MockResult<T>,
    gate: Option<oneshot::Receiver<()>>,
}

struct MockQueue<I, T> {
    results: VecDeque<MockEntry<T>>,
    inputs: Vec<I>,
}

impl<I, T> Default for MockQueue<I, T> {
    fn default() -> Self {
        Self {
            results: VecDeque::new(),
            inputs: Vec::new(),
        }
    }
}

impl<I, T> MockQueue<I, T> {
    fn push(&mut self, result: MockResult<T>) {
        self.results.push_back(MockEntry { result, gate: None });
    }

    fn push_gated(&mut self, result: MockResult<T>) -> MockGate {
        let (sender, receiver) = oneshot::channel();
        self.results.push_back(MockEntry {
            result,
            gate: Some(receiver),
        });
        MockGate(sender)
    }

    fn take(&mut self, input: I, operation: &str) -> GatewayResult<MockEntry<T>> {
        self.inputs.push(input);
        self.results.pop_front().ok_or_else(|| {
            GatewayError::Internal(format!("no mocked {operation} results available"))
        })
    }

    fn clear(&mut self) {
        self.results.clear();
        self.inputs.clear();
    }
}

#[derive(Default)]
struct MockGatewayState {
    engineer_prompt: MockQueue<EngineerPromptRequest, EngineeredPrompt>,
    engineer_video_prompt: MockQueue<EngineerVideoPromptRequest, VideoPrompt>,
    generate_image: MockQueue<GenerateImageRequest, GeneratedImages>,
    edit_image: MockQueue<EditImageRequest, EditedImage>,
}

/// A mock gateway for testing that tracks requests and yields predefined
/// results in order, optionally holding each one behind a [`MockGate`].
///
/// Unlike the real gateways the mock performs no request validation, so a
/// test can observe exactly what its caller sent.
pub struct MockGateway {
    provider: &'static str,
    state: Mutex<MockGatewayState>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            provider: "mock",
            state: Mutex::new(MockGatewayState::default()),
        }
    }
}

macro_rules! mock_operation {
    ($field:ident, $enqueue:ident, $enqueue_gated:ident, $tracked:ident, $input:ty, $output:ty) => {
        #[doc = concat!("Enqueue a mocked `", stringify!($field), "` result.")]
        pub fn $enqueue<R>(&self, result: R) -> &Self
        where
            R: Into<MockResult<$output>>,
        {
            self.state().$field.push(result.into());
            self
        }

        #[doc = concat!("Enqueue a mocked `", stringify!($field), "` result held until the returned gate is released.")]
        pub fn $enqueue_gated<R>(&self, result: R) -> MockGate
        where
            R: Into<MockResult<$output>>,
        {
            self.state().$field.push_gated(result.into())
        }

        #[doc = concat!("Requests received by `", stringify!($field), "` so far.")]
        pub fn $tracked(&self) -> Vec<$input> {
            self.state().$field.inputs.clone()
        }
    };
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the provider identifier returned by the mock.
    pub fn set_provider(&mut self, provider: &'static str) {
        self.provider = provider;
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockGatewayState> {
        self.state.lock().expect("mock state poisoned")
    }

    mock_operation!(
        engineer_prompt,
        enqueue_engineer_prompt,
        enqueue_engineer_prompt_gated,
        tracked_engineer_prompt_requests,
        EngineerPromptRequest,
        EngineeredPrompt
    );
    mock_operation!(
        engineer_video_prompt,
        enqueue_engineer_video_prompt,
        enqueue_engineer_video_prompt_gated,
        tracked_engineer_video_prompt_requests,
        EngineerVideoPromptRequest,
        VideoPrompt
    );
    mock_operation!(
        generate_image,
        enqueue_generate_image,
        enqueue_generate_image_gated,
        tracked_generate_image_requests,
        GenerateImageRequest,
        GeneratedImages
    );
    mock_operation!(
        edit_image,
        enqueue_edit_image,
        enqueue_edit_image_gated,
        tracked_edit_image_requests,
        EditImageRequest,
        EditedImage
    );

    /// Total number of calls received across every operation.
    pub fn call_count(&self) -> usize {
        let state = self.state();
        state.engineer_prompt.inputs.len()
            + state.engineer_video_prompt.inputs.len()
            + state.generate_image.inputs.len()
            + state.edit_image.inputs.len()
    }

    /// Clear both tracked requests and enqueued results.
    pub fn restore(&self) {
        let mut state = self.state();
        state.engineer_prompt.clear();
        state.engineer_video_prompt.clear();
        state.generate_image.clear();
        state.edit_image.clear();
    }
}

async fn settle<T>(entry: MockEntry<T>) -> GatewayResult<T> {
    if let Some(gate) = entry.gate {
        let _ = gate.await;
    }
    entry.result.into_result()
}

#[async_trait::async_trait]
impl GenerationGateway for MockGateway {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn engineer_prompt(
        &self,
        request: EngineerPromptRequest,
    ) -> GatewayResult<EngineeredPrompt> {
        let entry = self.state().engineer_prompt.take(request, "engineer_prompt")?;
        settle(entry).await
    }

    async fn engineer_video_prompt(
        &self,
        request: EngineerVideoPromptRequest,
    ) -> GatewayResult<VideoPrompt> {
        let entry = self
            .state()
            .engineer_video_prompt
            .take(request, "engineer_video_prompt")?;
        settle(entry).await
    }

    async fn generate_image(
        &self,
        request: GenerateImageRequest,
    ) -> GatewayResult<GeneratedImages> {
        let entry = self.state().generate_image.take(request, "generate_image")?;
        settle(entry).await
    }

    async fn edit_image(&self, request: EditImageRequest) -> GatewayResult<EditedImage> {
        let entry = self.state().edit_image.take(request, "edit_image")?;
        settle(entry).await
    }
}
