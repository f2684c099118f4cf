use crate::GatewayResult;
use opentelemetry::trace::Status;
use std::time::Instant;
use tracing::{info_span, warn, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Span wrapping a single gateway call.
pub struct GatewaySpan {
    span: Span,
    operation: &'static str,
    start_time: Instant,
}

impl GatewaySpan {
    pub fn new(provider: &str, operation: &'static str, model_id: &str) -> Self {
        let span = match operation {
            "engineer_prompt" => info_span!("visionprompt.engineer_prompt"),
            "engineer_video_prompt" => info_span!("visionprompt.engineer_video_prompt"),
            "generate_image" => info_span!("visionprompt.generate_image"),
            "edit_image" => info_span!("visionprompt.edit_image"),
            _ => info_span!("visionprompt.gateway"),
        };
        span.set_attribute("gen_ai.provider.name", provider.to_string());
        span.set_attribute("gen_ai.request.model", model_id.to_string());
        span.set_attribute("visionprompt.operation", operation);

        Self {
            span,
            operation,
            start_time: Instant::now(),
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
        let _entered = self.span.enter();
        warn!(operation = self.operation, error = %error, "gateway call failed");
    }

    pub fn on_end(&mut self) {
        self.span.set_attribute(
            "visionprompt.duration_s",
            self.start_time.elapsed().as_secs_f64(),
        );
    }
}

/// Run `future` inside a [`GatewaySpan`], recording failure on the span.
pub async fn trace_call<T, Fut>(
    provider: &str,
    operation: &'static str,
    model_id: &str,
    future: Fut,
) -> GatewayResult<T>
where
    Fut: std::future::Future<Output = GatewayResult<T>>,
{
    let mut span = GatewaySpan::new(provider, operation, model_id);
    let result = span.instrument_future(future).await;

    if let Err(error) = &result {
        span.on_error(error);
    }

    span.on_end();
    result
}
