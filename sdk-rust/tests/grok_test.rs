mod common;

use axum::http::StatusCode;
use common::{spawn_fake_xai, Behavior, FakeXai};
use std::time::Duration;
use visionprompt_sdk::{grok::*, *};

fn grok_gateway(fake: &FakeXai, timeout: Option<Duration>) -> GrokGateway {
    GrokGateway::new(GrokGatewayOptions {
        base_url: Some(fake.base_url.clone()),
        api_key: "xai-test-key".to_string(),
        timeout,
        ..Default::default()
    })
}

fn cat_request() -> EngineerPromptRequest {
    EngineerPromptRequest {
        idea_text: "a cat in space".to_string(),
        settings: GenerationSettings::default(),
        reference_image: None,
    }
}

#[tokio::test]
async fn engineer_prompt_uses_text_model_with_bearer_auth() {
    let fake = spawn_fake_xai(Behavior::Succeed).await;
    let gateway = grok_gateway(&fake, None);

    let engineered = gateway.engineer_prompt(cat_request()).await.unwrap();
    assert_eq!(engineered.basic_prompt, "a cat in space");
    assert_eq!(
        engineered.advanced_prompt,
        "A luminous cat drifting past Saturn"
    );
    assert!(!engineered.negative_prompt.is_empty());

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer xai-test-key")
    );
    assert_eq!(requests[0].body["model"], DEFAULT_TEXT_MODEL);
    let instruction = requests[0].body["messages"][1]["content"].as_str().unwrap();
    assert!(instruction.contains("a cat in space"));
    assert!(instruction.contains("--ar 16:9"));
}

#[tokio::test]
async fn reference_image_routes_to_vision_model() {
    let fake = spawn_fake_xai(Behavior::Succeed).await;
    let gateway = grok_gateway(&fake, None);

    gateway
        .engineer_prompt(EngineerPromptRequest {
            reference_image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            ..cat_request()
        })
        .await
        .unwrap();

    let body = &fake.requests()[0].body;
    assert_eq!(body["model"], DEFAULT_VISION_MODEL);
    let parts = body["messages"][1]["content"].as_array().unwrap();
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[1]["type"], "image_url");
    assert_eq!(
        parts[1]["image_url"]["url"],
        "data:image/png;base64,iVBORw0KGgo="
    );
}

#[tokio::test]
async fn generate_image_appends_aspect_ratio() {
    let fake = spawn_fake_xai(Behavior::Succeed).await;
    let gateway = grok_gateway(&fake, None);

    let generated = gateway
        .generate_image(GenerateImageRequest {
            prompt: "A luminous cat".to_string(),
            aspect_ratio: "9:16".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(generated.images.len(), 2);

    let request = &fake.requests()[0];
    assert_eq!(request.path, "/v1/images/generations");
    assert_eq!(request.body["prompt"], "A luminous cat --ar 9:16");
    assert_eq!(request.body["model"], DEFAULT_IMAGE_MODEL);
}

#[tokio::test]
async fn edit_image_sends_combined_prompt() {
    let fake = spawn_fake_xai(Behavior::Succeed).await;
    let gateway = grok_gateway(&fake, None);

    let edited = gateway
        .edit_image(EditImageRequest {
            image: "https://cdn.example.com/1.png".to_string(),
            prompt: "make the sky red".to_string(),
            aspect_ratio: "16:9".to_string(),
            original_prompt: Some("A luminous cat".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(edited.images, vec!["https://cdn.example.com/edited.png"]);
    assert_eq!(edited.new_prompt, "A luminous cat [EDIT]: make the sky red");

    let request = &fake.requests()[0];
    assert_eq!(request.path, "/v1/images/edits");
    assert_eq!(request.body["imageUrl"], "https://cdn.example.com/1.png");
    assert_eq!(request.body["prompt"], edited.new_prompt);
}

#[tokio::test]
async fn invalid_request_never_reaches_the_provider() {
    let fake = spawn_fake_xai(Behavior::Succeed).await;
    let gateway = grok_gateway(&fake, None);

    let error = gateway
        .engineer_prompt(EngineerPromptRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(error, GatewayError::InvalidRequest(ref m) if m == "Idea text is required"));
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn non_success_status_is_upstream_error_with_status_text() {
    let fake = spawn_fake_xai(Behavior::Status(
        StatusCode::TOO_MANY_REQUESTS,
        "rate limited",
    ))
    .await;
    let gateway = grok_gateway(&fake, None);

    let error = gateway.engineer_prompt(cat_request()).await.unwrap_err();
    let GatewayError::Upstream(message) = error else {
        panic!("expected upstream error, got {error:?}");
    };
    assert!(message.contains("Too Many Requests"));
    assert!(message.contains("rate limited"));
}

#[tokio::test]
async fn malformed_body_is_internal_error() {
    let fake = spawn_fake_xai(Behavior::MalformedBody).await;
    let gateway = grok_gateway(&fake, None);

    let error = gateway
        .generate_image(GenerateImageRequest {
            prompt: "A luminous cat".to_string(),
            aspect_ratio: "16:9".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(error, GatewayError::Internal(_)));
}

#[tokio::test]
async fn slow_provider_times_out_as_upstream_error() {
    let fake = spawn_fake_xai(Behavior::Delay(Duration::from_secs(5))).await;
    let gateway = grok_gateway(&fake, Some(Duration::from_millis(200)));

    let error = gateway.engineer_prompt(cat_request()).await.unwrap_err();
    assert!(matches!(error, GatewayError::Upstream(_)), "{error:?}");
}
