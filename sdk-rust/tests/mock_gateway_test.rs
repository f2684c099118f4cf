use std::time::Duration;
use visionprompt_sdk::{visionprompt_sdk_test::*, *};

fn generated(urls: &[&str]) -> GeneratedImages {
    GeneratedImages {
        images: urls.iter().map(ToString::to_string).collect(),
    }
}

#[tokio::test]
async fn yields_results_in_order_and_tracks_requests() {
    let gateway = MockGateway::new();
    gateway
        .enqueue_generate_image(generated(&["https://a.example/1.png"]))
        .enqueue_generate_image(MockResult::error(GatewayError::Upstream(
            "boom".to_string(),
        )));

    let request = GenerateImageRequest {
        prompt: "first".to_string(),
        aspect_ratio: "1:1".to_string(),
    };
    let first = gateway.generate_image(request.clone()).await.unwrap();
    assert_eq!(first.images, vec!["https://a.example/1.png"]);

    let second = gateway.generate_image(request.clone()).await;
    assert!(matches!(second, Err(GatewayError::Upstream(_))));

    assert_eq!(
        gateway.tracked_generate_image_requests(),
        vec![request.clone(), request]
    );
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn missing_result_is_an_internal_error() {
    let gateway = MockGateway::new();
    let result = gateway
        .engineer_prompt(EngineerPromptRequest::default())
        .await;
    assert!(matches!(result, Err(GatewayError::Internal(_))));
    assert_eq!(gateway.tracked_engineer_prompt_requests().len(), 1);
}

#[tokio::test]
async fn gated_result_waits_for_release() {
    let gateway = std::sync::Arc::new(MockGateway::new());
    let gate = gateway.enqueue_edit_image_gated(EditedImage {
        images: vec!["https://a.example/edited.png".to_string()],
        new_prompt: "a [EDIT]: b".to_string(),
    });

    let pending = tokio::spawn({
        let gateway = gateway.clone();
        async move { gateway.edit_image(EditImageRequest::default()).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());

    gate.release();
    let edited = pending.await.unwrap().unwrap();
    assert_eq!(edited.new_prompt, "a [EDIT]: b");
}

#[tokio::test]
async fn restore_clears_results_and_requests() {
    let gateway = MockGateway::new();
    gateway.enqueue_engineer_video_prompt(VideoPrompt {
        prompt: "slow pan".to_string(),
    });
    gateway
        .engineer_video_prompt(EngineerVideoPromptRequest::default())
        .await
        .unwrap();
    gateway.enqueue_engineer_video_prompt(VideoPrompt {
        prompt: "unused".to_string(),
    });

    gateway.restore();
    assert_eq!(gateway.call_count(), 0);
    assert!(gateway
        .engineer_video_prompt(EngineerVideoPromptRequest::default())
        .await
        .is_err());
}
