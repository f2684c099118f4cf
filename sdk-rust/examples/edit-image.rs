use dotenvy::dotenv;
use std::env;
use visionprompt_sdk::{connect, EditImageRequest, GatewayConfig, PLACEHOLDER_IMAGE_URLS};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let image = env::args()
        .nth(1)
        .unwrap_or_else(|| PLACEHOLDER_IMAGE_URLS[0].to_string());

    let gateway = connect(GatewayConfig::from_env());
    let edited = gateway
        .edit_image(EditImageRequest {
            image,
            prompt: "make the sky red".to_string(),
            aspect_ratio: "16:9".to_string(),
            original_prompt: Some("a lighthouse in a storm".to_string()),
        })
        .await
        .expect("edit_image failed");

    println!("{edited:#?}");
}
