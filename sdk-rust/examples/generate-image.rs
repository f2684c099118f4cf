use dotenvy::dotenv;
use visionprompt_sdk::{
    connect, EngineerPromptRequest, GatewayConfig, GenerateImageRequest, GenerationSettings,
};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let gateway = connect(GatewayConfig::from_env());
    let settings = GenerationSettings {
        style: "Oil Painting".to_string(),
        ..Default::default()
    };

    let engineered = gateway
        .engineer_prompt(EngineerPromptRequest {
            idea_text: "a lighthouse in a storm".to_string(),
            settings: settings.clone(),
            reference_image: None,
        })
        .await
        .expect("engineer_prompt failed");

    println!("{engineered:#?}");

    let generated = gateway
        .generate_image(GenerateImageRequest {
            prompt: engineered.advanced_prompt,
            aspect_ratio: settings.aspect_ratio,
        })
        .await
        .expect("generate_image failed");

    for url in generated.images {
        println!("{url}");
    }
}
