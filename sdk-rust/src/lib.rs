mod client_utils;
mod config;
mod errors;
mod gateway;
pub mod grok;
mod http_gateway;
pub mod opentelemetry;
pub mod prompt;
mod synthetic;
mod types;
pub mod visionprompt_sdk_test;

pub use config::{connect, GatewayConfig};
pub use errors::*;
pub use gateway::GenerationGateway;
pub use http_gateway::{
    ErrorBody, HttpGateway, HttpGatewayOptions, DOWNLOAD_PATH, EDIT_IMAGE_PATH,
    ENGINEER_PROMPT_PATH, ENGINEER_VIDEO_PROMPT_PATH, GENERATE_IMAGE_PATH,
};
pub use synthetic::{SyntheticGateway, PLACEHOLDER_EDITED_IMAGE_URL, PLACEHOLDER_IMAGE_URLS};
pub use types::*;
