mod api;
mod gateway;

pub use gateway::{
    GrokGateway, GrokGatewayOptions, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
    DEFAULT_TIMEOUT, DEFAULT_VISION_MODEL,
};
