use crate::{
    grok::{GrokGateway, GrokGatewayOptions, DEFAULT_TIMEOUT},
    GenerationGateway, SyntheticGateway,
};
use std::{env, sync::Arc, time::Duration};
use tracing::{info, warn};

/// Gateway settings read from process configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Provider credential. `None` selects the synthetic gateway.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub text_model: Option<String>,
    pub vision_model: Option<String>,
    pub image_model: Option<String>,
}

impl GatewayConfig {
    /// Read `GROK_API_KEY`, `GROK_API_BASE`, `GATEWAY_TIMEOUT_SECS`,
    /// `GROK_TEXT_MODEL`, `GROK_VISION_MODEL` and `GROK_IMAGE_MODEL`.
    #[must_use]
    pub fn from_env() -> Self {
        let timeout = non_empty_env("GATEWAY_TIMEOUT_SECS").and_then(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|error| {
                    warn!(value = %raw, %error, "ignoring invalid GATEWAY_TIMEOUT_SECS");
                })
                .ok()
        });

        Self {
            api_key: non_empty_env("GROK_API_KEY"),
            base_url: non_empty_env("GROK_API_BASE"),
            timeout,
            text_model: non_empty_env("GROK_TEXT_MODEL"),
            vision_model: non_empty_env("GROK_VISION_MODEL"),
            image_model: non_empty_env("GROK_IMAGE_MODEL"),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Build the gateway for `config`. A missing credential is a supported
/// degraded mode, not an error.
#[must_use]
pub fn connect(config: GatewayConfig) -> Arc<dyn GenerationGateway> {
    let timeout = config.timeout();
    match config.api_key {
        Some(api_key) => {
            info!(timeout_s = timeout.as_secs(), "using Grok gateway");
            Arc::new(GrokGateway::new(GrokGatewayOptions {
                base_url: config.base_url,
                api_key,
                client: None,
                timeout: Some(timeout),
                text_model: config.text_model,
                vision_model: config.vision_model,
                image_model: config.image_model,
            }))
        }
        None => {
            warn!("GROK_API_KEY is not set; serving synthetic responses");
            Arc::new(SyntheticGateway::new())
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_selects_synthetic_gateway() {
        let gateway = connect(GatewayConfig::default());
        assert_eq!(gateway.provider(), "synthetic");
    }

    #[test]
    fn credential_selects_grok_gateway() {
        let gateway = connect(GatewayConfig {
            api_key: Some("xai-test".to_string()),
            ..Default::default()
        });
        assert_eq!(gateway.provider(), "grok");
    }

    #[test]
    fn timeout_defaults_to_sixty_seconds() {
        assert_eq!(GatewayConfig::default().timeout(), Duration::from_secs(60));
    }
}
