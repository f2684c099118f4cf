use std::env;

use tracing::warn;
use visionprompt_sdk::GatewayConfig;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub port: Option<u16>,
    /// Origin allowed by CORS. Without it no CORS headers are sent.
    pub app_url: Option<String>,
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    /// Read `PORT`, `APP_URL` and the gateway variables.
    #[must_use]
    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|raw| {
            raw.trim()
                .parse::<u16>()
                .map_err(|error| warn!(value = %raw, %error, "ignoring invalid PORT"))
                .ok()
        });
        let app_url = env::var("APP_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            port,
            app_url,
            gateway: GatewayConfig::from_env(),
        }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}
