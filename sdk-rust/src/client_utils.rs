use crate::{GatewayError, GatewayResult};
use reqwest::{header::HeaderMap, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Create a JSON request, parse the response.
/// Returns [`GatewayError::Upstream`] on a non-success status code with the
/// provider's status text and error body, and [`GatewayError::Internal`] when
/// the body does not match `R`. Expiry of `timeout` is an upstream error.
pub async fn send_json<T: Serialize, R: DeserializeOwned>(
    client: &Client,
    url: &str,
    data: &T,
    headers: HeaderMap,
    provider: &str,
    timeout: Duration,
) -> GatewayResult<R> {
    let response = client
        .post(url)
        .headers(headers)
        .timeout(timeout)
        .json(data)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::upstream(provider, status, &body));
    }

    // Parsed from the complete body; a malformed payload never yields a partial value.
    let bytes = response.bytes().await?;
    serde_json::from_slice::<R>(&bytes).map_err(|error| {
        GatewayError::Internal(format!("{provider} returned a malformed body: {error}"))
    })
}
