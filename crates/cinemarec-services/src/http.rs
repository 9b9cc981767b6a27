//! Request plumbing shared by every service client.

use crate::error::{Result, ServiceError};
use cinemarec_config::HttpConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Build the HTTP client all service clients share
pub fn build_client(http: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("cinemarec/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = http.timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ServiceError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Join a base URL and a path without doubling slashes
pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

pub(crate) fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

/// Send a request and turn non-2xx responses into errors
pub(crate) async fn send(request: RequestBuilder, action: &str) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    debug!("{} -> {}", action, status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ServiceError::Unauthorized(format!("{} was rejected", action)));
    }
    Err(ServiceError::Status {
        action: action.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Send a request and decode its JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder, action: &str) -> Result<T> {
    let response = send(request, action).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ServiceError::decode(action, e))
}
