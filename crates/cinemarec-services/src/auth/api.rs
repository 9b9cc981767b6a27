use crate::error::{Result, ServiceError};
use crate::http::{join, send_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

fn extract_token(response: TokenResponse, action: &str) -> Result<String> {
    response
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::decode(action, "response did not contain a token"))
}

pub async fn login(client: &Client, base_url: &str, email: &str, password: &str) -> Result<String> {
    let url = join(base_url, "/auth/login");
    debug!("Logging in at {}", url);
    let response: TokenResponse =
        send_json(client.post(&url).json(&PasswordRequest { email, password }), "log in").await?;
    extract_token(response, "log in")
}

pub async fn register(client: &Client, base_url: &str, email: &str, password: &str) -> Result<String> {
    let url = join(base_url, "/auth/register");
    debug!("Registering at {}", url);
    let response: TokenResponse =
        send_json(client.post(&url).json(&PasswordRequest { email, password }), "register").await?;
    extract_token(response, "register")
}

pub async fn google_login(client: &Client, base_url: &str, email: &str, name: &str) -> Result<String> {
    let url = join(base_url, "/auth/google");
    debug!("Google sign-in at {}", url);
    let response: TokenResponse =
        send_json(client.post(&url).json(&GoogleRequest { email, name }), "sign in with Google").await?;
    extract_token(response, "sign in with Google")
}
