use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::SchedulingApiError;

/// JSON client for the remote scheduling service, authenticated with HTTP Basic.
pub struct SchedulingApiClient {
    client: Client,
    base_url: String,
    authorization: HeaderValue,
}

impl SchedulingApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, SchedulingApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.slot_service_timeout_secs))
            .build()?;

        let authorization = basic_auth_header(
            &config.slot_service_username,
            &config.slot_service_password,
        )?;

        Ok(Self {
            client,
            base_url: config.slot_service_base_url.trim_end_matches('/').to_string(),
            authorization,
        })
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        headers
    }

    /// Sends a request and decodes the JSON response body into `T`.
    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>)
                            -> Result<T, SchedulingApiError>
    where T: DeserializeOwned {
        let response = self.send(method, path, body).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to decode scheduling service response: {}", e);
            SchedulingApiError::from(e)
        })
    }

    /// Sends a request whose response body is irrelevant.
    pub async fn execute(&self, method: Method, path: &str, body: Option<Value>)
                         -> Result<(), SchedulingApiError> {
        self.send(method, path, body).await?;
        Ok(())
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>)
                  -> Result<Response, SchedulingApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Scheduling service unreachable: {}", e);
            SchedulingApiError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Scheduling service error ({}): {}", status, error_text);

            return Err(SchedulingApiError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

pub fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue, SchedulingApiError> {
    let credentials = STANDARD.encode(format!("{}:{}", username, password));

    HeaderValue::from_str(&format!("Basic {}", credentials))
        .map_err(|e| SchedulingApiError::Configuration(format!("invalid credentials: {}", e)))
}
