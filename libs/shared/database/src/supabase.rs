use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Failures surfaced by the PostgREST store. Conflict is kept distinct so
/// unique-constraint violations can be reported as 409 instead of 500.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store authentication error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation: {0}")]
    Conflict(String),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.service_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key)).unwrap(),
        );

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StoreError::Unauthorized(error_text)
                }
                StatusCode::NOT_FOUND => StoreError::NotFound(error_text),
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                _ => StoreError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let text = response.text().await?;
        let data = serde_json::from_str(&text)?;
        Ok(data)
    }

    /// POST with `Prefer: return=representation` so the created rows come back.
    pub async fn insert<T>(&self, path: &str, body: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(Method::POST, path, Some(body), Some(Self::representation_header()))
            .await
    }

    /// PATCH with `Prefer: return=representation`; an empty result array means
    /// the filter matched nothing.
    pub async fn update<T>(&self, path: &str, body: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(Method::PATCH, path, Some(body), Some(Self::representation_header()))
            .await
    }

    /// DELETE with `Prefer: return=representation` so callers can tell whether
    /// anything was actually removed.
    pub async fn delete<T>(&self, path: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(Method::DELETE, path, None, Some(Self::representation_header()))
            .await
    }

    fn representation_header() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
