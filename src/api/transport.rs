use crate::model::ApiError;
use async_trait::async_trait;
use reqwest::Client;

/// Transport seam for the analytics backend. The client only ever needs the
/// raw body text; tests swap in a canned implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str, params: &[(&str, &str)]) -> Result<String, ApiError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Brandscope/0.1")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        let response = self.client.get(url).query(params).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}
