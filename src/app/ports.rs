use async_trait::async_trait;

/// Minimal HTTP GET seam so the export fetcher can run against a stub in tests.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub content_length: u64,
}
