use super::client::HttpClient;
use async_trait::async_trait;

/// Default transport: one shared `reqwest` session.
///
/// `reqwest::Client` pools connections internally and is safe for concurrent
/// use, so a single `BasicClient` serves every fetch made through a
/// [`Fetcher`](super::Fetcher).
#[derive(Debug, Clone, Default)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Wraps an already configured `reqwest` client.
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
