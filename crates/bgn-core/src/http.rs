//! HTTP client shared by the resolver and the fetcher

use reqwest::{Client, Response};
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the reqwest client from config
///
/// No timeout is applied unless one is configured.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.as_str());
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// GET `url`, failing with `Error::Network` on a non-success status
pub async fn get(client: &Client, url: &str) -> Result<Response> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!("GET {} returned {}", url, status)));
    }
    Ok(response)
}
