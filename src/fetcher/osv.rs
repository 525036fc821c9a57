use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Ecosystem;

/// Public GCS bucket holding the OSV per-ecosystem exports.
pub const OSV_BUCKET_URL: &str = "https://osv-vulnerabilities.storage.googleapis.com";

/// User-Agent identifying this project to the bucket.
pub const USER_AGENT: &str =
    "TypeError/vuln-data-science (https://github.com/TypeError/vuln-data-science)";

/// Downloads `all.zip` exports from the OSV bucket.
pub struct OsvBucket {
    client: reqwest::Client,
    base_url: String,
}

impl OsvBucket {
    pub fn new() -> Result<Self> {
        Self::with_base_url(OSV_BUCKET_URL, USER_AGENT)
    }

    /// Creates a bucket client for a mirror or test server.
    pub fn with_base_url(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn archive_url(&self, ecosystem: Ecosystem) -> String {
        format!("{}/{}/all.zip", self.base_url, ecosystem.as_str())
    }
}

#[async_trait]
impl super::ArchiveSource for OsvBucket {
    fn name(&self) -> &'static str {
        "OSV bucket"
    }

    async fn download(
        &self,
        ecosystem: Ecosystem,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let url = self.archive_url(ecosystem);
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Network { ecosystem, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { ecosystem, status });
        }

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| Error::Network { ecosystem, source })?
        {
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;

        Ok(written)
    }
}
