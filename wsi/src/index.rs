use crate::{error::InstallError, release::Release};
use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, StatusCode,
};
use std::time::Duration;

/// The upstream project whose releases we install.
pub(crate) const DEFAULT_API_BASE: &str = "https://api.github.com/repos/WebAssembly/wasi-sdk";

// Index requests get a hard deadline; asset downloads do not, since a full
// SDK archive can legitimately stream for minutes.
const INDEX_TIMEOUT: Duration = Duration::from_secs(30);

/// The full release listing, in the order the server returned it. The index
/// is assumed to be newest-first and is never re-sorted.
#[derive(Debug)]
pub(crate) struct ReleaseIndex {
    releases: Vec<Release>,
}

impl ReleaseIndex {
    #[cfg(test)]
    pub(crate) fn from_releases(releases: Vec<Release>) -> Self {
        ReleaseIndex { releases }
    }

    /// Fetches the index from `<api_base>/releases`. A not-found status and
    /// any other error status map to distinct fatal errors; neither is
    /// retried.
    pub(crate) async fn fetch(client: &Client, api_base: &str) -> Result<Self> {
        let url = format!("{api_base}/releases");
        debug!("fetching the release index from `{url}`");

        let req = client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_str("application/json")?)
            .timeout(INDEX_TIMEOUT)
            .build()?;
        let resp = match client.execute(req).await {
            Ok(resp) => resp,
            Err(e) => {
                return Err(InstallError::IndexUnavailable {
                    url,
                    reason: e.to_string(),
                }
                .into())
            }
        };

        match resp.status() {
            StatusCode::OK => (),
            StatusCode::NOT_FOUND => return Err(InstallError::IndexNotFound { url }.into()),
            status => {
                return Err(InstallError::IndexUnavailable {
                    url,
                    reason: format!("HTTP {status}"),
                }
                .into())
            }
        }

        let releases = resp
            .json::<Vec<Release>>()
            .await
            .with_context(|| format!("failed to parse the release index from `{url}`"))?;
        debug!("the index lists {} releases", releases.len());

        Ok(ReleaseIndex { releases })
    }

    pub(crate) fn tags(&self) -> impl Iterator<Item = &str> {
        self.releases.iter().map(|r| r.tag_name.as_str())
    }

    pub(crate) fn contains_tag(&self, tag: &str) -> bool {
        self.releases.iter().any(|r| r.tag_name == tag)
    }

    /// The suggested tag: the first entry in index order that is not flagged
    /// as a prerelease.
    pub(crate) fn default_tag(&self) -> Result<&str> {
        self.releases
            .iter()
            .find(|r| !r.prerelease)
            .map(|r| r.tag_name.as_str())
            .ok_or_else(|| anyhow!("the release index does not contain any stable release"))
    }

    pub(crate) fn release_for_tag(&self, tag: &str) -> Result<&Release> {
        self.releases
            .iter()
            .find(|r| r.tag_name == tag)
            .ok_or_else(|| anyhow!("no release named `{tag}` in the index"))
    }
}
