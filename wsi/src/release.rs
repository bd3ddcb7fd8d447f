use serde::Deserialize;
use url::Url;

/// One entry of the upstream release index, as the server delivers it.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Release {
    pub(crate) tag_name: String,
    pub(crate) prerelease: bool,
    pub(crate) assets: Vec<Asset>,
}

/// A downloadable file attached to a [`Release`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct Asset {
    pub(crate) name: String,
    pub(crate) browser_download_url: Url,
}
