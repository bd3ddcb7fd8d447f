use crate::{
    error::InstallError,
    os::HostOs,
    release::{Asset, Release},
};
use anyhow::Result;
use log::debug;

/// The name prefix every SDK tarball shares.
pub(crate) const ASSET_PREFIX: &str = "wasi-sdk";

#[derive(Debug)]
pub(crate) struct AssetPicker {
    os: HostOs,
}

impl AssetPicker {
    pub(crate) fn new(os: HostOs) -> Self {
        Self { os }
    }

    pub(crate) fn os(&self) -> HostOs {
        self.os
    }

    /// Picks the first asset whose name starts with [`ASSET_PREFIX`] and
    /// ends with this platform's suffix. First match wins, in asset order.
    pub(crate) fn pick_asset<'a>(&self, release: &'a Release) -> Result<&'a Asset> {
        let suffix = self.os.asset_suffix();
        debug!("matching assets against prefix `{ASSET_PREFIX}` and suffix `{suffix}`");

        for asset in &release.assets {
            if asset.name.starts_with(ASSET_PREFIX) && asset.name.ends_with(suffix) {
                debug!("picked asset named {}", asset.name);
                return Ok(asset);
            }
            debug!("asset `{}` does not match", asset.name);
        }

        Err(InstallError::NoMatchingAsset {
            tag: release.tag_name.clone(),
            os: self.os.to_string(),
            pattern: format!("{ASSET_PREFIX}-<version>-{suffix}"),
        }
        .into())
    }
}
