use crate::error::InstallError;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// The prefix every installable tag carries, e.g. `wasi-sdk-20.0`.
pub(crate) const TAG_PREFIX: &str = "wasi-sdk-";

/// The version part of a tag, i.e. the tag with [`TAG_PREFIX`] stripped.
pub(crate) fn sdk_version(tag: &str) -> Result<&str> {
    match tag.strip_prefix(TAG_PREFIX) {
        Some(version) => Ok(version),
        None => Err(InstallError::InvalidTagFormat {
            tag: tag.to_string(),
            prefix: TAG_PREFIX,
        }
        .into()),
    }
}

/// The suggested install location, `<home>/opt/wasi-sdk/<version>`.
pub(crate) fn default_install_dir(version: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine the home directory"))?;
    Ok(home.join("opt").join("wasi-sdk").join(version))
}
