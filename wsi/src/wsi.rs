use crate::{index::ReleaseIndex, installer::Installer, picker::AssetPicker, prompt};
use anyhow::Result;
use log::{debug, info};
use reqwest::Client;
use std::{io, path::PathBuf};

/// `Wsi` is the core of this library, and is used to download and install a
/// WASI SDK release. Use the [`WsiBuilder`](crate::WsiBuilder) struct to
/// create a new `Wsi` instance.
#[derive(Debug)]
pub struct Wsi {
    client: Client,
    api_base: String,
    tag: Option<String>,
    install_dir: Option<PathBuf>,
    picker: AssetPicker,
    header_source: PathBuf,
}

impl Wsi {
    pub(crate) fn new(
        client: Client,
        api_base: String,
        tag: Option<String>,
        install_dir: Option<PathBuf>,
        picker: AssetPicker,
        header_source: PathBuf,
    ) -> Wsi {
        Wsi {
            client,
            api_base,
            tag,
            install_dir,
            picker,
            header_source,
        }
    }

    /// Installs the SDK. This fetches the release index, resolves the tag
    /// and the install directory (prompting on standard input for whichever
    /// was not supplied up front), picks this platform's release asset,
    /// streams the archive into the install directory with its top-level
    /// folder stripped, and finally copies the MPI header into the extracted
    /// sysroot.
    ///
    /// # Errors
    ///
    /// Every failure is terminal, and a failed run may leave a partially
    /// populated install directory behind. Errors include:
    ///
    /// * The release index is unreachable or does not exist.
    /// * The index contains no stable release to suggest as the default.
    /// * The chosen tag names no release, or lacks the `wasi-sdk-` prefix
    ///   when the default install directory has to be derived from it.
    /// * No asset in the chosen release matches this platform's naming
    ///   convention.
    /// * The install directory exists and is not empty.
    /// * The download or the extraction fails partway.
    /// * The extracted tree has no sysroot include directory to receive the
    ///   MPI header.
    pub async fn install_sdk(&mut self) -> Result<()> {
        let index = ReleaseIndex::fetch(&self.client, &self.api_base).await?;

        let tag = match self.tag.take() {
            Some(tag) => tag,
            None => prompt::select_tag(&index, io::stdin().lock(), io::stdout().lock())?,
        };
        debug!("installing release `{tag}`");

        let install_dir = match self.install_dir.take() {
            Some(dir) => dir,
            None => prompt::select_install_dir(&tag, io::stdin().lock(), io::stdout().lock())?,
        };
        debug!("installing into {}", install_dir.display());

        let release = index.release_for_tag(&tag)?;
        let asset = self.picker.pick_asset(release)?;

        let installer = Installer::new(install_dir, self.header_source.clone());
        installer.prepare_install_dir()?;
        installer.download_and_unpack(&self.client, asset).await?;
        installer.copy_sysroot_header()?;

        info!("installed {tag} for {}", self.picker.os());
        Ok(())
    }
}
