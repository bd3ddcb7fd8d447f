/// The `builder` module contains the `WsiBuilder` struct which is used to create a `Wsi` instance.
use crate::{
    index::DEFAULT_API_BASE,
    installer::DEFAULT_HEADER_SOURCE,
    os::HostOs,
    picker::AssetPicker,
    wsi::Wsi,
};
use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// `WsiBuilder` is used to create a [`Wsi`] instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct WsiBuilder<'a> {
    tag: Option<&'a str>,
    install_dir: Option<PathBuf>,
    api_base_url: Option<&'a str>,
    os: Option<HostOs>,
    header_source: Option<PathBuf>,
}

impl<'a> WsiBuilder<'a> {
    /// Returns a new empty `WsiBuilder`.
    #[must_use]
    pub fn new() -> Self {
        WsiBuilder::default()
    }

    /// Set the release tag to install, like `wasi-sdk-20.0`. The tag is used
    /// as-is, without validation against the release index; a tag the index
    /// does not know fails later, when no release matches it. If this is not
    /// set, [`Wsi::install_sdk`] lists the available tags and prompts for
    /// one on standard input.
    #[must_use]
    pub fn tag(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Set the directory to unpack the SDK into. The directory must be empty
    /// or missing. If this is not set, [`Wsi::install_sdk`] prompts for it,
    /// suggesting `<home>/opt/wasi-sdk/<version>`.
    #[must_use]
    pub fn install_dir<P: AsRef<Path>>(mut self, install_dir: P) -> Self {
        self.install_dir = Some(install_dir.as_ref().to_path_buf());
        self
    }

    /// Set the base URL for the release API. This is useful for testing.
    /// This should be something like
    /// `https://api.github.com/repos/WebAssembly/wasi-sdk`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Set the OS to pick a release asset for. If this is not set it is
    /// detected from the running system. Mostly useful for testing.
    #[must_use]
    pub fn os(mut self, os: HostOs) -> Self {
        self.os = Some(os);
        self
    }

    /// Set the path of the MPI header copied into the extracted sysroot.
    /// Defaults to `include/mpi.h` relative to the process working
    /// directory.
    #[must_use]
    pub fn header_source<P: AsRef<Path>>(mut self, header_source: P) -> Self {
        self.header_source = Some(header_source.as_ref().to_path_buf());
        self
    }

    /// Builds a new [`Wsi`] instance and returns it.
    ///
    /// # Errors
    ///
    /// This fails when the running system is not one the SDK is released
    /// for, or when the HTTP client cannot be constructed. The platform
    /// check runs here, before any network request is made.
    pub fn build(self) -> Result<Wsi> {
        let os = match self.os {
            Some(os) => os,
            None => HostOs::detect()?,
        };

        Ok(Wsi::new(
            reqwest_client()?,
            self.api_base_url.unwrap_or(DEFAULT_API_BASE).to_string(),
            self.tag.map(String::from),
            self.install_dir,
            AssetPicker::new(os),
            self.header_source
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HEADER_SOURCE)),
        ))
    }
}

fn reqwest_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("wsi version {}", super::VERSION))?,
    );
    Client::builder()
        .gzip(true)
        .connect_timeout(Duration::from_secs(10))
        .default_headers(headers)
        .build()
        .context("failed to build the HTTP client")
}
