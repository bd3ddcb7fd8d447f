use crate::error::InstallError;
use anyhow::Result;

/// The operating systems the upstream project publishes SDK tarballs for.
/// Each maps to a fixed filename suffix on the release assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum HostOs {
    #[strum(serialize = "linux")]
    Linux,
    #[strum(serialize = "macos")]
    MacOs,
}

impl HostOs {
    /// Detects the running OS. This happens before any network request is
    /// made, so an unsupported host never touches the release index.
    pub(crate) fn detect() -> Result<Self> {
        Self::from_name(std::env::consts::OS)
    }

    pub(crate) fn from_name(name: &str) -> Result<Self> {
        match name {
            "linux" => Ok(HostOs::Linux),
            "macos" => Ok(HostOs::MacOs),
            _ => Err(InstallError::UnsupportedPlatform {
                os: name.to_string(),
            }
            .into()),
        }
    }

    /// The filename suffix release assets carry for this OS.
    pub(crate) fn asset_suffix(self) -> &'static str {
        match self {
            HostOs::Linux => "linux.tar.gz",
            HostOs::MacOs => "macos.tar.gz",
        }
    }
}
