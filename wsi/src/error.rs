use std::path::PathBuf;
use thiserror::Error;

/// Every fatal condition the installer reports. All variants are terminal:
/// nothing is retried and nothing is cleaned up after a failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The release index endpoint returned a not-found status.
    #[error("the WASI SDK release index could not be found at `{url}`")]
    IndexNotFound { url: String },

    /// The release index endpoint was unreachable or returned an error
    /// status other than not-found.
    #[error("failed fetching the WASI SDK release index from `{url}`: {reason}. Is github.com up?")]
    IndexUnavailable { url: String, reason: String },

    /// The host OS is not one the upstream project publishes SDK tarballs
    /// for.
    #[error("system `{os}` is not supported yet")]
    UnsupportedPlatform { os: String },

    /// The selected tag does not carry the `wasi-sdk-` prefix.
    #[error("`{prefix}` is not a prefix of `{tag}`")]
    InvalidTagFormat { tag: String, prefix: &'static str },

    /// No asset in the selected release matches the naming convention for
    /// the host platform.
    #[error(
        "no suitable asset found for release `{tag}` on {os}. Make sure that release assets are \
         still named `{pattern}`."
    )]
    NoMatchingAsset {
        tag: String,
        os: String,
        pattern: String,
    },

    /// The install directory exists and already contains entries.
    #[error("install directory `{}` is not empty", .0.display())]
    TargetNotEmpty(PathBuf),

    /// The download or the extraction of the archive failed. Not
    /// distinguished further.
    #[error("downloading `{url}` failed: {reason}")]
    TransferFailure { url: String, reason: String },
}
