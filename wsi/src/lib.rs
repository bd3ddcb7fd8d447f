//! A library for downloading and installing WASI SDK releases.
//!
//! `wsi` is the install step of a WebAssembly MPI toolchain. It downloads a
//! [WASI SDK](https://github.com/WebAssembly/wasi-sdk) release matching the
//! host OS, unpacks it into a directory of your choice, and adds the
//! toolchain's `mpi.h` header to the SDK's sysroot so programs can compile
//! against the MPI implementation the runtime provides.
//!
//! This project also ships a CLI tool named `wsi`. See the `wsi-cli` crate
//! for details on using it.
//!
//! The main entry point for programmatic use is the [`WsiBuilder`] struct.
//! Here is an example of its usage:
//!
//! ```ignore
//! use wsi::WsiBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut wsi = WsiBuilder::new()
//!         .tag("wasi-sdk-20.0")
//!         .install_dir("/opt/wasi-sdk/20.0")
//!         .build()?;
//!
//!     wsi.install_sdk().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Leaving the tag or the install directory unset makes
//! [`Wsi::install_sdk`] prompt for it on standard input; the prompt lists
//! every available tag and suggests the newest stable one.
//!
//! ## How `wsi` Picks the Release and the Asset
//!
//! The release index is fetched once per run and is assumed to be ordered
//! newest-first; it is never re-sorted. The suggested default is the first
//! entry that is not flagged as a prerelease.
//!
//! Within the chosen release, `wsi` downloads the first asset whose name
//! starts with `wasi-sdk` and ends with the host platform's suffix:
//!
//! - `linux.tar.gz` on Linux
//! - `macos.tar.gz` on macOS
//!
//! No other host is supported; anything else fails before a single request
//! is made. The first matching asset wins, in the order the index lists
//! them — `wsi` deliberately does not try to be smarter than the upstream
//! naming convention.
//!
//! The archive is streamed straight into the extractor with its top-level
//! directory stripped, so the install directory receives the SDK tree
//! itself and the archive is never buffered whole in memory. The install
//! directory must be empty or missing; `wsi` refuses to unpack over
//! existing files.

mod builder;
mod error;
mod index;
mod installer;
mod os;
mod paths;
mod picker;
mod prompt;
mod release;
mod wsi;

pub use crate::{builder::WsiBuilder, error::InstallError, os::HostOs, wsi::Wsi};

/// The version of the `wsi` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// This function initializes logging for the application. It's public for
/// the sake of the `wsi` binary, but it lives in the library crate so that
/// test code can also enable logging.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightBlack)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);
    let level_colors = line_colors.info(Color::Green).debug(Color::Black);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}][{level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    line_colors.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = level_colors.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        // This is very noisy.
        .level_for("hyper", log::LevelFilter::Error)
        .chain(std::io::stderr())
        .apply()
}
