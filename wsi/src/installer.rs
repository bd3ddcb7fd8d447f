use crate::{error::InstallError, release::Asset};
use anyhow::{anyhow, bail, Context, Result};
use binstall_tar::Archive;
use flate2::read::GzDecoder;
use futures::TryStreamExt;
use log::{debug, info};
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, StatusCode,
};
use std::{
    fs,
    io::Read,
    path::{Component, Path, PathBuf},
};
use tokio_util::io::{StreamReader, SyncIoBridge};

/// Subpath of the extracted tree that holds the sysroot headers. The archive
/// is expected to contain it already; we never create it.
const SYSROOT_INCLUDE_DIR: &str = "share/wasi-sysroot/include";

/// The header file added to the sysroot after extraction, relative to the
/// process working directory.
pub(crate) const DEFAULT_HEADER_SOURCE: &str = "include/mpi.h";

#[derive(Debug)]
pub(crate) struct Installer {
    install_dir: PathBuf,
    header_source: PathBuf,
}

impl Installer {
    pub(crate) fn new(install_dir: PathBuf, header_source: PathBuf) -> Self {
        Installer {
            install_dir,
            header_source,
        }
    }

    /// Creates the install directory (and parents) when missing. An existing
    /// directory must be empty; we never overwrite or merge into a populated
    /// one.
    pub(crate) fn prepare_install_dir(&self) -> Result<()> {
        if !self.install_dir.exists() {
            debug!("creating install directory {}", self.install_dir.display());
            return fs::create_dir_all(&self.install_dir).with_context(|| {
                format!(
                    "failed to create install directory `{}`",
                    self.install_dir.display()
                )
            });
        }

        let mut entries = fs::read_dir(&self.install_dir).with_context(|| {
            format!(
                "failed to list install directory `{}`",
                self.install_dir.display()
            )
        })?;
        if entries.next().is_some() {
            return Err(InstallError::TargetNotEmpty(self.install_dir.clone()).into());
        }
        Ok(())
    }

    /// Streams the asset's archive into the install directory. The response
    /// body is bridged into the gzip decoder on a blocking task, so the pipe
    /// buffer is the only copy of archive bytes ever held in memory, and the
    /// download stalls whenever the extractor falls behind.
    pub(crate) async fn download_and_unpack(&self, client: &Client, asset: &Asset) -> Result<()> {
        let url = asset.browser_download_url.clone();
        info!("downloading {url}");

        let resp = client
            .get(url.clone())
            .header(
                ACCEPT,
                HeaderValue::from_str("application/octet-stream")
                    .context("failed to create header value for Accept header")?,
            )
            .send()
            .await
            .map_err(|e| InstallError::TransferFailure {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if resp.status() != StatusCode::OK {
            return Err(InstallError::TransferFailure {
                url: url.to_string(),
                reason: format!("HTTP {}", resp.status()),
            }
            .into());
        }

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        let reader = SyncIoBridge::new(StreamReader::new(stream));

        let dest = self.install_dir.clone();
        let unpacked = tokio::task::spawn_blocking(move || unpack_stripped_tarball(reader, &dest))
            .await
            .context("the extraction task failed")?;
        match unpacked {
            Ok(()) => {
                info!("unpacked the SDK into {}", self.install_dir.display());
                Ok(())
            }
            Err(e) => Err(InstallError::TransferFailure {
                url: url.to_string(),
                reason: format!("{e:#}"),
            }
            .into()),
        }
    }

    /// Copies the MPI header into the extracted sysroot. The include
    /// directory comes out of the archive itself; if it is missing, the SDK
    /// layout changed and the copy error says so.
    pub(crate) fn copy_sysroot_header(&self) -> Result<()> {
        let include_dir = self.install_dir.join(SYSROOT_INCLUDE_DIR);
        let file_name = self.header_source.file_name().ok_or_else(|| {
            anyhow!(
                "header source `{}` has no file name",
                self.header_source.display()
            )
        })?;
        let target = include_dir.join(file_name);

        debug!(
            "copying {} to {}",
            self.header_source.display(),
            target.display()
        );
        fs::copy(&self.header_source, &target).with_context(|| {
            format!(
                "failed to copy `{}` into `{}`; does the extracted SDK still contain `{}`?",
                self.header_source.display(),
                include_dir.display(),
                SYSROOT_INCLUDE_DIR,
            )
        })?;
        Ok(())
    }
}

/// Unpacks a gzip-compressed tar stream into `dest`, dropping the outermost
/// path component from every entry so the archive's top-level folder
/// collapses into `dest` itself.
fn unpack_stripped_tarball<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    archive.set_preserve_permissions(true);

    for entry in archive.entries().context("failed to read the archive")? {
        let mut entry = entry.context("failed to read an archive entry")?;
        let path = entry
            .path()
            .context("an archive entry has an unreadable path")?
            .into_owned();

        if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
            bail!(
                "refusing to extract an entry with an absolute or parent-relative path: {}",
                path.display()
            );
        }

        let Some(stripped) = strip_first_component(&path) else {
            debug!("skipping top-level entry {}", path.display());
            continue;
        };

        let target = dest.join(&stripped);
        debug!("unpacking {} to {}", path.display(), target.display());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        entry
            .unpack(&target)
            .with_context(|| format!("failed to unpack `{}`", target.display()))?;
    }

    Ok(())
}

/// The equivalent of `tar --strip 1`: returns the path without its first
/// component, or `None` for entries that collapse to nothing.
fn strip_first_component(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use mockito::Server;
    use std::io::Cursor;
    use tempfile::tempdir;
    use test_log::test;
    use url::Url;

    fn asset(url: &str) -> Asset {
        Asset {
            name: "wasi-sdk-20.0-linux.tar.gz".to_string(),
            browser_download_url: Url::parse(url).unwrap(),
        }
    }

    /// A small gzipped tarball shaped like an SDK release: everything under
    /// one top-level folder, including the sysroot include directory.
    fn sdk_tarball(root: &str) -> Vec<u8> {
        let mut builder = binstall_tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));

        let mut dir = binstall_tar::Header::new_gnu();
        dir.set_entry_type(binstall_tar::EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_cksum();
        builder
            .append_data(&mut dir, format!("{root}/"), std::io::empty())
            .unwrap();

        for (path, content) in [
            (format!("{root}/bin/clang"), b"#!clang".as_slice()),
            (
                format!("{root}/share/wasi-sysroot/include/stdio.h"),
                b"// stdio".as_slice(),
            ),
        ] {
            let mut header = binstall_tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn strip_first_component_drops_one_level() {
        assert_eq!(
            strip_first_component(Path::new("wasi-sdk-20.0/bin/clang")),
            Some(PathBuf::from("bin/clang")),
        );
        assert_eq!(
            strip_first_component(Path::new("wasi-sdk-20.0/VERSION")),
            Some(PathBuf::from("VERSION")),
        );
        assert_eq!(strip_first_component(Path::new("wasi-sdk-20.0/")), None);
        assert_eq!(strip_first_component(Path::new("wasi-sdk-20.0")), None);
        assert_eq!(strip_first_component(Path::new("")), None);
    }

    #[test]
    fn prepare_creates_a_missing_directory_with_parents() -> Result<()> {
        let td = tempdir()?;
        let dir = td.path().join("opt").join("wasi-sdk").join("20.0");
        let installer = Installer::new(dir.clone(), PathBuf::from(DEFAULT_HEADER_SOURCE));

        installer.prepare_install_dir()?;
        assert!(dir.is_dir());
        Ok(())
    }

    #[test]
    fn prepare_accepts_an_existing_empty_directory() -> Result<()> {
        let td = tempdir()?;
        let installer = Installer::new(
            td.path().to_path_buf(),
            PathBuf::from(DEFAULT_HEADER_SOURCE),
        );
        installer.prepare_install_dir()
    }

    #[test]
    fn prepare_refuses_a_populated_directory() -> Result<()> {
        let td = tempdir()?;
        fs::write(td.path().join("leftover"), b"x")?;
        let installer = Installer::new(
            td.path().to_path_buf(),
            PathBuf::from(DEFAULT_HEADER_SOURCE),
        );

        let err = installer.prepare_install_dir().unwrap_err();
        match err.downcast_ref::<InstallError>() {
            Some(InstallError::TargetNotEmpty(path)) => assert_eq!(path, td.path()),
            _ => panic!("expected TargetNotEmpty, got {err}"),
        }
        Ok(())
    }

    #[test]
    fn unpacking_strips_the_archive_root() -> Result<()> {
        let td = tempdir()?;
        unpack_stripped_tarball(Cursor::new(sdk_tarball("wasi-sdk-20.0")), td.path())?;

        assert!(td.path().join("bin/clang").is_file());
        assert!(td
            .path()
            .join("share/wasi-sysroot/include/stdio.h")
            .is_file());
        assert!(!td.path().join("wasi-sdk-20.0").exists());
        Ok(())
    }

    #[test]
    fn every_entry_is_stripped_not_just_a_common_root() -> Result<()> {
        // Two different top-level folders; `tar --strip 1` drops the first
        // component of each one regardless.
        let mut builder = binstall_tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (path, content) in [("one/a.txt", b"a".as_slice()), ("two/b.txt", b"b".as_slice())] {
            let mut header = binstall_tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content).unwrap();
        }
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let td = tempdir()?;
        unpack_stripped_tarball(Cursor::new(bytes), td.path())?;
        assert!(td.path().join("a.txt").is_file());
        assert!(td.path().join("b.txt").is_file());
        Ok(())
    }

    #[test]
    fn copy_sysroot_header_lands_in_the_include_dir() -> Result<()> {
        let td = tempdir()?;
        let include_dir = td.path().join("sdk").join(SYSROOT_INCLUDE_DIR);
        fs::create_dir_all(&include_dir)?;
        let header = td.path().join("mpi.h");
        fs::write(&header, b"// mpi")?;

        let installer = Installer::new(td.path().join("sdk"), header);
        installer.copy_sysroot_header()?;

        assert_eq!(fs::read(include_dir.join("mpi.h"))?, b"// mpi");
        Ok(())
    }

    #[test]
    fn copy_sysroot_header_requires_the_include_dir_to_exist() -> Result<()> {
        let td = tempdir()?;
        let header = td.path().join("mpi.h");
        fs::write(&header, b"// mpi")?;

        // No share/wasi-sysroot/include in the "extracted" tree.
        let installer = Installer::new(td.path().join("sdk"), header);
        let err = installer.copy_sysroot_header().unwrap_err();
        assert!(err.to_string().contains(SYSROOT_INCLUDE_DIR));
        Ok(())
    }

    #[test(tokio::test)]
    async fn download_streams_the_archive_into_place() -> Result<()> {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/dl/wasi-sdk-20.0-linux.tar.gz")
            .with_status(200)
            .with_body(sdk_tarball("wasi-sdk-20.0"))
            .create_async()
            .await;

        let td = tempdir()?;
        let installer = Installer::new(
            td.path().to_path_buf(),
            PathBuf::from(DEFAULT_HEADER_SOURCE),
        );
        installer
            .download_and_unpack(
                &Client::new(),
                &asset(&format!("{}/dl/wasi-sdk-20.0-linux.tar.gz", server.url())),
            )
            .await?;

        assert!(td.path().join("bin/clang").is_file());
        m.assert_async().await;
        Ok(())
    }

    #[test(tokio::test)]
    async fn download_failures_are_transfer_failures() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/dl/wasi-sdk-20.0-linux.tar.gz")
            .with_status(403)
            .create_async()
            .await;

        let td = tempdir()?;
        let installer = Installer::new(
            td.path().to_path_buf(),
            PathBuf::from(DEFAULT_HEADER_SOURCE),
        );
        let err = installer
            .download_and_unpack(
                &Client::new(),
                &asset(&format!("{}/dl/wasi-sdk-20.0-linux.tar.gz", server.url())),
            )
            .await
            .unwrap_err();

        match err.downcast_ref::<InstallError>() {
            Some(InstallError::TransferFailure { reason, .. }) => {
                assert!(reason.contains("403"), "reason was `{reason}`");
            }
            _ => panic!("expected TransferFailure, got {err}"),
        }
        Ok(())
    }

    #[test(tokio::test)]
    async fn a_corrupt_archive_is_a_transfer_failure() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/dl/wasi-sdk-20.0-linux.tar.gz")
            .with_status(200)
            .with_body(b"this is not a gzip stream".as_slice())
            .create_async()
            .await;

        let td = tempdir()?;
        let installer = Installer::new(
            td.path().to_path_buf(),
            PathBuf::from(DEFAULT_HEADER_SOURCE),
        );
        let err = installer
            .download_and_unpack(
                &Client::new(),
                &asset(&format!("{}/dl/wasi-sdk-20.0-linux.tar.gz", server.url())),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::TransferFailure { .. }),
        ));
        Ok(())
    }
}
