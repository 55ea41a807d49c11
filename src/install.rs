//! Terraform release installation
//!
//! Downloads an exact pinned release from releases.hashicorp.com, verifies
//! the archive against the published SHA256SUMS file, and unpacks the
//! binary into a scratch directory. The caller owns moving the result into
//! its final cache location.

use crate::error::{RunnerError, RunnerResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RELEASES_BASE_URL: &str = "https://releases.hashicorp.com/terraform";

/// Name of the binary inside the release archive
const BINARY_ENTRY: &str = "terraform";

/// Installs a pinned terraform version into a scratch directory.
///
/// Returns the path of the produced binary inside that directory.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, version: &str, scratch_dir: &Path) -> RunnerResult<PathBuf>;
}

/// Installer backed by the official HashiCorp release archives
pub struct ReleaseInstaller {
    client: reqwest::Client,
    base_url: String,
}

impl ReleaseInstaller {
    /// Create an installer against the official release host
    pub fn new() -> Self {
        Self::with_base_url(RELEASES_BASE_URL)
    }

    /// Create an installer against a custom release mirror
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Map Rust target names onto HashiCorp release naming
    fn platform() -> (&'static str, &'static str) {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            other => other,
        };
        (os, arch)
    }

    fn archive_name(version: &str) -> String {
        let (os, arch) = Self::platform();
        format!("terraform_{version}_{os}_{arch}.zip")
    }

    async fn fetch(&self, url: &str) -> RunnerResult<Vec<u8>> {
        debug!("fetching {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RunnerError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let body = response.bytes().await.map_err(|e| RunnerError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(body.to_vec())
    }

    async fn expected_checksum(&self, version: &str, archive: &str) -> RunnerResult<String> {
        let url = format!("{}/{version}/terraform_{version}_SHA256SUMS", self.base_url);
        let body = self.fetch(&url).await?;
        let listing = String::from_utf8_lossy(&body);

        parse_checksum(&listing, archive).ok_or_else(|| {
            RunnerError::install(version, format!("no checksum entry for {archive}"))
        })
    }
}

impl Default for ReleaseInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Installer for ReleaseInstaller {
    async fn install(&self, version: &str, scratch_dir: &Path) -> RunnerResult<PathBuf> {
        let archive = Self::archive_name(version);
        let url = format!("{}/{version}/{archive}", self.base_url);

        info!("downloading terraform release from {url}");
        let payload = self.fetch(&url).await?;

        let expected = self.expected_checksum(version, &archive).await?;
        let actual = hex::encode(Sha256::digest(&payload));
        if actual != expected {
            return Err(RunnerError::ChecksumMismatch {
                artifact: archive,
                expected,
                actual,
            });
        }
        debug!("checksum verified for {archive}");

        let dest = scratch_dir.join(BINARY_ENTRY);
        extract_binary(version, &payload, &dest)?;

        Ok(dest)
    }
}

/// Find the checksum for `archive` in a SHA256SUMS listing
fn parse_checksum(listing: &str, archive: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let hash = parts.next()?;
        let name = parts.next()?;
        (name == archive).then(|| hash.to_string())
    })
}

/// Extract the terraform entry out of a release zip
fn extract_binary(version: &str, payload: &[u8], dest: &Path) -> RunnerResult<()> {
    let cursor = std::io::Cursor::new(payload);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| RunnerError::install(version, format!("reading release archive: {e}")))?;

    let mut entry = archive.by_name(BINARY_ENTRY).map_err(|e| {
        RunnerError::install(version, format!("archive has no {BINARY_ENTRY} entry: {e}"))
    })?;

    let mut file = std::fs::File::create(dest)
        .map_err(|e| RunnerError::io(format!("creating {}", dest.display()), e))?;
    std::io::copy(&mut entry, &mut file)
        .map_err(|e| RunnerError::io(format!("unpacking {}", dest.display()), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn release_zip(contents: &[u8]) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file(BINARY_ENTRY, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn archive_name_is_version_pinned() {
        let name = ReleaseInstaller::archive_name("1.5.0");
        assert!(name.starts_with("terraform_1.5.0_"));
        assert!(name.ends_with(".zip"));
    }

    #[test]
    fn parses_checksum_listing() {
        let listing = "\
abc123  terraform_1.5.0_linux_amd64.zip
def456  terraform_1.5.0_darwin_arm64.zip
";
        assert_eq!(
            parse_checksum(listing, "terraform_1.5.0_linux_amd64.zip").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            parse_checksum(listing, "terraform_1.5.0_darwin_arm64.zip").as_deref(),
            Some("def456")
        );
        assert!(parse_checksum(listing, "terraform_1.5.0_windows_amd64.zip").is_none());
    }

    #[test]
    fn extracts_binary_entry() {
        let dir = TempDir::new().unwrap();
        let payload = release_zip(b"#!/bin/sh\nexit 0\n");
        let dest = dir.path().join("terraform");

        extract_binary("1.5.0", &payload, &dest).unwrap();

        let extracted = std::fs::read(&dest).unwrap();
        assert_eq!(extracted, b"#!/bin/sh\nexit 0\n");
    }

    #[test]
    fn rejects_archive_without_binary() {
        let dir = TempDir::new().unwrap();
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("README", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"nothing useful").unwrap();
            writer.finish().unwrap();
        }

        let err = extract_binary("1.5.0", &buf.into_inner(), &dir.path().join("terraform"))
            .unwrap_err();
        assert!(err.to_string().contains("no terraform entry"));
    }
}
