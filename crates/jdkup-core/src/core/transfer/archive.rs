use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::Builder;
use zip::ZipArchive;

use crate::fs::is_non_empty_dir;
use crate::jdks::STAGING_PREFIX;
use crate::ToolchainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Classifies an archive by its file name.
    ///
    /// # Errors
    /// Returns [`ToolchainError::UnsupportedArchive`] for anything but `.zip`,
    /// `.tar.gz` and `.tgz`.
    pub fn from_file_name(name: &str) -> Result<Self, ToolchainError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else {
            Err(ToolchainError::UnsupportedArchive {
                file_name: name.to_string(),
            })
        }
    }
}

/// Extracts `archive` into `target`, leaving an existing non-empty `target`
/// untouched. Extraction goes through a sibling staging directory so a
/// crash never leaves a half-populated `target`.
///
/// # Errors
/// Returns an error for unsupported or corrupt archives and I/O failures.
pub fn unpack(archive: &Path, target: &Path) -> Result<()> {
    if is_non_empty_dir(target) {
        tracing::debug!(target = %target.display(), "archive already unpacked");
        return Ok(());
    }
    let name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_file_name(&name)?;
    let parent = target
        .parent()
        .with_context(|| format!("{} has no parent directory", target.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    let staging = Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .with_context(|| format!("creating staging directory under {}", parent.display()))?;
    extract(archive, staging.path(), kind)?;
    if target.exists() {
        fs::remove_dir(target)
            .with_context(|| format!("failed to clear {}", target.display()))?;
    }
    fs::rename(staging.path(), target).with_context(|| {
        format!(
            "failed to move {} into {}",
            staging.path().display(),
            target.display()
        )
    })?;
    Ok(())
}

fn extract(archive: &Path, dest: &Path, kind: ArchiveKind) -> Result<()> {
    let file =
        File::open(archive).with_context(|| format!("opening archive {}", archive.display()))?;
    match kind {
        ArchiveKind::TarGz => {
            let mut tar = Archive::new(GzDecoder::new(file));
            tar.set_preserve_mtime(true);
            tar.unpack(dest)
                .with_context(|| format!("extracting {} into {}", archive.display(), dest.display()))?;
        }
        ArchiveKind::Zip => {
            let mut zip = ZipArchive::new(file)
                .with_context(|| format!("reading zip archive {}", archive.display()))?;
            zip.extract(dest)
                .with_context(|| format!("extracting {} into {}", archive.display(), dest.display()))?;
        }
    }
    Ok(())
}
