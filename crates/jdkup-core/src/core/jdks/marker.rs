use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jdkup_domain::OperatingSystem;

/// Zero-byte file marking a directory as a completely installed JDK.
pub const MARKER_FILE: &str = "provisioned.ok";

/// Lifecycle of a directory in the JDK cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Absent,
    Unpacking,
    Ready,
}

impl InstallState {
    #[must_use]
    pub fn of(dir: &Path) -> Self {
        if !dir.is_dir() {
            Self::Absent
        } else if is_marked(dir) || !all_marked_locations(dir).is_empty() {
            Self::Ready
        } else {
            Self::Unpacking
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Unpacking => "unpacking",
            Self::Ready => "ready",
        }
    }
}

#[must_use]
pub fn is_marked(dir: &Path) -> bool {
    dir.join(MARKER_FILE).is_file()
}

/// Writes the marker into `dir`.
///
/// # Errors
/// Returns an error if the marker cannot be created.
pub fn mark_as_ready(dir: &Path) -> Result<()> {
    let marker = dir.join(MARKER_FILE);
    File::create(&marker)
        .map(|_| ())
        .with_context(|| format!("failed to create {}", marker.display()))
}

/// `candidate` itself when marked, otherwise its marked direct children.
#[must_use]
pub fn all_marked_locations(candidate: &Path) -> Vec<PathBuf> {
    if is_marked(candidate) {
        return vec![candidate.to_path_buf()];
    }
    let Ok(entries) = fs::read_dir(candidate) else {
        return Vec::new();
    };
    let mut marked: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && is_marked(path))
        .collect();
    marked.sort();
    marked
}

/// Directory an archive's JDK lives in: its top-level directory when it is
/// the only one, otherwise the unpack folder itself.
///
/// # Errors
/// Returns an error if `unpack_folder` cannot be read.
pub fn marked_location(unpack_folder: &Path) -> Result<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(unpack_folder)
        .with_context(|| format!("failed to read {}", unpack_folder.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    match dirs.pop() {
        Some(only) if dirs.is_empty() => Ok(only),
        _ => Ok(unpack_folder.to_path_buf()),
    }
}

/// Java home inside an installed directory. On macOS distributions nest the
/// home at `Contents/Home`, either directly or under one bundle directory.
#[must_use]
pub fn resolve_effective_home(dir: &Path, os: OperatingSystem) -> PathBuf {
    if !os.is_macos() {
        return dir.to_path_buf();
    }
    let direct = dir.join("Contents").join("Home");
    if direct.is_dir() {
        return direct;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return dir.to_path_buf();
    };
    let mut nested: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path().join("Contents").join("Home"))
        .filter(|home| home.is_dir())
        .collect();
    nested.sort();
    nested
        .into_iter()
        .next()
        .unwrap_or_else(|| dir.to_path_buf())
}
