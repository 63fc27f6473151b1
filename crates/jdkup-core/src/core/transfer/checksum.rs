use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// `<archive>.sha256`
#[must_use]
pub fn sidecar_path(archive: &Path) -> PathBuf {
    let mut name = archive
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".sha256");
    archive.with_file_name(name)
}

/// # Errors
/// Returns an error if the sidecar cannot be written.
pub fn write_sidecar(archive: &Path, sha256: &str) -> Result<()> {
    let sidecar = sidecar_path(archive);
    fs::write(&sidecar, format!("{sha256}\n"))
        .with_context(|| format!("failed to write {}", sidecar.display()))
}

/// # Errors
/// Returns an error if `path` cannot be read.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// True only for an archive whose sidecar matches its content.
#[must_use]
pub fn is_complete_archive(archive: &Path) -> bool {
    let Ok(recorded) = fs::read_to_string(sidecar_path(archive)) else {
        return false;
    };
    match sha256_file(archive) {
        Ok(actual) => actual == recorded.trim(),
        Err(_) => false,
    }
}
