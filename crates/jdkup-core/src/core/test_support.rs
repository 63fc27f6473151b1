//! Fixtures shared by unit tests: fake JDK homes, archives and a detector that
//! reads the `release` file instead of launching java.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use jdkup_domain::{InstallationLocation, JvmInstallationMetadata};

use crate::probe::{metadata_from_properties, JvmMetadataDetector};

/// Writes `home/bin/java` (a shell script answering `-XshowSettings`) and `home/release`.
pub(crate) fn write_fake_jdk(home: &Path, version: &str, vendor: &str) -> io::Result<()> {
    fs::create_dir_all(home.join("bin"))?;
    let script = format!(
        "#!/bin/sh\ncat >&2 <<'EOF'\nProperty settings:\n    java.vendor = {vendor}\n    java.version = {version}\n    java.vm.name = OpenJDK 64-Bit Server VM\n    java.vm.vendor = {vendor}\n    os.arch = amd64\n\nopenjdk version \"{version}\"\nEOF\n"
    );
    let java = home.join("bin").join("java");
    fs::write(&java, script)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755))?;
    }
    fs::write(
        home.join("release"),
        format!("JAVA_VERSION=\"{version}\"\nIMPLEMENTOR=\"{vendor}\"\nOS_ARCH=\"amd64\"\n"),
    )
}

/// Packs `root` into `<dir>/<name>` as a gzip-compressed tarball.
pub(crate) fn tar_gz(root: &Path, dir: &Path, name: &str) -> io::Result<PathBuf> {
    let archive = dir.join(name);
    let encoder = GzEncoder::new(File::create(&archive)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let top = root
        .file_name()
        .map_or_else(|| PathBuf::from("jdk"), PathBuf::from);
    builder.append_dir_all(top, root)?;
    builder.into_inner()?.finish()?;
    Ok(archive)
}

/// Packs the children of `root` into `<dir>/<name>` without a wrapping directory.
pub(crate) fn flat_tar_gz(root: &Path, dir: &Path, name: &str) -> io::Result<PathBuf> {
    let archive = dir.join(name);
    let encoder = GzEncoder::new(File::create(&archive)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut children: Vec<PathBuf> = fs::read_dir(root)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<_>>()?;
    children.sort();
    for child in children {
        let Some(entry_name) = child.file_name() else {
            continue;
        };
        if child.is_dir() {
            builder.append_dir_all(entry_name, &child)?;
        } else {
            builder.append_path_with_name(&child, entry_name)?;
        }
    }
    builder.into_inner()?.finish()?;
    Ok(archive)
}

/// Reads `JAVA_VERSION`, `IMPLEMENTOR` and `OS_ARCH` from `<home>/release`.
#[derive(Debug, Default)]
pub(crate) struct ReleaseFileDetector;

impl JvmMetadataDetector for ReleaseFileDetector {
    fn metadata(&self, location: &InstallationLocation) -> JvmInstallationMetadata {
        let Ok(contents) = fs::read_to_string(location.path.join("release")) else {
            return JvmInstallationMetadata::failure(&location.path, "No release file");
        };
        let release: HashMap<&str, &str> = contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim().trim_matches('"')))
            .collect();
        let mut properties = HashMap::new();
        let mut copy = |from: &str, to: &str| {
            if let Some(value) = release.get(from) {
                properties.insert(to.to_string(), (*value).to_string());
            }
        };
        copy("JAVA_VERSION", "java.version");
        copy("IMPLEMENTOR", "java.vendor");
        copy("IMPLEMENTOR", "java.vm.vendor");
        copy("OS_ARCH", "os.arch");
        copy("JVM_NAME", "java.vm.name");
        metadata_from_properties(&location.path, &properties)
    }
}
