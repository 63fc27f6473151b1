#![allow(dead_code)]

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use tempfile::TempDir;

/// Variables that would leak the developer's setup into a test run.
const ISOLATED_VARS: &[&str] = &[
    "JAVA_HOME",
    "JDKUP_ONLINE",
    "JDKUP_AUTO_DOWNLOAD",
    "JDKUP_INSTALLATION_PATHS",
    "JDKUP_INSTALLATIONS_FROM_ENV",
    "JDKUP_REPOSITORIES",
    "JDKUP_FOOJAY_URL",
    "JDKUP_KEEP_PROXIES",
];

pub struct Sandbox {
    pub temp: TempDir,
}

impl Sandbox {
    pub fn new(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("jdkup-home")
    }

    pub fn jdks(&self) -> PathBuf {
        self.home().join("jdks")
    }

    pub fn properties(&self) -> PathBuf {
        self.root()
            .join("project")
            .join("gradle")
            .join("gradle-daemon-jvm.properties")
    }

    /// `jdkup` with an isolated state directory and host detection disabled.
    pub fn jdkup(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("jdkup");
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.root())
            .env("JDKUP_HOME", self.home())
            .env("JDKUP_PROPERTIES", self.properties())
            .env("JDKUP_AUTO_DETECT", "false")
            .env("NO_COLOR", "1");
        cmd
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

/// A JDK home whose `bin/java` prints the settings a real launcher would.
pub fn write_fake_jdk(home: &Path, version: &str, vendor: &str) -> io::Result<()> {
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
        format!("JAVA_VERSION=\"{version}\"\nIMPLEMENTOR=\"{vendor}\"\n"),
    )
}

/// Packs `root` as `<dir>/<name>`, keeping `root`'s directory name as the top entry.
pub fn tar_gz(root: &Path, dir: &Path, name: &str) -> io::Result<PathBuf> {
    let archive = dir.join(name);
    let encoder = GzEncoder::new(File::create(&archive)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let top = root.file_name().map_or_else(|| PathBuf::from("jdk"), PathBuf::from);
    builder.append_dir_all(top, root)?;
    builder.into_inner()?.finish()?;
    Ok(archive)
}
