use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use url::Url;

use jdkup_domain::DAEMON_JVM_PROPERTIES_FILE;

pub(crate) const DEFAULT_FOOJAY_URL: &str = "https://api.foojay.io";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 600;
const PROXY_VARS: &[&str] = &[
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
    "NO_PROXY",
    "no_proxy",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Unset keys use `default`; `0/false/no/off/""` disable.
    pub(crate) fn toggle(&self, key: &str, default: bool) -> bool {
        match self.var(key) {
            Some(value) => {
                let lowered = value.trim().to_ascii_lowercase();
                !matches!(lowered.as_str(), "0" | "false" | "no" | "off" | "")
            }
            None => default,
        }
    }

    pub(crate) fn non_empty(&self, key: &str) -> Option<&str> {
        self.var(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Where the jdkup state directory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) home: HomeLocation,
    pub(crate) network: NetworkConfig,
    pub(crate) provisioning: ProvisioningConfig,
    pub(crate) discovery: DiscoveryConfig,
    pub(crate) repositories: RepositoryConfig,
    pub(crate) properties_file: PathBuf,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the state directory cannot be resolved or a setting is malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        let snapshot = EnvSnapshot::capture();
        let cwd = env::current_dir().context("failed to read the current directory")?;
        Self::from_snapshot(&snapshot, &cwd)
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, cwd: &std::path::Path) -> anyhow::Result<Self> {
        let home = match snapshot.non_empty("JDKUP_HOME") {
            Some(path) => HomeLocation {
                path: PathBuf::from(path),
                source: "JDKUP_HOME",
            },
            None => HomeLocation {
                path: dirs_next::home_dir()
                    .ok_or_else(|| anyhow!("home directory not found; set JDKUP_HOME"))?
                    .join(".jdkup"),
                source: "default",
            },
        };
        let properties_file = snapshot
            .non_empty("JDKUP_PROPERTIES")
            .map_or_else(|| cwd.join(DAEMON_JVM_PROPERTIES_FILE), PathBuf::from);

        Ok(Self {
            home,
            network: NetworkConfig {
                online: snapshot.toggle("JDKUP_ONLINE", true),
                connect_timeout: seconds(snapshot, "JDKUP_CONNECT_TIMEOUT", DEFAULT_CONNECT_TIMEOUT_SECS)?,
                read_timeout: seconds(snapshot, "JDKUP_READ_TIMEOUT", DEFAULT_READ_TIMEOUT_SECS)?,
                use_proxies: snapshot.toggle(
                    "JDKUP_KEEP_PROXIES",
                    PROXY_VARS.iter().any(|key| snapshot.non_empty(key).is_some()),
                ),
            },
            provisioning: ProvisioningConfig {
                auto_download: snapshot.toggle("JDKUP_AUTO_DOWNLOAD", true),
            },
            discovery: DiscoveryConfig {
                auto_detect: snapshot.toggle("JDKUP_AUTO_DETECT", true),
                installation_paths: snapshot
                    .non_empty("JDKUP_INSTALLATION_PATHS")
                    .map(|raw| env::split_paths(raw).filter(|p| !p.as_os_str().is_empty()).collect())
                    .unwrap_or_default(),
                installations_from_env: comma_list(snapshot.var("JDKUP_INSTALLATIONS_FROM_ENV")),
                host: HostLocations::from_snapshot(snapshot),
            },
            repositories: RepositoryConfig {
                entries: comma_list(snapshot.var("JDKUP_REPOSITORIES"))
                    .iter()
                    .map(|entry| RepositoryEntry::parse(entry))
                    .collect::<anyhow::Result<_>>()?,
                foojay_url: snapshot
                    .non_empty("JDKUP_FOOJAY_URL")
                    .unwrap_or(DEFAULT_FOOJAY_URL)
                    .trim_end_matches('/')
                    .to_string(),
            },
            properties_file,
        })
    }

    #[must_use]
    pub fn home(&self) -> &HomeLocation {
        &self.home
    }

    /// Root of the shared JDK cache, `<home>/jdks`.
    #[must_use]
    pub fn jdks_dir(&self) -> PathBuf {
        self.home.path.join("jdks")
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn provisioning(&self) -> &ProvisioningConfig {
        &self.provisioning
    }

    #[must_use]
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    #[must_use]
    pub fn repositories(&self) -> &RepositoryConfig {
        &self.repositories
    }

    #[must_use]
    pub fn properties_file(&self) -> &std::path::Path {
        &self.properties_file
    }

    pub(crate) fn force_online(&mut self, online: bool) {
        self.network.online = online;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub online: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Honour `HTTP(S)_PROXY` and friends; on by default only when one is set.
    pub use_proxies: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ProvisioningConfig {
    pub auto_download: bool,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub auto_detect: bool,
    pub installation_paths: Vec<PathBuf>,
    pub installations_from_env: Vec<String>,
    pub host: HostLocations,
}

impl DiscoveryConfig {
    /// Values of the variables named in `JDKUP_INSTALLATIONS_FROM_ENV`.
    #[must_use]
    pub fn environment_values(&self) -> Vec<(String, Option<String>)> {
        self.installations_from_env
            .iter()
            .map(|name| (name.clone(), self.host.variables.get(name).cloned()))
            .collect()
    }
}

/// Host directories the well-known installation suppliers look in.
#[derive(Debug, Clone, Default)]
pub struct HostLocations {
    pub java_home: Option<PathBuf>,
    pub user_home: Option<PathBuf>,
    pub asdf_data_dir: Option<PathBuf>,
    pub sdkman_candidates_dir: Option<PathBuf>,
    pub jabba_home: Option<PathBuf>,
    pub program_files: Vec<PathBuf>,
    variables: HashMap<String, String>,
}

impl HostLocations {
    fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        let user_home = dirs_next::home_dir();
        let under_home = |key: &str, relative: &str| {
            snapshot
                .non_empty(key)
                .map(PathBuf::from)
                .or_else(|| user_home.as_ref().map(|home| home.join(relative)))
        };
        let program_files = ["ProgramFiles", "ProgramW6432", "ProgramFiles(x86)"]
            .into_iter()
            .filter_map(|key| snapshot.non_empty(key).map(PathBuf::from))
            .fold(Vec::new(), |mut dirs, dir| {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
                dirs
            });
        Self {
            java_home: snapshot.non_empty("JAVA_HOME").map(PathBuf::from),
            asdf_data_dir: under_home("ASDF_DATA_DIR", ".asdf"),
            sdkman_candidates_dir: under_home("SDKMAN_CANDIDATES_DIR", ".sdkman/candidates"),
            jabba_home: under_home("JABBA_HOME", ".jabba"),
            user_home,
            program_files,
            variables: snapshot.vars.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub entries: Vec<RepositoryEntry>,
    pub foojay_url: String,
}

/// One configured download repository, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEntry {
    Foojay,
    Template(String),
}

impl RepositoryEntry {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        if raw.eq_ignore_ascii_case("foojay") {
            return Ok(Self::Foojay);
        }
        let probe = raw
            .replace("{version}", "17")
            .replace("{vendor}", "any")
            .replace("{implementation}", "vendor_specific")
            .replace("{os}", "linux")
            .replace("{arch}", "x86_64")
            .replace("{ext}", "tar.gz");
        Url::parse(&probe)
            .with_context(|| format!("JDKUP_REPOSITORIES entry `{raw}` is neither `foojay` nor a URL template"))?;
        Ok(Self::Template(raw.to_string()))
    }
}

fn comma_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

fn seconds(snapshot: &EnvSnapshot, key: &str, default: u64) -> anyhow::Result<Duration> {
    match snapshot.non_empty(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a number of seconds, got `{raw}`")),
        None => Ok(Duration::from_secs(default)),
    }
}
