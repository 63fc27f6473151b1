//! Reader and writer for the daemon JVM criteria file
//! (`gradle/gradle-daemon-jvm.properties`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use url::Url;

use crate::platform::{toolchain_supported_platforms, BuildPlatform};
use crate::spec::{JavaLanguageVersion, JvmImplementation, ToolchainSpec};
use crate::vendor::JvmVendorSpec;

pub const DAEMON_JVM_PROPERTIES_FILE: &str = "gradle/gradle-daemon-jvm.properties";
pub const TOOLCHAIN_VERSION_PROPERTY: &str = "toolchainVersion";
pub const TOOLCHAIN_VENDOR_PROPERTY: &str = "toolchainVendor";
pub const TOOLCHAIN_IMPLEMENTATION_PROPERTY: &str = "toolchainImplementation";

const GENERATED_HEADER: &str = "#This file is generated by updateDaemonJvm";

/// Key holding the download URL for `platform`, e.g. `toolchainlinuxaarch64Url`.
#[must_use]
pub fn toolchain_url_property(platform: BuildPlatform) -> String {
    format!(
        "toolchain{}{}Url",
        platform.operating_system.property_name(),
        platform.architecture.as_str().to_ascii_lowercase()
    )
}

#[must_use]
pub fn properties_path(project_root: &Path) -> PathBuf {
    project_root.join(DAEMON_JVM_PROPERTIES_FILE)
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value `{value}` for `{key}` in {path}: {reason}")]
pub struct InvalidPropertyError {
    pub path: String,
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Parsed criteria file; keeps unknown keys and their order for rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonJvmProperties {
    entries: IndexMap<String, String>,
}

impl DaemonJvmProperties {
    /// Reads `path`; a missing file yields empty properties.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut entries = IndexMap::new();
        let mut pending = String::new();
        for raw_line in contents.lines() {
            let line = raw_line.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }
            if ends_with_continuation(line) {
                pending.push_str(&line[..line.len() - 1]);
                continue;
            }
            pending.push_str(line);
            let logical = std::mem::take(&mut pending);
            let (key, value) = split_key_value(&logical);
            entries.insert(unescape(&key), unescape(&value));
        }
        if !pending.is_empty() {
            let (key, value) = split_key_value(&pending);
            entries.insert(unescape(&key), unescape(&value));
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.shift_remove(key);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The toolchain criteria recorded in the file.
    ///
    /// # Errors
    /// Returns [`InvalidPropertyError`] when a criterion cannot be parsed.
    pub fn toolchain_spec(&self, path: &Path) -> Result<ToolchainSpec, InvalidPropertyError> {
        let invalid = |key: &str, value: &str, reason: String| InvalidPropertyError {
            path: path.display().to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        let mut spec = ToolchainSpec::default();
        if let Some(raw) = self.get(TOOLCHAIN_VERSION_PROPERTY) {
            let version = raw
                .parse::<JavaLanguageVersion>()
                .map_err(|err| invalid(TOOLCHAIN_VERSION_PROPERTY, raw, err.to_string()))?;
            spec.language_version = Some(version);
        }
        if let Some(raw) = self.get(TOOLCHAIN_VENDOR_PROPERTY) {
            spec.vendor = raw
                .parse::<JvmVendorSpec>()
                .map_err(|err| invalid(TOOLCHAIN_VENDOR_PROPERTY, raw, err.to_string()))?;
        }
        if let Some(raw) = self.get(TOOLCHAIN_IMPLEMENTATION_PROPERTY) {
            spec.implementation = raw
                .parse::<JvmImplementation>()
                .map_err(|err| invalid(TOOLCHAIN_IMPLEMENTATION_PROPERTY, raw, err.to_string()))?;
        }
        Ok(spec)
    }

    /// Per-platform download URLs; unparsable URLs are skipped with a warning.
    #[must_use]
    pub fn download_urls(&self) -> HashMap<BuildPlatform, Url> {
        toolchain_supported_platforms()
            .into_iter()
            .filter_map(|platform| {
                let key = toolchain_url_property(platform);
                let raw = self.get(&key)?;
                match Url::parse(raw) {
                    Ok(url) => Some((platform, url)),
                    Err(err) => {
                        tracing::warn!(key = %key, value = raw, error = %err, "ignoring invalid toolchain URL");
                        None
                    }
                }
            })
            .collect()
    }

    /// Rewrites the criteria and URL keys, dropping entries for absent values.
    pub fn update(&mut self, spec: &ToolchainSpec, urls: &HashMap<BuildPlatform, Option<Url>>) {
        match spec.language_version {
            Some(version) => self.set(TOOLCHAIN_VERSION_PROPERTY, version.to_string()),
            None => self.remove(TOOLCHAIN_VERSION_PROPERTY),
        }
        match spec.vendor.known() {
            Some(vendor) => self.set(TOOLCHAIN_VENDOR_PROPERTY, vendor.name()),
            None => self.remove(TOOLCHAIN_VENDOR_PROPERTY),
        }
        match spec.implementation {
            JvmImplementation::VendorSpecific => self.remove(TOOLCHAIN_IMPLEMENTATION_PROPERTY),
            other => self.set(TOOLCHAIN_IMPLEMENTATION_PROPERTY, other.name()),
        }
        for platform in toolchain_supported_platforms() {
            let key = toolchain_url_property(platform);
            match urls.get(&platform).and_then(Option::as_ref) {
                Some(url) => self.set(key, url.as_str()),
                None => self.remove(&key),
            }
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(GENERATED_HEADER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    /// Writes the file, creating its parent directory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, self.render())
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

fn split_key_value(line: &str) -> (String, String) {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                return (
                    line[..idx].trim_end().to_string(),
                    line[idx + 1..].trim_start().to_string(),
                );
            }
            c if c.is_whitespace() => {
                let key = line[..idx].to_string();
                let rest = line[idx..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (key, rest.trim_start().to_string());
            }
            _ => {}
        }
    }
    (line.to_string(), String::new())
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&code);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (idx, ch) in raw.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Architecture, OperatingSystem};
    use crate::vendor::KnownJvmVendor;

    #[test]
    fn url_keys_follow_the_persisted_format() {
        let mac_arm = BuildPlatform::new(Architecture::Aarch64, OperatingSystem::MacOs);
        assert_eq!(toolchain_url_property(mac_arm), "toolchainmacosaarch64Url");
        let bsd = BuildPlatform::new(Architecture::X86_64, OperatingSystem::FreeBsd);
        assert_eq!(toolchain_url_property(bsd), "toolchainfreebsdx86_64Url");
    }

    #[test]
    fn parses_java_properties_syntax() {
        let props = DaemonJvmProperties::parse(
            "#This file is generated by updateDaemonJvm\n\
             ! legacy comment\n\
             toolchainVersion=17\n\
             toolchainVendor : ADOPTIUM\n\
             toolchainlinuxx86_64Url=https\\://example.com/jdk-17.tar.gz\n\
             multi=first\\\n    second\n",
        );
        assert_eq!(props.get(TOOLCHAIN_VERSION_PROPERTY), Some("17"));
        assert_eq!(props.get(TOOLCHAIN_VENDOR_PROPERTY), Some("ADOPTIUM"));
        assert_eq!(
            props.get("toolchainlinuxx86_64Url"),
            Some("https://example.com/jdk-17.tar.gz")
        );
        assert_eq!(props.get("multi"), Some("firstsecond"));
    }

    #[test]
    fn reads_spec_and_platform_urls() {
        let props = DaemonJvmProperties::parse(
            "toolchainVersion=21\n\
             toolchainVendor=AZUL\n\
             toolchainImplementation=vendor_specific\n\
             toolchainlinuxaarch64Url=https\\://example.com/a.tar.gz\n\
             toolchainwindowsx86_64Url=not a url\n",
        );
        let spec = props
            .toolchain_spec(Path::new("gradle-daemon-jvm.properties"))
            .expect("spec");
        assert_eq!(spec.language_version.map(JavaLanguageVersion::as_u32), Some(21));
        assert_eq!(spec.vendor, JvmVendorSpec::Known(KnownJvmVendor::Azul));
        let urls = props.download_urls();
        assert_eq!(urls.len(), 1);
        let linux_arm = BuildPlatform::new(Architecture::Aarch64, OperatingSystem::Linux);
        assert_eq!(urls[&linux_arm].as_str(), "https://example.com/a.tar.gz");
    }

    #[test]
    fn invalid_version_names_the_key() {
        let props = DaemonJvmProperties::parse("toolchainVersion=seventeen\n");
        let err = props
            .toolchain_spec(Path::new("daemon.properties"))
            .expect_err("invalid version");
        assert_eq!(err.key, TOOLCHAIN_VERSION_PROPERTY);
        assert!(err.to_string().contains("seventeen"));
    }

    #[test]
    fn update_rewrites_criteria_and_keeps_unrelated_keys() {
        let mut props = DaemonJvmProperties::parse(
            "custom.key=kept\n\
             toolchainVendor=AZUL\n\
             toolchainmacosaarch64Url=https\\://old.example/jdk.zip\n",
        );
        let spec = ToolchainSpec::new(JavaLanguageVersion::of(17).expect("version"));
        let linux = BuildPlatform::new(Architecture::X86_64, OperatingSystem::Linux);
        let mut urls: HashMap<_, _> = toolchain_supported_platforms()
            .into_iter()
            .map(|platform| (platform, None))
            .collect();
        urls.insert(
            linux,
            Some(Url::parse("https://new.example/jdk-17.tar.gz").expect("url")),
        );
        props.update(&spec, &urls);

        assert_eq!(props.get("custom.key"), Some("kept"));
        assert_eq!(props.get(TOOLCHAIN_VERSION_PROPERTY), Some("17"));
        assert_eq!(props.get(TOOLCHAIN_VENDOR_PROPERTY), None);
        assert_eq!(props.get("toolchainmacosaarch64Url"), None);
        let rendered = props.render();
        assert!(rendered.starts_with(GENERATED_HEADER));
        assert!(rendered.contains("toolchainlinuxx86_64Url=https\\://new.example/jdk-17.tar.gz"));

        let reparsed = DaemonJvmProperties::parse(&rendered);
        assert_eq!(reparsed, props);
    }

    #[test]
    fn load_treats_missing_file_as_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = properties_path(temp.path());
        assert!(DaemonJvmProperties::load(&path).expect("load").is_empty());

        let mut props = DaemonJvmProperties::default();
        props.set(TOOLCHAIN_VERSION_PROPERTY, "11");
        props.write(&path).expect("write");
        let loaded = DaemonJvmProperties::load(&path).expect("reload");
        assert_eq!(loaded.get(TOOLCHAIN_VERSION_PROPERTY), Some("11"));
    }
}
