use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use jdkup_domain::{
    toolchain_supported_platforms, toolchain_url_property, BuildPlatform, DaemonJvmProperties,
    JavaLanguageVersion, JvmImplementation, JvmToolchain, JvmVendorSpec, ToolchainSpec,
};
use serde_json::{json, Value};
use url::Url;

use crate::provision::ToolchainProvisioningService;
use crate::query::ToolchainMatch;
use crate::{CommandContext, ExecutionOutcome};

/// Toolchain criteria given on the command line.
#[derive(Clone, Debug, Default)]
pub struct ToolchainCriteria {
    pub version: Option<u32>,
    pub vendor: Option<String>,
    pub implementation: Option<String>,
}

impl ToolchainCriteria {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.vendor.is_none() && self.implementation.is_none()
    }

    fn to_spec(&self) -> Result<ToolchainSpec, ExecutionOutcome> {
        let Some(version) = self.version else {
            return Err(ExecutionOutcome::user_error(
                "a language version is required",
                json!({
                    "reason": "missing_version",
                    "hint": "pass --version together with --vendor or --implementation",
                }),
            ));
        };
        let version = JavaLanguageVersion::of(version)
            .map_err(|err| invalid_criterion("version", &version.to_string(), &err))?;
        let mut spec = ToolchainSpec::new(version);
        if let Some(vendor) = &self.vendor {
            spec = spec.with_vendor(
                vendor
                    .parse::<JvmVendorSpec>()
                    .map_err(|err| invalid_criterion("vendor", vendor, &err))?,
            );
        }
        if let Some(implementation) = &self.implementation {
            spec = spec.with_implementation(
                implementation
                    .parse::<JvmImplementation>()
                    .map_err(|err| invalid_criterion("implementation", implementation, &err))?,
            );
        }
        Ok(spec)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ToolchainFindRequest {
    pub criteria: ToolchainCriteria,
}

#[derive(Clone, Debug, Default)]
pub struct ToolchainListRequest;

#[derive(Clone, Debug, Default)]
pub struct ToolchainInstallRequest {
    pub criteria: ToolchainCriteria,
}

#[derive(Clone, Debug, Default)]
pub struct ToolchainUpdateRequest {
    pub criteria: ToolchainCriteria,
}

/// Finds the JVM matching the requested criteria, provisioning one when
/// nothing installed matches.
///
/// # Errors
/// Returns an error if the engine cannot be set up.
pub fn toolchain_find(ctx: &CommandContext, request: &ToolchainFindRequest) -> Result<ExecutionOutcome> {
    let spec = match requested_spec(ctx, &request.criteria) {
        Ok(spec) => spec,
        Err(outcome) => return Ok(outcome),
    };
    let services = ctx.services()?;
    if let Some(metadata) = services.metadata_cache().lookup(&spec) {
        tracing::debug!(home = %metadata.java_home.display(), "using cached daemon JVM");
        let found = ToolchainMatch {
            auto_provisioned: metadata.java_home.starts_with(services.cache().root()),
            metadata,
            provisioned_now: false,
        };
        return Ok(found_outcome(&spec, &found, true));
    }
    match services.query().find_matching_toolchain(&spec) {
        Ok(found) => {
            if let Err(err) = services.metadata_cache().record(&found.metadata) {
                tracing::warn!(error = %err, "failed to record daemon JVM metadata");
            }
            Ok(found_outcome(&spec, &found, false))
        }
        Err(err) => Ok(ExecutionOutcome::from_toolchain_error(&err)),
    }
}

/// Lists every detected installation, including the ones that failed to probe.
///
/// # Errors
/// Returns an error if the engine cannot be set up.
pub fn toolchain_list(ctx: &CommandContext, _request: &ToolchainListRequest) -> Result<ExecutionOutcome> {
    let toolchains = ctx.services()?.registry().toolchains();
    let details: Vec<Value> = toolchains.iter().map(toolchain_to_json).collect();
    if toolchains.is_empty() {
        return Ok(ExecutionOutcome::success(
            "no Java installations detected",
            json!({ "toolchains": details }),
        ));
    }
    let lines = toolchains
        .iter()
        .map(|toolchain| match toolchain.valid() {
            Some(metadata) => format!(
                "{}  {}  ({})",
                metadata.display_name(),
                metadata.java_home.display(),
                toolchain.location.source
            ),
            None => format!(
                "invalid  {}  ({}): {}",
                toolchain.location.path.display(),
                toolchain.location.source,
                toolchain.metadata.error_message().unwrap_or_default()
            ),
        })
        .collect::<Vec<_>>()
        .join("\n");
    let valid = toolchains.iter().filter(|t| t.valid().is_some()).count();
    Ok(ExecutionOutcome::success(
        format!("{valid} of {} installations usable:\n{lines}", toolchains.len()),
        json!({ "toolchains": details }),
    ))
}

/// Downloads and installs a toolchain into the JDK cache, skipping discovery.
///
/// # Errors
/// Returns an error if the engine cannot be set up.
pub fn toolchain_install(
    ctx: &CommandContext,
    request: &ToolchainInstallRequest,
) -> Result<ExecutionOutcome> {
    let spec = match requested_spec(ctx, &request.criteria) {
        Ok(spec) => spec,
        Err(outcome) => return Ok(outcome),
    };
    let services = ctx.services()?;
    match services.provisioning().try_install(&spec) {
        Ok(home) => Ok(ExecutionOutcome::success(
            format!("installed {spec} at {}", home.display()),
            json!({
                "spec": spec.to_string(),
                "java_home": home.display().to_string(),
            }),
        )),
        Err(err) => Ok(ExecutionOutcome::from_toolchain_error(&err)),
    }
}

/// Resolves download URLs for every supported platform and rewrites the
/// criteria file with them.
///
/// # Errors
/// Returns an error if the engine cannot be set up or the criteria file
/// cannot be read or written.
pub fn toolchain_update(
    ctx: &CommandContext,
    request: &ToolchainUpdateRequest,
) -> Result<ExecutionOutcome> {
    let spec = match requested_spec(ctx, &request.criteria) {
        Ok(spec) => spec,
        Err(outcome) => return Ok(outcome),
    };
    let services = ctx.services()?;
    let urls = match services.resolver().resolve_download_urls(&spec) {
        Ok(urls) => urls,
        Err(err) => return Ok(ExecutionOutcome::from_toolchain_error(&err)),
    };
    let path = ctx.config().properties_file();
    let mut properties = DaemonJvmProperties::load(path)?;
    properties.update(&spec, &urls);
    properties.write(path)?;

    let resolved = urls.values().filter(|url| url.is_some()).count();
    if resolved == 0 {
        tracing::warn!(%spec, "no repository serves this toolchain on any platform");
    }
    Ok(ExecutionOutcome::success(
        format!(
            "updated {} for {spec} ({resolved} of {} platforms have a download URL)",
            path.display(),
            urls.len()
        ),
        json!({
            "path": path.display().to_string(),
            "spec": spec.to_string(),
            "urls": urls_to_json(&urls),
        }),
    ))
}

/// Criteria from the command line, else from the criteria file.
fn requested_spec(
    ctx: &CommandContext,
    criteria: &ToolchainCriteria,
) -> Result<ToolchainSpec, ExecutionOutcome> {
    if !criteria.is_empty() {
        return criteria.to_spec();
    }
    let path = ctx.config().properties_file();
    let recorded = DaemonJvmProperties::load(path)
        .map_err(|err| {
            ExecutionOutcome::failure(
                format!("{err:#}"),
                json!({ "path": path.display().to_string() }),
            )
        })?
        .toolchain_spec(path)
        .map_err(|err| {
            ExecutionOutcome::user_error(
                err.to_string(),
                json!({
                    "reason": "invalid_criteria",
                    "path": path.display().to_string(),
                    "key": err.key,
                }),
            )
        })?;
    if recorded.is_configured() {
        return Ok(recorded);
    }
    Err(missing_criteria(path))
}

fn missing_criteria(path: &Path) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        "no toolchain criteria given",
        json!({
            "reason": "missing_criteria",
            "path": path.display().to_string(),
            "hint": "pass --version or record criteria with `jdkup update --version <N>`",
        }),
    )
}

fn invalid_criterion(name: &str, value: &str, err: &dyn std::fmt::Display) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("invalid {name} `{value}`: {err}"),
        json!({ "reason": "invalid_criteria", "key": name }),
    )
}

fn found_outcome(spec: &ToolchainSpec, found: &ToolchainMatch, cached: bool) -> ExecutionOutcome {
    let verb = if found.provisioned_now {
        "provisioned"
    } else {
        "found"
    };
    ExecutionOutcome::success(
        format!(
            "{verb} {} at {}",
            found.metadata.display_name(),
            found.metadata.java_home.display()
        ),
        json!({
            "spec": spec.to_string(),
            "java_home": found.metadata.java_home.display().to_string(),
            "toolchain": found,
            "cached": cached,
        }),
    )
}

fn toolchain_to_json(toolchain: &JvmToolchain) -> Value {
    let mut value = json!({
        "path": toolchain.location.path.display().to_string(),
        "source": toolchain.location.source,
        "auto_provisioned": toolchain.location.auto_provisioned,
        "valid": toolchain.valid().is_some(),
    });
    match toolchain.valid() {
        Some(metadata) => value["metadata"] = json!(metadata),
        None => value["error"] = json!(toolchain.metadata.error_message()),
    }
    value
}

fn urls_to_json(urls: &HashMap<BuildPlatform, Option<Url>>) -> Value {
    let entries = toolchain_supported_platforms()
        .into_iter()
        .map(|platform| {
            let url = urls.get(&platform).and_then(Option::as_ref).map(Url::as_str);
            (toolchain_url_property(platform), json!(url))
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvSnapshot, GlobalOptions};
    use crate::test_support::write_fake_jdk;
    use crate::CommandStatus;
    use std::fs;
    use tempfile::tempdir;

    fn config(root: &Path, extra: &[(&str, &str)]) -> Config {
        let home = root.join("state");
        let properties = root.join("gradle-daemon-jvm.properties");
        let mut vars = vec![
            ("JDKUP_HOME", home.to_str().expect("utf-8")),
            ("JDKUP_PROPERTIES", properties.to_str().expect("utf-8")),
            ("JDKUP_AUTO_DETECT", "false"),
        ];
        vars.extend_from_slice(extra);
        Config::from_snapshot(&EnvSnapshot::testing(&vars), root).expect("config")
    }

    #[test]
    fn criteria_require_a_version() {
        let criteria = ToolchainCriteria {
            vendor: Some("azul".to_string()),
            ..ToolchainCriteria::default()
        };
        let outcome = criteria.to_spec().expect_err("missing version");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "missing_version");

        let bad_vendor = ToolchainCriteria {
            version: Some(17),
            vendor: Some("nobody".to_string()),
            implementation: None,
        };
        let outcome = bad_vendor.to_spec().expect_err("unknown vendor");
        assert!(outcome.message.contains("invalid vendor `nobody`"));

        let full = ToolchainCriteria {
            version: Some(21),
            vendor: Some("ADOPTIUM".to_string()),
            implementation: Some("vendor-specific".to_string()),
        };
        assert_eq!(
            full.to_spec().expect("spec").to_string(),
            "{languageVersion=21, vendor=Eclipse Temurin, implementation=vendor-specific}"
        );
    }

    #[test]
    fn criteria_fall_back_to_the_properties_file() {
        let temp = tempdir().expect("tempdir");
        let config = config(temp.path(), &[]);
        let global = GlobalOptions::default();
        let ctx = CommandContext::with_config(&global, config);

        let outcome =
            requested_spec(&ctx, &ToolchainCriteria::default()).expect_err("no criteria");
        assert_eq!(outcome.details["reason"], "missing_criteria");

        fs::write(ctx.config().properties_file(), "toolchainVersion=17\n").expect("write");
        let spec = requested_spec(&ctx, &ToolchainCriteria::default()).expect("spec");
        assert_eq!(spec.language_version.map(JavaLanguageVersion::as_u32), Some(17));

        fs::write(ctx.config().properties_file(), "toolchainVersion=latest\n").expect("write");
        let outcome = requested_spec(&ctx, &ToolchainCriteria::default()).expect_err("invalid");
        assert_eq!(outcome.details["key"], "toolchainVersion");
    }

    #[test]
    fn update_records_urls_for_every_platform() {
        let temp = tempdir().expect("tempdir");
        let config = config(
            temp.path(),
            &[(
                "JDKUP_REPOSITORIES",
                "https://mirror.example/jdk-{version}-{os}-{arch}.{ext}",
            )],
        );
        let global = GlobalOptions::default();
        let ctx = CommandContext::with_config(&global, config);
        fs::write(ctx.config().properties_file(), "# keep\ncustom=value\n").expect("seed");

        let request = ToolchainUpdateRequest {
            criteria: ToolchainCriteria {
                version: Some(21),
                ..ToolchainCriteria::default()
            },
        };
        let outcome = toolchain_update(&ctx, &request).expect("update");
        assert_eq!(outcome.status, CommandStatus::Ok, "{}", outcome.message);
        assert_eq!(
            outcome.details["urls"]["toolchainwindowsaarch64Url"],
            "https://mirror.example/jdk-21-windows-aarch64.zip"
        );

        let written = fs::read_to_string(ctx.config().properties_file()).expect("read");
        assert!(written.contains("custom=value"));
        assert!(written.contains("toolchainVersion=21"));
        assert!(written.contains(
            "toolchainlinuxx86_64Url=https\\://mirror.example/jdk-21-linux-x86_64.tar.gz"
        ));
    }

    #[test]
    fn update_without_repositories_is_a_user_error() {
        let temp = tempdir().expect("tempdir");
        let global = GlobalOptions::default();
        let ctx = CommandContext::with_config(&global, config(temp.path(), &[]));
        let request = ToolchainUpdateRequest {
            criteria: ToolchainCriteria {
                version: Some(17),
                ..ToolchainCriteria::default()
            },
        };
        let outcome = toolchain_update(&ctx, &request).expect("update");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "repositories_not_configured");
        assert!(!ctx.config().properties_file().exists());
    }

    #[cfg(unix)]
    #[test]
    fn find_records_and_reuses_the_selected_jvm() {
        let temp = tempdir().expect("tempdir");
        let jdk = temp.path().join("jdk-17");
        write_fake_jdk(&jdk, "17.0.9", "Eclipse Adoptium").expect("fake jdk");
        let config = config(
            temp.path(),
            &[("JDKUP_INSTALLATION_PATHS", jdk.to_str().expect("utf-8"))],
        );
        let global = GlobalOptions::default();
        let ctx = CommandContext::with_config(&global, config);
        let request = ToolchainFindRequest {
            criteria: ToolchainCriteria {
                version: Some(17),
                ..ToolchainCriteria::default()
            },
        };

        let first = toolchain_find(&ctx, &request).expect("find");
        assert_eq!(first.status, CommandStatus::Ok, "{}", first.message);
        assert_eq!(first.details["cached"], false);
        assert_eq!(first.details["java_home"], jdk.display().to_string());

        let second = toolchain_find(&ctx, &request).expect("find");
        assert_eq!(second.details["cached"], true);
        assert_eq!(second.details["java_home"], jdk.display().to_string());
    }

    #[test]
    fn offline_install_reports_disabled_provisioning() {
        let temp = tempdir().expect("tempdir");
        let global = GlobalOptions::default();
        let ctx = CommandContext::with_config(
            &global,
            config(temp.path(), &[("JDKUP_ONLINE", "0"), ("JDKUP_REPOSITORIES", "foojay")]),
        );
        let request = ToolchainInstallRequest {
            criteria: ToolchainCriteria {
                version: Some(17),
                ..ToolchainCriteria::default()
            },
        };
        let outcome = toolchain_install(&ctx, &request).expect("install");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "provisioning_disabled");
    }
}
