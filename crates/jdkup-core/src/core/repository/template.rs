use std::collections::HashMap;

use anyhow::{Context, Result};
use jdkup_domain::{BuildPlatform, JvmImplementation, ToolchainSpec};
use url::Url;

use super::{ToolchainRepository, ToolchainRequest};

/// Per-platform URLs recorded alongside a specification, e.g. in the criteria file.
#[derive(Debug, Clone)]
pub struct PlatformUrlRepository {
    spec: ToolchainSpec,
    urls: HashMap<BuildPlatform, Url>,
}

impl PlatformUrlRepository {
    #[must_use]
    pub fn new(spec: ToolchainSpec, urls: HashMap<BuildPlatform, Url>) -> Self {
        Self { spec, urls }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl ToolchainRepository for PlatformUrlRepository {
    fn name(&self) -> &str {
        "daemon JVM criteria"
    }

    fn resolve(&self, request: &ToolchainRequest) -> Result<Option<Url>> {
        if request.spec != self.spec {
            return Ok(None);
        }
        Ok(self.urls.get(&request.platform).cloned())
    }
}

/// A URL with `{version}`, `{vendor}`, `{implementation}`, `{os}`, `{arch}`
/// and `{ext}` placeholders.
#[derive(Debug, Clone)]
pub struct UrlTemplateRepository {
    template: String,
}

impl UrlTemplateRepository {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn expand(&self, request: &ToolchainRequest) -> Option<String> {
        let version = request.spec.language_version?;
        let vendor = request
            .spec
            .vendor
            .known()
            .map_or("any", |known| known.name())
            .to_ascii_lowercase();
        let implementation = match request.spec.implementation {
            JvmImplementation::VendorSpecific => "vendor_specific",
            JvmImplementation::J9 => "j9",
        };
        let os = request.platform.operating_system;
        let ext = if os.is_windows() { "zip" } else { "tar.gz" };
        Some(
            self.template
                .replace("{version}", &version.to_string())
                .replace("{vendor}", &vendor)
                .replace("{implementation}", implementation)
                .replace("{os}", &os.property_name())
                .replace("{arch}", request.platform.architecture.as_str())
                .replace("{ext}", ext),
        )
    }
}

impl ToolchainRepository for UrlTemplateRepository {
    fn name(&self) -> &str {
        &self.template
    }

    fn resolve(&self, request: &ToolchainRequest) -> Result<Option<Url>> {
        let Some(expanded) = self.expand(request) else {
            return Ok(None);
        };
        Url::parse(&expanded)
            .map(Some)
            .with_context(|| format!("template expanded to an invalid URL `{expanded}`"))
    }
}
