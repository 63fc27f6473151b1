use anyhow::{anyhow, Result};
use jdkup_domain::{Architecture, JvmImplementation, KnownJvmVendor, OperatingSystem};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::{ToolchainRepository, ToolchainRequest};

const PACKAGES_PATH: &str = "disco/v3.0/packages";

/// The foojay discovery API.
pub struct FoojayRepository {
    client: Client,
    base: Url,
}

impl FoojayRepository {
    /// # Errors
    /// Returns an error if `base` is not a valid URL.
    pub fn new(client: Client, base: &str) -> Result<Self> {
        let mut base = Url::parse(base).map_err(|err| anyhow!("invalid foojay URL `{base}`: {err}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    fn query_url(&self, request: &ToolchainRequest) -> Result<Option<Url>> {
        let Some(version) = request.spec.language_version else {
            return Ok(None);
        };
        let (Some(os), Some(arch)) = (
            os_name(request.platform.operating_system),
            arch_name(request.platform.architecture),
        ) else {
            return Ok(None);
        };
        let distribution = match (request.spec.vendor.known(), request.spec.implementation) {
            (None | Some(KnownJvmVendor::Ibm), JvmImplementation::J9) => Some("semeru"),
            (Some(_), JvmImplementation::J9) => return Ok(None),
            (None, JvmImplementation::VendorSpecific) => None,
            (Some(vendor), JvmImplementation::VendorSpecific) => match distribution_of(vendor) {
                Some(name) => Some(name),
                None => return Ok(None),
            },
        };

        let mut url = self.base.join(PACKAGES_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("version", &version.to_string())
                .append_pair("operating_system", os)
                .append_pair("architecture", arch)
                .append_pair("archive_type", "tar.gz")
                .append_pair("archive_type", "zip")
                .append_pair("package_type", "jdk")
                .append_pair("release_status", "ga")
                .append_pair("latest", "available")
                .append_pair("directly_downloadable", "true");
            if let Some(distribution) = distribution {
                query.append_pair("distribution", distribution);
            }
            if os == "linux" {
                query.append_pair("lib_c_type", "glibc");
            }
        }
        Ok(Some(url))
    }
}

impl ToolchainRepository for FoojayRepository {
    fn name(&self) -> &str {
        "foojay"
    }

    fn resolve(&self, request: &ToolchainRequest) -> Result<Option<Url>> {
        let Some(url) = self.query_url(request)? else {
            return Ok(None);
        };
        let packages = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| anyhow!("failed to query foojay at {url}: {err}"))?
            .error_for_status()
            .map_err(|err| anyhow!("foojay error for {url}: {err}"))?
            .json::<PackagesResponse>()
            .map_err(|err| anyhow!("invalid JSON from foojay for {url}: {err}"))?;
        let Some(package) = packages.result.into_iter().next() else {
            return Ok(None);
        };
        let link = package.links.pkg_download_redirect;
        Url::parse(&link)
            .map(Some)
            .map_err(|err| anyhow!("foojay returned an invalid download link `{link}`: {err}"))
    }
}

#[derive(Debug, Deserialize)]
struct PackagesResponse {
    #[serde(default)]
    result: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    links: PackageLinks,
}

#[derive(Debug, Deserialize)]
struct PackageLinks {
    pkg_download_redirect: String,
}

fn distribution_of(vendor: KnownJvmVendor) -> Option<&'static str> {
    match vendor {
        KnownJvmVendor::Adoptium => Some("temurin"),
        KnownJvmVendor::AdoptOpenJdk => Some("aoj"),
        KnownJvmVendor::Amazon => Some("corretto"),
        KnownJvmVendor::Azul => Some("zulu"),
        KnownJvmVendor::BellSoft => Some("liberica"),
        KnownJvmVendor::GraalVm => Some("graalvm_community"),
        KnownJvmVendor::Ibm => Some("semeru"),
        KnownJvmVendor::JetBrains => Some("jetbrains"),
        KnownJvmVendor::Microsoft => Some("microsoft"),
        KnownJvmVendor::Oracle => Some("oracle_open_jdk"),
        KnownJvmVendor::Sap => Some("sap_machine"),
        KnownJvmVendor::Tencent => Some("kona"),
        KnownJvmVendor::Apple | KnownJvmVendor::HewlettPackard | KnownJvmVendor::Unknown => None,
    }
}

fn os_name(os: OperatingSystem) -> Option<&'static str> {
    match os {
        OperatingSystem::Linux => Some("linux"),
        OperatingSystem::Windows => Some("windows"),
        OperatingSystem::MacOs => Some("macos"),
        OperatingSystem::Solaris => Some("solaris"),
        OperatingSystem::Unix | OperatingSystem::FreeBsd => None,
    }
}

fn arch_name(arch: Architecture) -> Option<&'static str> {
    match arch {
        Architecture::X86 => Some("x86"),
        Architecture::X86_64 => Some("x64"),
        Architecture::Aarch64 => Some("aarch64"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use jdkup_domain::{BuildPlatform, JavaLanguageVersion, JvmVendorSpec, ToolchainSpec};
    use serde_json::json;

    fn request(vendor: JvmVendorSpec, os: OperatingSystem) -> ToolchainRequest {
        ToolchainRequest {
            spec: ToolchainSpec::new(JavaLanguageVersion::of(17).expect("version"))
                .with_vendor(vendor),
            platform: BuildPlatform::new(Architecture::X86_64, os),
        }
    }

    fn repository(server: &Server) -> FoojayRepository {
        let client = Client::builder().no_proxy().build().expect("client");
        FoojayRepository::new(client, &server.url_str("")).expect("repository")
    }

    #[test]
    fn returns_first_package_redirect() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/disco/v3.0/packages"),
                request::query(url_decoded(contains(("distribution", "temurin")))),
                request::query(url_decoded(contains(("operating_system", "linux")))),
                request::query(url_decoded(contains(("architecture", "x64")))),
                request::query(url_decoded(contains(("version", "17")))),
            ])
            .respond_with(json_encoded(json!({
                "result": [
                    {"links": {"pkg_download_redirect": "https://api.foojay.io/disco/v3.0/ids/first/redirect"}},
                    {"links": {"pkg_download_redirect": "https://api.foojay.io/disco/v3.0/ids/second/redirect"}}
                ]
            }))),
        );
        let resolved = repository(&server)
            .resolve(&request(
                JvmVendorSpec::Known(KnownJvmVendor::Adoptium),
                OperatingSystem::Linux,
            ))
            .expect("resolve");
        assert_eq!(
            resolved.map(String::from),
            Some("https://api.foojay.io/disco/v3.0/ids/first/redirect".to_string())
        );
    }

    #[test]
    fn empty_result_is_no_match() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/disco/v3.0/packages"))
                .respond_with(json_encoded(json!({"result": []}))),
        );
        let resolved = repository(&server)
            .resolve(&request(JvmVendorSpec::Any, OperatingSystem::MacOs))
            .expect("resolve");
        assert_eq!(resolved, None);
    }

    #[test]
    fn unknown_platforms_and_vendors_skip_the_network() {
        let server = Server::run();
        let repo = repository(&server);
        assert_eq!(
            repo.resolve(&request(JvmVendorSpec::Any, OperatingSystem::FreeBsd))
                .expect("resolve"),
            None
        );
        assert_eq!(
            repo.resolve(&request(
                JvmVendorSpec::Known(KnownJvmVendor::Apple),
                OperatingSystem::Linux
            ))
            .expect("resolve"),
            None
        );
    }

    #[test]
    fn server_errors_surface() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/disco/v3.0/packages"))
                .respond_with(status_code(503)),
        );
        let err = repository(&server)
            .resolve(&request(JvmVendorSpec::Any, OperatingSystem::Windows))
            .expect_err("server error");
        assert!(err.to_string().contains("foojay error"));
    }
}
