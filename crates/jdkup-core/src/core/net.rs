use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::NetworkConfig;

pub(crate) const JDKUP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Blocking client shared by repositories and downloads.
pub(crate) fn build_http_client(network: &NetworkConfig) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(format!("jdkup/{JDKUP_VERSION}"))
        .connect_timeout(network.connect_timeout)
        .timeout(network.read_timeout);
    let builder = if network.use_proxies {
        builder
    } else {
        builder.no_proxy()
    };
    builder.build().context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_builds_with_and_without_proxies() {
        for use_proxies in [false, true] {
            let network = NetworkConfig {
                online: true,
                connect_timeout: Duration::from_secs(5),
                read_timeout: Duration::from_secs(30),
                use_proxies,
            };
            assert!(build_http_client(&network).is_ok());
        }
    }
}
