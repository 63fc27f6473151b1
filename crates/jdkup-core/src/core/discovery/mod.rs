//! Discovering JVM installations on the host.

mod suppliers;

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use jdkup_domain::{InstallationLocation, JvmToolchain};
use rayon::prelude::*;

use crate::probe::JvmMetadataDetector;

pub use suppliers::{
    AutoProvisionedSupplier, ChildDirectorySupplier, CurrentInstallationSupplier,
    EnvironmentVariableListSupplier, InstallationSupplier, LocationListSupplier,
};

/// Aggregates every supplier into one de-duplicated view of the host.
pub struct JavaInstallationRegistry {
    suppliers: Vec<Box<dyn InstallationSupplier>>,
    detector: Arc<dyn JvmMetadataDetector>,
}

impl JavaInstallationRegistry {
    #[must_use]
    pub fn new(
        suppliers: Vec<Box<dyn InstallationSupplier>>,
        detector: Arc<dyn JvmMetadataDetector>,
    ) -> Self {
        Self {
            suppliers,
            detector,
        }
    }

    /// Existing directories from all suppliers, first occurrence of each
    /// canonical path wins.
    #[must_use]
    pub fn list_installations(&self) -> Vec<InstallationLocation> {
        let mut seen = HashSet::new();
        let mut locations = Vec::new();
        for supplier in &self.suppliers {
            let found = supplier.get();
            tracing::debug!(
                supplier = supplier.source_name(),
                count = found.len(),
                "collected installation candidates"
            );
            for location in found {
                if !location.path.is_dir() {
                    tracing::debug!(
                        path = %location.path.display(),
                        source = %location.source,
                        "skipping missing installation directory"
                    );
                    continue;
                }
                let canonical =
                    fs::canonicalize(&location.path).unwrap_or_else(|_| location.path.clone());
                if seen.insert(canonical) {
                    locations.push(location);
                }
            }
        }
        locations
    }

    /// Probes every known location, valid or not.
    #[must_use]
    pub fn toolchains(&self) -> Vec<JvmToolchain> {
        let toolchains: Vec<JvmToolchain> = self
            .list_installations()
            .into_par_iter()
            .map(|location| {
                let metadata = self.detector.metadata(&location);
                JvmToolchain { location, metadata }
            })
            .collect();
        for toolchain in &toolchains {
            if let Some(message) = toolchain.metadata.error_message() {
                tracing::warn!(
                    location = %toolchain.location.display_name(),
                    "invalid Java installation: {message}"
                );
            }
        }
        toolchains
    }
}
