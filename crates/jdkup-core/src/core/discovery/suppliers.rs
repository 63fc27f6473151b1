use std::fs;
use std::path::{Path, PathBuf};

use jdkup_domain::{InstallationLocation, OperatingSystem};

use crate::jdks::{resolve_effective_home, JdkCacheDirectory};

/// A source of candidate JVM homes.
pub trait InstallationSupplier: Send + Sync {
    fn source_name(&self) -> &str;

    fn get(&self) -> Vec<InstallationLocation>;
}

/// The JVM the caller is running with: `JAVA_HOME`, else the `java` on `PATH`.
#[derive(Debug, Clone)]
pub struct CurrentInstallationSupplier {
    java_home: Option<PathBuf>,
    path_java: Option<PathBuf>,
}

impl CurrentInstallationSupplier {
    #[must_use]
    pub fn new(java_home: Option<PathBuf>, path_java: Option<PathBuf>) -> Self {
        Self {
            java_home,
            path_java,
        }
    }

    /// Home of the current JVM, used to rank it ahead of other matches.
    #[must_use]
    pub fn current_home(&self) -> Option<PathBuf> {
        self.java_home
            .clone()
            .or_else(|| self.path_java.as_deref().and_then(home_of_launcher))
    }
}

impl InstallationSupplier for CurrentInstallationSupplier {
    fn source_name(&self) -> &str {
        "current"
    }

    fn get(&self) -> Vec<InstallationLocation> {
        if let Some(home) = &self.java_home {
            return vec![InstallationLocation::user_defined(
                home,
                "env var 'JAVA_HOME'",
            )];
        }
        self.path_java
            .as_deref()
            .and_then(home_of_launcher)
            .map(|home| InstallationLocation::user_defined(home, "java on PATH"))
            .into_iter()
            .collect()
    }
}

/// `<home>/bin/java` -> `<home>`, following symlinks such as `/usr/bin/java`.
fn home_of_launcher(launcher: &Path) -> Option<PathBuf> {
    let resolved = fs::canonicalize(launcher).unwrap_or_else(|_| launcher.to_path_buf());
    let bin = resolved.parent()?;
    if bin.file_name()? != "bin" {
        return None;
    }
    bin.parent().map(Path::to_path_buf)
}

/// Homes named by the environment variables listed in `JDKUP_INSTALLATIONS_FROM_ENV`.
#[derive(Debug, Clone)]
pub struct EnvironmentVariableListSupplier {
    variables: Vec<(String, Option<String>)>,
}

impl EnvironmentVariableListSupplier {
    #[must_use]
    pub fn new(variables: Vec<(String, Option<String>)>) -> Self {
        Self { variables }
    }
}

impl InstallationSupplier for EnvironmentVariableListSupplier {
    fn source_name(&self) -> &str {
        "environment variables"
    }

    fn get(&self) -> Vec<InstallationLocation> {
        self.variables
            .iter()
            .filter_map(|(name, value)| {
                let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
                if value.is_none() {
                    tracing::debug!(variable = %name, "toolchain environment variable is not set");
                }
                value.map(|path| {
                    InstallationLocation::user_defined(path, format!("env var '{name}'"))
                })
            })
            .collect()
    }
}

/// Homes listed in `JDKUP_INSTALLATION_PATHS`.
#[derive(Debug, Clone)]
pub struct LocationListSupplier {
    paths: Vec<PathBuf>,
}

impl LocationListSupplier {
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl InstallationSupplier for LocationListSupplier {
    fn source_name(&self) -> &str {
        "installation paths"
    }

    fn get(&self) -> Vec<InstallationLocation> {
        self.paths
            .iter()
            .map(|path| InstallationLocation::user_defined(path, "JDKUP_INSTALLATION_PATHS"))
            .collect()
    }
}

/// Every child directory of a set of roots, e.g. SDKMAN's candidates directory.
#[derive(Debug, Clone)]
pub struct ChildDirectorySupplier {
    name: &'static str,
    roots: Vec<PathBuf>,
    skip: &'static [&'static str],
    os: OperatingSystem,
}

impl ChildDirectorySupplier {
    #[must_use]
    pub fn new(name: &'static str, roots: Vec<PathBuf>, os: OperatingSystem) -> Self {
        Self {
            name,
            roots,
            skip: &[],
            os,
        }
    }

    #[must_use]
    pub fn skipping(mut self, names: &'static [&'static str]) -> Self {
        self.skip = names;
        self
    }

    #[must_use]
    pub fn asdf(data_dir: PathBuf, os: OperatingSystem) -> Self {
        Self::new("asdf-vm", vec![data_dir.join("installs").join("java")], os)
    }

    #[must_use]
    pub fn sdkman(candidates_dir: PathBuf, os: OperatingSystem) -> Self {
        Self::new("SDKMAN!", vec![candidates_dir.join("java")], os).skipping(&["current"])
    }

    #[must_use]
    pub fn jabba(jabba_home: PathBuf, os: OperatingSystem) -> Self {
        Self::new("Jabba", vec![jabba_home.join("jdk")], os)
    }

    #[must_use]
    pub fn intellij(user_home: &Path, os: OperatingSystem) -> Self {
        Self::new("IntelliJ IDEA", vec![user_home.join(".jdks")], os)
    }

    #[must_use]
    pub fn linux(os: OperatingSystem) -> Self {
        let roots = if matches!(os, OperatingSystem::Linux) {
            ["/usr/lib/jvm", "/usr/lib64/jvm", "/usr/java", "/opt/java"]
                .into_iter()
                .map(PathBuf::from)
                .collect()
        } else {
            Vec::new()
        };
        Self::new("Common Linux Locations", roots, os)
    }

    #[must_use]
    pub fn macos(user_home: &Path, os: OperatingSystem) -> Self {
        let roots = if os.is_macos() {
            vec![
                PathBuf::from("/Library/Java/JavaVirtualMachines"),
                user_home.join("Library/Java/JavaVirtualMachines"),
            ]
        } else {
            Vec::new()
        };
        Self::new("MacOS java_home", roots, os)
    }

    #[must_use]
    pub fn windows(program_files: Vec<PathBuf>, os: OperatingSystem) -> Self {
        let roots = if os.is_windows() {
            program_files
                .iter()
                .flat_map(|base| {
                    ["Java", "Eclipse Adoptium", "Zulu", "Amazon Corretto", "Microsoft"]
                        .into_iter()
                        .map(move |vendor| base.join(vendor))
                })
                .collect()
        } else {
            Vec::new()
        };
        Self::new("Windows well-known locations", roots, os)
    }
}

impl InstallationSupplier for ChildDirectorySupplier {
    fn source_name(&self) -> &str {
        self.name
    }

    fn get(&self) -> Vec<InstallationLocation> {
        let mut locations = Vec::new();
        for root in &self.roots {
            let Ok(entries) = fs::read_dir(root) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .flatten()
                .filter(|entry| {
                    let name = entry.file_name();
                    !self.skip.iter().any(|skip| name == *skip)
                })
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            children.sort();
            locations.extend(children.into_iter().map(|child| {
                InstallationLocation::user_defined(resolve_effective_home(&child, self.os), self.name)
            }));
        }
        locations
    }
}

/// Installations previously provisioned into the JDK cache.
pub struct AutoProvisionedSupplier {
    cache: JdkCacheDirectory,
}

impl AutoProvisionedSupplier {
    #[must_use]
    pub fn new(cache: JdkCacheDirectory) -> Self {
        Self { cache }
    }
}

impl InstallationSupplier for AutoProvisionedSupplier {
    fn source_name(&self) -> &str {
        "auto-provisioned"
    }

    fn get(&self) -> Vec<InstallationLocation> {
        self.cache
            .list_java_homes()
            .into_iter()
            .map(|home| InstallationLocation::auto_provisioned(home, "auto-provisioned"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn java_home_wins_over_path_launcher() {
        let supplier = CurrentInstallationSupplier::new(
            Some(PathBuf::from("/opt/jdk-17")),
            Some(PathBuf::from("/usr/lib/jvm/jdk-11/bin/java")),
        );
        let locations = supplier.get();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].path, PathBuf::from("/opt/jdk-17"));
        assert_eq!(locations[0].source, "env var 'JAVA_HOME'");
        assert_eq!(supplier.current_home(), Some(PathBuf::from("/opt/jdk-17")));
    }

    #[test]
    fn launcher_on_path_maps_to_its_home() {
        let supplier = CurrentInstallationSupplier::new(
            None,
            Some(PathBuf::from("/nonexistent/jdk-11/bin/java")),
        );
        assert_eq!(
            supplier.current_home(),
            Some(PathBuf::from("/nonexistent/jdk-11"))
        );
        let odd = CurrentInstallationSupplier::new(None, Some(PathBuf::from("/usr/local/java")));
        assert!(odd.get().is_empty());
    }

    #[test]
    fn environment_list_skips_unset_variables() {
        let supplier = EnvironmentVariableListSupplier::new(vec![
            ("JDK8".to_string(), Some("/opt/jdk8".to_string())),
            ("JDK11".to_string(), None),
            ("JDK17".to_string(), Some("  ".to_string())),
        ]);
        let locations = supplier.get();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].source, "env var 'JDK8'");
    }

    #[test]
    fn child_directories_are_listed_sorted_and_filtered() {
        let temp = tempdir().expect("tempdir");
        let java = temp.path().join("java");
        for name in ["21.0.1-tem", "17.0.9-zulu", "current"] {
            fs::create_dir_all(java.join(name)).expect("candidate dir");
        }
        fs::write(java.join("notes.txt"), b"not a jdk").expect("file");

        let supplier = ChildDirectorySupplier::sdkman(temp.path().to_path_buf(), OperatingSystem::Linux);
        let names: Vec<_> = supplier
            .get()
            .into_iter()
            .map(|location| location.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["17.0.9-zulu", "21.0.1-tem"]);
    }

    #[test]
    fn macos_bundles_resolve_to_contents_home() {
        let temp = tempdir().expect("tempdir");
        let bundle = temp.path().join("Library/Java/JavaVirtualMachines/temurin-17.jdk");
        fs::create_dir_all(bundle.join("Contents/Home/bin")).expect("bundle");
        let supplier = ChildDirectorySupplier::macos(temp.path(), OperatingSystem::MacOs);
        let expected = bundle.join("Contents/Home");
        assert!(supplier
            .get()
            .iter()
            .any(|location| location.path == expected));

        let elsewhere = ChildDirectorySupplier::macos(temp.path(), OperatingSystem::Linux);
        assert!(elsewhere.get().is_empty());
    }
}
