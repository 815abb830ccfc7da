/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load Distro-Check configuration from TOML, supplying
    defaults for every source endpoint, concurrency limit and
    output location.

  Security / Safety Notes:
    Reads operator-owned files only; no secrets are expected
    in configuration.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations.

  Operational Scope:
    Loaded once at startup; CLI flags override selected keys.

  Revision History:
    2026-10-19 COD  Authored configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults for every key
    - Missing explicit config is an error, missing default is not
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DistroCheckError, Result};

const APP_DIR: &str = "distro-check";

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DistroCheckConfig {
    /// Distribution whose release manifest defines the package population.
    pub distro: String,
    /// Maximum packages reconciled concurrently.
    pub jobs: usize,
    pub upstream: UpstreamConfig,
    pub aur: AurConfig,
    pub mirror: MirrorConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub index_url: String,
    /// Skip the index and read this distribution file directly.
    pub distribution_url: Option<String>,
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AurConfig {
    pub base_url: String,
    pub timeout: u64,
    pub max_args: usize,
    pub max_retries: usize,
    pub max_parallel_requests: usize,
    /// Prefix placed before `{distro}-` when deriving AUR package names.
    pub package_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Organization path segment; `{distro}` is substituted.
    pub organization: String,
    pub branch: String,
    pub recipe: String,
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

impl Default for DistroCheckConfig {
    fn default() -> Self {
        Self {
            distro: "melodic".into(),
            jobs: 16,
            upstream: UpstreamConfig::default(),
            aur: AurConfig::default(),
            mirror: MirrorConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            index_url: "https://raw.githubusercontent.com/ros/rosdistro/master/index-v4.yaml"
                .into(),
            distribution_url: None,
            timeout: 30,
        }
    }
}

impl Default for AurConfig {
    fn default() -> Self {
        Self {
            base_url: "https://aur.archlinux.org/rpc".into(),
            timeout: 15,
            max_args: 150,
            max_retries: 3,
            max_parallel_requests: 4,
            package_prefix: "ros-".into(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://raw.githubusercontent.com".into(),
            organization: "ros-{distro}-arch".into(),
            branch: "master".into(),
            recipe: "PKGBUILD".into(),
            timeout: 15,
        }
    }
}

impl DistroCheckConfig {
    /// Load from an explicit path, or from the default location if present.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load(explicit),
            None => match default_config_path() {
                Some(candidate) if candidate.is_file() => Self::load(&candidate),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            DistroCheckError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|err| {
            DistroCheckError::Config(format!("Failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.distro.trim().is_empty() {
            return Err(DistroCheckError::Config("`distro` must not be empty".into()));
        }
        if self.jobs == 0 {
            return Err(DistroCheckError::Config("`jobs` must be at least 1".into()));
        }
        Ok(())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("logs")
        })
    }

    /// Mirror organization segment with the distribution substituted.
    pub fn mirror_organization(&self) -> String {
        self.mirror.organization.replace("{distro}", &self.distro)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
distro = "noetic"
jobs = 4

[aur]
max_args = 50

[mirror]
enabled = false
"#
        )
        .unwrap();

        let config = DistroCheckConfig::load_from_optional_path(Some(file.path())).unwrap();
        assert_eq!(config.distro, "noetic");
        assert_eq!(config.jobs, 4);
        assert_eq!(config.aur.max_args, 50);
        assert_eq!(config.aur.base_url, "https://aur.archlinux.org/rpc");
        assert!(!config.mirror.enabled);
        assert_eq!(config.mirror_organization(), "ros-noetic-arch");
        assert!(config.upstream.distribution_url.is_none());
    }

    #[test]
    fn explicit_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = DistroCheckConfig::load_from_optional_path(Some(missing.as_path()));
        assert!(matches!(result, Err(DistroCheckError::Config(_))));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "jobs = 0").unwrap();
        let result = DistroCheckConfig::load(file.path());
        assert!(matches!(result, Err(DistroCheckError::Config(_))));
    }

    #[test]
    fn explicit_log_dir_wins() {
        let mut config = DistroCheckConfig::default();
        config.paths.log_dir = Some(PathBuf::from("/var/log/distro-check"));
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/distro-check"));
    }
}
