/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::rosdistro
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Read the upstream distribution index and release manifest
    to enumerate every released package with its version.

  Security / Safety Notes:
    Performs read-only HTTPS requests against the configured
    index host. No credentials are transmitted.

  Dependencies:
    reqwest for HTTP, serde_yaml for manifest parsing.

  Operational Scope:
    Runs once per invocation before reconciliation; defines
    the package population.

  Revision History:
    2026-10-19 COD  Implemented upstream manifest client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured response parsing with explicit error paths
    - Duplicate package declarations surfaced, never resolved
============================================================*/

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::error::{DistroCheckError, Result};
use crate::logger::Logger;

/// Released packages of one distribution, keyed by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamManifest {
    /// `None` when the release declares no version or the package is declared twice.
    pub packages: BTreeMap<String, Option<String>>,
}

impl UpstreamManifest {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Narrow the manifest to `requested` names; an empty request keeps everything.
    /// Names the distribution does not release are reported under `PKG404`.
    pub fn retain_requested(&mut self, requested: &[String], logger: &Logger) {
        if requested.is_empty() {
            return;
        }

        let missing: Vec<&str> = requested
            .iter()
            .filter(|name| !self.packages.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            logger.warn(
                "PKG404",
                format!("Requested packages not in distribution: {}", missing.join(", ")),
            );
        }

        self.packages
            .retain(|name, _| requested.iter().any(|wanted| wanted == name));
    }
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    distributions: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(default)]
    distribution: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DistributionFile {
    #[serde(default)]
    repositories: BTreeMap<String, RepositoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    release: Option<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    #[serde(default)]
    packages: Vec<String>,
    version: Option<String>,
}

/// Client for the upstream distribution index.
pub struct RosdistroClient {
    client: reqwest::Client,
    index_url: String,
    distribution_url: Option<String>,
}

impl RosdistroClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("Distro-Check/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                DistroCheckError::Network(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            index_url: config.index_url.clone(),
            distribution_url: config.distribution_url.clone(),
        })
    }

    /// Enumerate released packages of `distro`.
    pub async fn fetch_manifest(&self, distro: &str, logger: &Logger) -> Result<UpstreamManifest> {
        let urls = match &self.distribution_url {
            Some(url) => vec![url.clone()],
            None => self.resolve_distribution_urls(distro).await?,
        };

        let mut files = Vec::with_capacity(urls.len());
        for url in &urls {
            logger.debug("UPSTREAM", format!("Reading distribution file {url}"));
            files.push(self.fetch_yaml::<DistributionFile>(url).await?);
        }

        Ok(collect_packages(files, logger))
    }

    async fn resolve_distribution_urls(&self, distro: &str) -> Result<Vec<String>> {
        let index: IndexFile = self.fetch_yaml(&self.index_url).await?;
        let entry = index.distributions.get(distro).ok_or_else(|| {
            DistroCheckError::Config(format!(
                "Distribution `{distro}` not listed in index {}",
                self.index_url
            ))
        })?;
        if entry.distribution.is_empty() {
            return Err(DistroCheckError::Serialization(format!(
                "Index entry for `{distro}` names no distribution file"
            )));
        }

        let base = Url::parse(&self.index_url).map_err(|err| {
            DistroCheckError::Config(format!("Invalid index URL {}: {err}", self.index_url))
        })?;
        entry
            .distribution
            .iter()
            .map(|relative| {
                base.join(relative).map(String::from).map_err(|err| {
                    DistroCheckError::Serialization(format!(
                        "Invalid distribution path `{relative}`: {err}"
                    ))
                })
            })
            .collect()
    }

    async fn fetch_yaml<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await.map_err(|err| {
            DistroCheckError::Network(format!("Request to {url} failed: {err}"))
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DistroCheckError::Network(format!(
                "Request to {url} failed with status {status}"
            )));
        }
        let body = response.text().await.map_err(|err| {
            DistroCheckError::Network(format!("Failed to read body of {url}: {err}"))
        })?;
        serde_yaml::from_str(&body).map_err(|err| {
            DistroCheckError::Serialization(format!("Failed to decode {url}: {err}"))
        })
    }
}

fn collect_packages(files: Vec<DistributionFile>, logger: &Logger) -> UpstreamManifest {
    let mut declared: HashMap<String, Vec<String>> = HashMap::new();
    let mut packages = BTreeMap::new();

    for file in files {
        for (repository, entry) in file.repositories {
            let Some(release) = entry.release else {
                continue;
            };
            let names = if release.packages.is_empty() {
                vec![repository.clone()]
            } else {
                release.packages
            };
            for name in names {
                declared
                    .entry(name.clone())
                    .or_default()
                    .push(repository.clone());
                packages.insert(name, release.version.clone());
            }
        }
    }

    for (name, repositories) in declared {
        if repositories.len() > 1 {
            logger.error(
                "AMBIGUOUS",
                format!(
                    "Package {name} is released by {} repositories ({}); upstream version withheld",
                    repositories.len(),
                    repositories.join(", ")
                ),
            );
            packages.insert(name, None);
        }
    }

    UpstreamManifest { packages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const INDEX: &str = r#"
distributions:
  melodic:
    distribution: [melodic/distribution.yaml]
    distribution_status: end-of-life
  noetic:
    distribution: [noetic/distribution.yaml]
type: index
version: 4
"#;

    const DISTRIBUTION: &str = r#"
repositories:
  roscpp_core:
    release:
      packages: [cpp_common, rostime]
      url: https://github.com/ros-gbp/roscpp_core-release.git
      version: 0.6.13-1
    status: maintained
  actionlib:
    release:
      url: https://github.com/ros-gbp/actionlib-release.git
      version: 1.12.1-1
  unreleased:
    release:
      packages: [draft_pkg]
  source_only:
    source:
      type: git
      url: https://github.com/example/source_only.git
type: distribution
version: 2
"#;

    fn config(server: &Server) -> UpstreamConfig {
        UpstreamConfig {
            index_url: format!("{}/index-v4.yaml", server.url()),
            distribution_url: None,
            timeout: 5,
        }
    }

    #[tokio::test]
    async fn resolves_index_and_lists_released_packages() {
        let mut server = Server::new_async().await;
        let index = server
            .mock("GET", "/index-v4.yaml")
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;
        let distribution = server
            .mock("GET", "/melodic/distribution.yaml")
            .with_status(200)
            .with_body(DISTRIBUTION)
            .create_async()
            .await;

        let client = RosdistroClient::new(&config(&server)).unwrap();
        let manifest = client
            .fetch_manifest("melodic", &Logger::silent())
            .await
            .unwrap();

        index.assert_async().await;
        distribution.assert_async().await;
        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest.packages["cpp_common"].as_deref(), Some("0.6.13-1"));
        assert_eq!(manifest.packages["rostime"].as_deref(), Some("0.6.13-1"));
        assert_eq!(manifest.packages["actionlib"].as_deref(), Some("1.12.1-1"));
        assert_eq!(manifest.packages["draft_pkg"], None);
        assert!(!manifest.packages.contains_key("source_only"));
    }

    #[tokio::test]
    async fn unknown_distribution_is_config_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/index-v4.yaml")
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;

        let client = RosdistroClient::new(&config(&server)).unwrap();
        let result = client.fetch_manifest("kinetic", &Logger::silent()).await;
        assert!(matches!(result, Err(DistroCheckError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_distribution_file_is_network_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/melodic.yaml")
            .with_status(500)
            .create_async()
            .await;

        let mut config = config(&server);
        config.distribution_url = Some(format!("{}/melodic.yaml", server.url()));
        let client = RosdistroClient::new(&config).unwrap();
        let result = client.fetch_manifest("melodic", &Logger::silent()).await;
        assert!(matches!(result, Err(DistroCheckError::Network(_))));
    }

    #[test]
    fn retain_requested_keeps_known_names_and_reports_unknown() {
        let mut manifest = UpstreamManifest {
            packages: BTreeMap::from([
                ("roscpp".to_string(), Some("1.14.10-1".to_string())),
                ("rospy".to_string(), Some("1.14.10-1".to_string())),
                ("tf2".to_string(), None),
            ]),
        };
        let logger = Logger::silent();

        manifest.retain_requested(&["tf2".into(), "roscpp".into(), "ghost".into()], &logger);

        assert_eq!(
            manifest.packages.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["roscpp", "tf2"]
        );
        assert_eq!(logger.diagnostics(), 1);
    }

    #[test]
    fn empty_request_keeps_whole_manifest() {
        let mut manifest = UpstreamManifest {
            packages: BTreeMap::from([("roscpp".to_string(), None)]),
        };
        let logger = Logger::silent();

        manifest.retain_requested(&[], &logger);

        assert_eq!(manifest.len(), 1);
        assert_eq!(logger.diagnostics(), 0);
    }

    #[test]
    fn duplicate_declarations_withhold_version() {
        let first: DistributionFile = serde_yaml::from_str(
            "repositories:\n  a:\n    release:\n      packages: [shared, only_a]\n      version: 1.0.0-1\n",
        )
        .unwrap();
        let second: DistributionFile = serde_yaml::from_str(
            "repositories:\n  b:\n    release:\n      packages: [shared]\n      version: 2.0.0-1\n",
        )
        .unwrap();

        let logger = Logger::silent();
        let manifest = collect_packages(vec![first, second], &logger);
        assert_eq!(manifest.packages["shared"], None);
        assert_eq!(manifest.packages["only_a"].as_deref(), Some("1.0.0-1"));
        assert_eq!(logger.diagnostics(), 1);
    }
}
