/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::mirror
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Fetch the PKGBUILD committed to the packaging mirror for
    an AUR package and extract its `pkgver`.

  Security / Safety Notes:
    Read-only HTTPS GET of raw files; recipe content is only
    pattern-matched, never executed.

  Dependencies:
    reqwest for HTTP, regex for pkgver extraction.

  Operational Scope:
    Supplies the source-mirror channel of each package record.

  Revision History:
    2026-10-19 COD  Implemented mirror recipe client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Absent repositories are a normal, silent outcome
    - Unparsable recipes are always reported
============================================================*/

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::config::MirrorConfig;
use crate::error::{DistroCheckError, Result};
use crate::logger::Logger;

fn pkgver_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*pkgver[ \t]*=[ \t]*["']?(?P<version>[^"'\s]+)["']?"#)
            .expect("pkgver pattern is valid")
    })
}

/// Outcome of reading one package's recipe from the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorLookup {
    Found(String),
    /// No repository (or no reachable file) for this package.
    NotFound,
    /// The recipe exists but declares no `pkgver`.
    Unparsable,
}

/// Extract the `pkgver` value from a PKGBUILD body.
pub fn extract_pkgver(recipe: &str) -> Option<&str> {
    pkgver_pattern()
        .captures(recipe)
        .and_then(|captures| captures.name("version"))
        .map(|version| version.as_str())
}

/// Client for raw recipe files on the packaging mirror.
#[derive(Clone)]
pub struct MirrorClient {
    client: reqwest::Client,
    base_url: String,
    organization: String,
    branch: String,
    recipe: String,
}

impl MirrorClient {
    pub fn new(config: &MirrorConfig, organization: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("Distro-Check/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                DistroCheckError::Network(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organization,
            branch: config.branch.clone(),
            recipe: config.recipe.clone(),
        })
    }

    pub fn recipe_url(&self, repo_name: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.base_url, self.organization, repo_name, self.branch, self.recipe
        )
    }

    /// Read the recipe for `repo_name`; transport failures count as not found.
    pub async fn fetch(&self, repo_name: &str, logger: &Logger) -> MirrorLookup {
        let url = self.recipe_url(repo_name);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                logger.debug("MIRROR", format!("{url} unreachable: {err}"));
                return MirrorLookup::NotFound;
            }
        };

        let status = response.status();
        if !status.is_success() {
            logger.debug("MIRROR", format!("{url} answered {status}"));
            return MirrorLookup::NotFound;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                logger.debug("MIRROR", format!("Failed to read {url}: {err}"));
                return MirrorLookup::NotFound;
            }
        };

        match extract_pkgver(&body) {
            Some(version) => MirrorLookup::Found(version.to_string()),
            None => {
                logger.warn(
                    "MIRROR",
                    format!("Could not parse mirror version for package {repo_name} ({url})"),
                );
                MirrorLookup::Unparsable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use rstest::rstest;

    fn client(server: &Server) -> MirrorClient {
        let config = MirrorConfig {
            base_url: server.url(),
            ..MirrorConfig::default()
        };
        MirrorClient::new(&config, "ros-melodic-arch".into()).unwrap()
    }

    #[rstest]
    #[case("pkgver='1.14.10'\n", Some("1.14.10"))]
    #[case("pkgver=\"0.6.13\"\n", Some("0.6.13"))]
    #[case("pkgdesc=\"x\"\n  pkgver = 2.0.1\npkgrel=1\n", Some("2.0.1"))]
    #[case("_pkgver=1.0.0\n", None)]
    #[case("_pkgver=1.0.0\npkgver=1.2.0\n", Some("1.2.0"))]
    #[case("pkgname=ros-melodic-roscpp\npkgrel=1\n", None)]
    fn extracts_pkgver_assignment(#[case] recipe: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_pkgver(recipe), expected);
    }

    #[tokio::test]
    async fn found_recipe_yields_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ros-melodic-arch/ros-melodic-roscpp/master/PKGBUILD")
            .with_status(200)
            .with_body("pkgdesc=\"ROS - roscpp\"\nurl='https://wiki.ros.org/roscpp'\npkgname='ros-melodic-roscpp'\npkgver='1.14.10'\npkgrel=1\n")
            .create_async()
            .await;

        let logger = Logger::silent();
        let lookup = client(&server).fetch("ros-melodic-roscpp", &logger).await;

        mock.assert_async().await;
        assert_eq!(lookup, MirrorLookup::Found("1.14.10".into()));
        assert_eq!(logger.diagnostics(), 0);
    }

    #[tokio::test]
    async fn missing_repository_is_silent() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ros-melodic-arch/ros-melodic-ghost/master/PKGBUILD")
            .with_status(404)
            .create_async()
            .await;

        let logger = Logger::silent();
        let lookup = client(&server).fetch("ros-melodic-ghost", &logger).await;
        assert_eq!(lookup, MirrorLookup::NotFound);
        assert_eq!(logger.diagnostics(), 0);
    }

    #[tokio::test]
    async fn recipe_without_pkgver_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ros-melodic-arch/ros-melodic-odd/master/PKGBUILD")
            .with_status(200)
            .with_body("pkgname=ros-melodic-odd\n")
            .create_async()
            .await;

        let logger = Logger::silent();
        let lookup = client(&server).fetch("ros-melodic-odd", &logger).await;
        assert_eq!(lookup, MirrorLookup::Unparsable);
        assert_eq!(logger.diagnostics(), 1);
    }
}
