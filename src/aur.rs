/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::aur
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the Arch User Repository RPC API for the packaged
    version and maintainer of every upstream package.

  Security / Safety Notes:
    Performs read-only HTTPS requests to the public AUR API.
    No credentials are transmitted.

  Dependencies:
    reqwest for HTTP, serde for response parsing, tokio for
    bounded parallel batches.

  Operational Scope:
    Supplies the binary-repo channel of each package record.

  Revision History:
    2026-10-19 COD  Adapted asynchronous AUR client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Defensive retry logic with exponential backoff
    - Failed batches degrade to unavailable, never abort
    - Duplicate candidates reported, never silently chosen
============================================================*/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use urlencoding::encode;

use crate::config::AurConfig;
use crate::error::{DistroCheckError, Result};
use crate::logger::Logger;
use crate::package_info::RepoPackage;

/// Outcome of looking up one derived AUR package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLookup {
    Found(RepoPackage),
    /// The API returned this many entries for a single name.
    Ambiguous(usize),
    Absent,
    /// The batch containing this name could not be fetched.
    Unavailable,
}

/// Derive the AUR package name for an upstream package.
pub fn aur_package_name(prefix: &str, distro: &str, package: &str) -> String {
    format!("{prefix}{distro}-{}", package.replace('_', "-"))
}

/// Client for interacting with the AUR RPC API.
#[derive(Clone)]
pub struct AurClient {
    client: reqwest::Client,
    base_url: String,
    max_args: usize,
    max_retries: usize,
    max_parallel_requests: usize,
}

impl AurClient {
    /// Construct a new client from configuration.
    pub fn new(config: &AurConfig) -> Result<Self> {
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
            max_args: config.max_args.max(1),
            max_retries: config.max_retries.max(1),
            max_parallel_requests: config.max_parallel_requests.max(1),
        })
    }

    /// Look up every name; each one gets exactly one `RepoLookup`.
    pub async fn lookup(&self, names: &[String], logger: &Logger) -> HashMap<String, RepoLookup> {
        let mut lookups = HashMap::with_capacity(names.len());
        if names.is_empty() {
            return lookups;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel_requests));
        let mut tasks = Vec::new();

        for chunk in names.chunks(self.max_args) {
            let chunk = chunk.to_vec();
            let client = self.clone();
            let semaphore = semaphore.clone();
            tasks.push(tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => client.fetch_chunk(&chunk).await,
                    Err(_) => Err(DistroCheckError::Runtime("AUR semaphore closed".into())),
                };
                (chunk, outcome)
            }));
        }

        for task in tasks {
            let (chunk, outcome) = match task.await {
                Ok(joined) => joined,
                Err(err) => {
                    logger.error("AUR", format!("AUR task failed: {err}"));
                    continue;
                }
            };
            match outcome {
                Ok(entries) => {
                    lookups.extend(group_entries(&chunk, entries, logger));
                }
                Err(err) => {
                    logger.warn(
                        "AUR",
                        format!("{err}; {} packages treated as unavailable", chunk.len()),
                    );
                    for name in chunk {
                        lookups.insert(name, RepoLookup::Unavailable);
                    }
                }
            }
        }

        // Names from a panicked task never made it back.
        for name in names {
            lookups
                .entry(name.clone())
                .or_insert(RepoLookup::Unavailable);
        }

        lookups
    }

    fn compose_url(&self, packages: &[String]) -> String {
        let mut url = format!("{}?v=5&type=info", self.base_url);
        for pkg in packages {
            url.push_str("&arg[]=");
            url.push_str(&encode(pkg));
        }
        url
    }

    async fn fetch_chunk(&self, chunk: &[String]) -> Result<Vec<AurEntry>> {
        let mut attempt = 0;
        let url = self.compose_url(chunk);
        loop {
            let response = self.client.get(&url).send().await.map_err(|err| {
                DistroCheckError::Network(format!("AUR request to {url} failed: {err}"))
            })?;

            if response.status() == StatusCode::OK {
                let payload = response.json::<AurResponse>().await.map_err(|err| {
                    DistroCheckError::Serialization(format!(
                        "Failed to decode AUR response: {err}"
                    ))
                })?;

                if let Some(error) = payload.error {
                    return Err(DistroCheckError::Network(format!(
                        "AUR responded with error for {url}: {error}"
                    )));
                }
                return Ok(payload.results);
            }

            attempt += 1;
            if attempt >= self.max_retries {
                return Err(DistroCheckError::Network(format!(
                    "AUR request {url} failed with status {} after {attempt} attempts",
                    response.status()
                )));
            }
            let exponent = (attempt as u32).min(8);
            sleep(Duration::from_millis(200_u64.saturating_mul(1_u64 << exponent))).await;
        }
    }
}

fn group_entries(
    chunk: &[String],
    entries: Vec<AurEntry>,
    logger: &Logger,
) -> HashMap<String, RepoLookup> {
    let mut grouped: HashMap<String, Vec<AurEntry>> = HashMap::new();
    for entry in entries {
        grouped.entry(entry.name.clone()).or_default().push(entry);
    }

    chunk
        .iter()
        .map(|name| {
            let lookup = match grouped.remove(name) {
                None => RepoLookup::Absent,
                Some(mut candidates) if candidates.len() == 1 => {
                    let entry = candidates.remove(0);
                    RepoLookup::Found(RepoPackage {
                        name: entry.name,
                        version: entry.version,
                        maintainer: entry.maintainer,
                    })
                }
                Some(candidates) => {
                    logger.error(
                        "AMBIGUOUS",
                        format!(
                            "AUR returned {} candidates for {name}; none selected",
                            candidates.len()
                        ),
                    );
                    RepoLookup::Ambiguous(candidates.len())
                }
            };
            (name.clone(), lookup)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct AurResponse {
    #[serde(default)]
    results: Vec<AurEntry>,
    #[serde(rename = "error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AurEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Maintainer")]
    maintainer: Option<String>,
}
