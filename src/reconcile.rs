/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::reconcile
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Gather per-run provenance data and reconcile every
    upstream package into a PackageRecord, one bounded task
    per package.

  Security / Safety Notes:
    Delegates all I/O to the source clients; holds no state
    beyond the current run.

  Dependencies:
    tokio for the bounded task set.

  Operational Scope:
    Invoked once per run between manifest enumeration and
    reporting.

  Revision History:
    2026-10-19 COD  Authored reconciliation driver.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Per-run context passed explicitly, no ambient caches
    - Channel failures degrade to absence, never abort
    - Every upstream package yields a record
============================================================*/

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::aur::{aur_package_name, AurClient, RepoLookup};
use crate::config::DistroCheckConfig;
use crate::error::Result;
use crate::logger::Logger;
use crate::mirror::{MirrorClient, MirrorLookup};
use crate::package_info::PackageRecord;
use crate::pacman::{query_installed_packages, InstalledPackages};
use crate::rosdistro::UpstreamManifest;

/// Provenance gathered for one run, shared read-only by every package task.
pub struct RunContext {
    pub distro: String,
    pub package_prefix: String,
    /// Binary-repo lookups keyed by derived AUR package name.
    pub repo: HashMap<String, RepoLookup>,
    pub installed: InstalledPackages,
    pub mirror: Option<MirrorClient>,
    pub logger: Arc<Logger>,
}

impl RunContext {
    /// Query the AUR and the local pacman database for every manifest package.
    pub async fn gather(
        config: &DistroCheckConfig,
        manifest: &UpstreamManifest,
        logger: Arc<Logger>,
    ) -> Result<Self> {
        let names: Vec<String> = manifest
            .packages
            .keys()
            .map(|name| aur_package_name(&config.aur.package_prefix, &config.distro, name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let aur = AurClient::new(&config.aur)?;
        let repo = aur.lookup(&names, &logger).await;
        let found = repo
            .values()
            .filter(|lookup| matches!(lookup, RepoLookup::Found(_)))
            .count();
        logger.info(
            "AUR",
            format!("Matched {found} of {} packages in the AUR", names.len()),
        );

        let installed = match query_installed_packages().await {
            Ok(installed) => installed,
            Err(err) => {
                logger.warn("PACMAN", format!("{err}; install state unavailable"));
                InstalledPackages::new()
            }
        };

        let mirror = if config.mirror.enabled {
            Some(MirrorClient::new(&config.mirror, config.mirror_organization())?)
        } else {
            None
        };

        Ok(Self {
            distro: config.distro.clone(),
            package_prefix: config.aur.package_prefix.clone(),
            repo,
            installed,
            mirror,
            logger,
        })
    }

    fn repo_name(&self, package: &str) -> String {
        aur_package_name(&self.package_prefix, &self.distro, package)
    }
}

/// Reconcile every manifest package, at most `jobs` at a time.
pub async fn reconcile(
    manifest: &UpstreamManifest,
    context: Arc<RunContext>,
    jobs: usize,
) -> BTreeMap<String, PackageRecord> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let contested = contested_repo_names(manifest, &context);
    let mut tasks = Vec::with_capacity(manifest.len());

    for (name, upstream) in &manifest.packages {
        let task_name = name.clone();
        let upstream = upstream.clone();
        let claimants = contested.get(name).copied();
        let context = context.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            reconcile_package(&task_name, upstream.as_deref(), claimants, &context).await
        });
        tasks.push((name.clone(), handle));
    }

    let mut records = BTreeMap::new();
    for (name, handle) in tasks {
        let record = match handle.await {
            Ok(record) => record,
            Err(err) => {
                context
                    .logger
                    .error("RECONCILE", format!("Task for {name} failed: {err}"));
                PackageRecord::new(name.clone())
            }
        };
        records.insert(name, record);
    }
    records
}

/// Upstream packages whose derived AUR name is shared with another upstream
/// package, mapped to the number of packages claiming that name.
fn contested_repo_names(
    manifest: &UpstreamManifest,
    context: &RunContext,
) -> HashMap<String, usize> {
    let mut claims: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for name in manifest.packages.keys() {
        claims
            .entry(context.repo_name(name))
            .or_default()
            .push(name.as_str());
    }

    let mut contested = HashMap::new();
    for (repo_name, claimants) in claims {
        if claimants.len() < 2 {
            continue;
        }
        context.logger.error(
            "AMBIGUOUS",
            format!(
                "AUR name {repo_name} is derived from {} upstream packages ({}); none matched",
                claimants.len(),
                claimants.join(", ")
            ),
        );
        for claimant in &claimants {
            contested.insert(claimant.to_string(), claimants.len());
        }
    }
    contested
}

async fn reconcile_package(
    name: &str,
    upstream: Option<&str>,
    claimants: Option<usize>,
    context: &RunContext,
) -> PackageRecord {
    let logger = context.logger.as_ref();
    let mut record = PackageRecord::new(name);

    match upstream {
        Some(version) => record.apply_upstream_info(version, logger),
        None => logger.debug("UPSTREAM", format!("No release version for {name}")),
    }

    // A shared AUR name cannot tell its claimants apart on either channel.
    if let Some(count) = claimants {
        record.mark_ambiguous(count);
        return record;
    }

    let repo_name = context.repo_name(name);
    match context.repo.get(&repo_name) {
        Some(RepoLookup::Found(repo)) => {
            let installed = context.installed.get(&repo.name).map(String::as_str);
            record.apply_repo_info(repo, installed, logger);
        }
        Some(RepoLookup::Ambiguous(candidates)) => record.mark_ambiguous(*candidates),
        Some(RepoLookup::Absent) | Some(RepoLookup::Unavailable) | None => {}
    }

    if let Some(mirror) = &context.mirror {
        if let MirrorLookup::Found(version) = mirror.fetch(&repo_name, logger).await {
            record.apply_mirror_info(&version, logger);
        }
    }

    record
}
