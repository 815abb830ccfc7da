/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::package_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Per-package reconciliation record merging version data
    from the upstream manifest, the AUR, the PKGBUILD mirror
    and the local pacman database, plus the pure status
    classification derived from whatever subset is present.

  Security / Safety Notes:
    Pure data container; the only side effect is emitting
    parse diagnostics through the shared logger.

  Dependencies:
    serde for status serialization.

  Operational Scope:
    One record per upstream package, owned by a single task.

  Revision History:
    2026-10-19 COD  Introduced PackageRecord and Status.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Malformed input degrades to absence, never a placeholder
============================================================*/

use std::fmt;

use serde::Serialize;

use crate::logger::Logger;
use crate::version::VersionValue;

/// Provenance channel a version string arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Upstream,
    Repo,
    Mirror,
    Installed,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::Upstream => "upstream",
            Channel::Repo => "AUR",
            Channel::Mirror => "mirror",
            Channel::Installed => "installed",
        }
    }
}

/// Primary synchronisation status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    UpToDate,
    Outdated,
    Ahead,
    Missing,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::UpToDate => "up to date",
            Status::Outdated => "outdated",
            Status::Ahead => "ahead",
            Status::Missing => "missing",
            Status::Error => "error",
        };
        f.write_str(label)
    }
}

/// Primary status plus the orthogonal mirror drift flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    /// Only reported alongside a comparable status; never with Missing or Error.
    pub out_of_sync: bool,
}

/// Binary-repo match for an upstream package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPackage {
    /// Repo-side package identifier, also the key for local install state.
    pub name: String,
    pub version: String,
    pub maintainer: Option<String>,
}

/// Aggregated multi-source version record for one upstream package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    name: String,
    upstream_version: Option<VersionValue>,
    repo_version: Option<VersionValue>,
    mirror_version: Option<VersionValue>,
    installed_version: Option<VersionValue>,
    repo_name: Option<String>,
    maintainer: Option<String>,
    is_installed: bool,
    ambiguous_candidates: Option<usize>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upstream_version: None,
            repo_version: None,
            mirror_version: None,
            installed_version: None,
            repo_name: None,
            maintainer: None,
            is_installed: false,
            ambiguous_candidates: None,
        }
    }

    pub fn apply_upstream_info(&mut self, version: &str, logger: &Logger) {
        self.upstream_version = self.parse_channel(Channel::Upstream, version, logger);
    }

    /// Record the binary-repo match and the local install state keyed by it.
    pub fn apply_repo_info(
        &mut self,
        repo: &RepoPackage,
        installed_version: Option<&str>,
        logger: &Logger,
    ) {
        self.repo_version = self.parse_channel(Channel::Repo, &repo.version, logger);
        self.repo_name = Some(repo.name.clone());
        self.maintainer = repo.maintainer.clone();
        self.ambiguous_candidates = None;

        self.installed_version = installed_version
            .and_then(|raw| self.parse_channel(Channel::Installed, raw, logger));
        self.is_installed = self.installed_version.is_some();
    }

    pub fn apply_mirror_info(&mut self, version: &str, logger: &Logger) {
        self.mirror_version = self.parse_channel(Channel::Mirror, version, logger);
    }

    /// Flag a binary-repo lookup that returned several candidates. No
    /// candidate is adopted, so the package classifies as Missing.
    pub fn mark_ambiguous(&mut self, candidates: usize) {
        self.ambiguous_candidates = Some(candidates);
    }

    fn parse_channel(&self, channel: Channel, raw: &str, logger: &Logger) -> Option<VersionValue> {
        match VersionValue::parse(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                logger.warn(
                    "PARSE",
                    format!(
                        "Error parsing {} version of package {}: {err}",
                        channel.label(),
                        self.name
                    ),
                );
                None
            }
        }
    }

    pub fn status(&self) -> Status {
        match (self.upstream_version, self.repo_version) {
            (_, None) => Status::Missing,
            (None, Some(_)) => Status::Error,
            (Some(upstream), Some(repo)) if upstream > repo => Status::Outdated,
            (Some(upstream), Some(repo)) if upstream < repo => Status::Ahead,
            (Some(_), Some(_)) => Status::UpToDate,
        }
    }

    pub fn classify(&self) -> Classification {
        let status = self.status();
        let comparable = !matches!(status, Status::Missing | Status::Error);
        Classification {
            status,
            out_of_sync: comparable && self.is_out_of_sync(),
        }
    }

    pub fn is_outdated(&self) -> bool {
        matches!((self.upstream_version, self.repo_version), (Some(u), Some(r)) if u > r)
    }

    pub fn is_ahead(&self) -> bool {
        matches!((self.upstream_version, self.repo_version), (Some(u), Some(r)) if u < r)
    }

    /// Repo and mirror both known and different, independent of upstream.
    pub fn is_out_of_sync(&self) -> bool {
        matches!((self.repo_version, self.mirror_version), (Some(r), Some(m)) if r != m)
    }

    pub fn is_missing(&self) -> bool {
        self.repo_version.is_none()
    }

    pub fn is_installed(&self) -> bool {
        self.is_installed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upstream_version(&self) -> Option<VersionValue> {
        self.upstream_version
    }

    pub fn repo_version(&self) -> Option<VersionValue> {
        self.repo_version
    }

    pub fn mirror_version(&self) -> Option<VersionValue> {
        self.mirror_version
    }

    pub fn installed_version(&self) -> Option<VersionValue> {
        self.installed_version
    }

    pub fn repo_name(&self) -> Option<&str> {
        self.repo_name.as_deref()
    }

    pub fn maintainer(&self) -> Option<&str> {
        self.maintainer.as_deref()
    }

    pub fn ambiguous_candidates(&self) -> Option<usize> {
        self.ambiguous_candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn repo(version: &str) -> RepoPackage {
        RepoPackage {
            name: "ros-melodic-roscpp".into(),
            version: version.into(),
            maintainer: Some("packager".into()),
        }
    }

    fn record(
        upstream: Option<&str>,
        repo_version: Option<&str>,
        mirror: Option<&str>,
    ) -> PackageRecord {
        let logger = Logger::silent();
        let mut record = PackageRecord::new("roscpp");
        if let Some(version) = upstream {
            record.apply_upstream_info(version, &logger);
        }
        if let Some(version) = repo_version {
            record.apply_repo_info(&repo(version), None, &logger);
        }
        if let Some(version) = mirror {
            record.apply_mirror_info(version, &logger);
        }
        record
    }

    #[test]
    fn new_record_is_empty() {
        let record = PackageRecord::new("roscpp");
        assert_eq!(record.name(), "roscpp");
        assert_eq!(record.upstream_version(), None);
        assert_eq!(record.repo_version(), None);
        assert_eq!(record.mirror_version(), None);
        assert_eq!(record.installed_version(), None);
        assert_eq!(record.maintainer(), None);
        assert!(!record.is_installed());
    }

    #[rstest]
    #[case(Some("1.2.3"), None, Status::Missing)]
    #[case(None, None, Status::Missing)]
    #[case(None, Some("1.2.3"), Status::Error)]
    #[case(Some("1.2.3"), Some("1.0.0"), Status::Outdated)]
    #[case(Some("1.0.0"), Some("1.2.3"), Status::Ahead)]
    #[case(Some("1.2.3"), Some("1.2.3"), Status::UpToDate)]
    #[case(Some("1.2.3-1"), Some("1.2.3-4"), Status::UpToDate)]
    #[case(Some("garbage"), Some("1.2.3"), Status::Error)]
    #[case(Some("1.2.3"), Some("garbage"), Status::Missing)]
    fn status_truth_table(
        #[case] upstream: Option<&str>,
        #[case] repo_version: Option<&str>,
        #[case] expected: Status,
    ) {
        let record = record(upstream, repo_version, None);
        assert_eq!(record.status(), expected);
        assert_eq!(record.is_missing(), expected == Status::Missing);
        assert_eq!(record.is_outdated(), expected == Status::Outdated);
        assert_eq!(record.is_ahead(), expected == Status::Ahead);
    }

    #[rstest]
    #[case(Some("1.2.3"), Some("1.2.3"), Some("1.2.4"), true)]
    #[case(Some("1.0.0"), Some("1.2.3"), Some("1.2.4"), true)]
    #[case(None, Some("1.2.3"), Some("1.2.4"), true)]
    #[case(Some("1.2.3"), Some("1.2.3"), None, false)]
    #[case(Some("1.2.3"), Some("1.2.3"), Some("1.2.3"), false)]
    #[case(Some("1.2.3"), None, Some("1.2.4"), false)]
    fn out_of_sync_ignores_primary_label(
        #[case] upstream: Option<&str>,
        #[case] repo_version: Option<&str>,
        #[case] mirror: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(record(upstream, repo_version, mirror).is_out_of_sync(), expected);
    }

    #[test]
    fn classification_reports_drift_with_comparable_status() {
        let outdated = record(Some("1.3.0"), Some("1.2.3"), Some("1.2.4")).classify();
        assert_eq!(
            outdated,
            Classification {
                status: Status::Outdated,
                out_of_sync: true
            }
        );

        let errored = record(None, Some("1.2.3"), Some("1.2.4")).classify();
        assert_eq!(errored.status, Status::Error);
        assert!(!errored.out_of_sync);
    }

    #[test]
    fn applying_same_update_twice_is_idempotent() {
        let logger = Logger::silent();
        let mut once = PackageRecord::new("roscpp");
        once.apply_upstream_info("1.2.3", &logger);
        once.apply_repo_info(&repo("1.2.0"), Some("1.1.0-2"), &logger);
        once.apply_mirror_info("1.2.1", &logger);

        let mut twice = once.clone();
        twice.apply_upstream_info("1.2.3", &logger);
        twice.apply_repo_info(&repo("1.2.0"), Some("1.1.0-2"), &logger);
        twice.apply_mirror_info("1.2.1", &logger);

        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_repo_version_leaves_other_fields_intact() {
        let logger = Logger::silent();
        let mut record = PackageRecord::new("roscpp");
        record.apply_upstream_info("1.2.3", &logger);
        record.apply_repo_info(&repo("not-a-version"), Some("1.2.3-1"), &logger);
        record.apply_mirror_info("1.2.3", &logger);

        assert_eq!(logger.diagnostics(), 1);
        assert_eq!(record.repo_version(), None);
        assert_eq!(record.upstream_version(), Some(VersionValue::new(1, 2, 3)));
        assert_eq!(record.mirror_version(), Some(VersionValue::new(1, 2, 3)));
        assert_eq!(record.maintainer(), Some("packager"));
        assert!(record.is_installed());
        assert_eq!(record.status(), Status::Missing);
    }

    #[test]
    fn failed_parse_clears_previous_value() {
        let logger = Logger::silent();
        let mut record = PackageRecord::new("roscpp");
        record.apply_mirror_info("1.2.3", &logger);
        record.apply_mirror_info("${_pkgver}", &logger);
        assert_eq!(record.mirror_version(), None);
        assert_eq!(logger.diagnostics(), 1);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("1.2.3-1"), true)]
    #[case(Some("r123.abcdef"), false)]
    fn installed_only_after_successful_parse(
        #[case] installed: Option<&str>,
        #[case] expected: bool,
    ) {
        let logger = Logger::silent();
        let mut record = PackageRecord::new("roscpp");
        record.apply_repo_info(&repo("1.2.3"), installed, &logger);
        assert_eq!(record.is_installed(), expected);
        assert_eq!(record.installed_version().is_some(), expected);
    }

    #[test]
    fn later_repo_update_without_install_state_clears_installed() {
        let logger = Logger::silent();
        let mut record = PackageRecord::new("roscpp");
        record.apply_repo_info(&repo("1.2.3"), Some("1.2.3"), &logger);
        record.apply_repo_info(&repo("1.2.3"), None, &logger);
        assert!(!record.is_installed());
    }

    #[test]
    fn ambiguous_match_stays_missing() {
        let mut record = record(Some("1.2.3"), None, None);
        record.mark_ambiguous(2);
        assert_eq!(record.ambiguous_candidates(), Some(2));
        assert_eq!(record.status(), Status::Missing);
    }
}
