/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Turn reconciled package records into a filtered report:
    human-readable per-package summaries and an optional
    JSON document with per-status tallies.

  Security / Safety Notes:
    Report data is written to operator-controlled paths; no
    privileged operations are performed.

  Dependencies:
    serde for JSON serialization, chrono for timestamps.

  Operational Scope:
    Final stage of a run; consumes records, produces output.

  Revision History:
    2026-10-19 COD  Authored report builder.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Absence rendered explicitly, never as a guess
============================================================*/

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{DistroCheckError, Result};
use crate::package_info::{PackageRecord, Status};
use crate::version::VersionValue;

/// Driver-side display filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub installed_only: bool,
    pub hide_up_to_date: bool,
}

impl ReportFilter {
    pub fn admits(&self, record: &PackageRecord) -> bool {
        if self.installed_only && !record.is_installed() {
            return false;
        }
        let classification = record.classify();
        if self.hide_up_to_date
            && classification.status == Status::UpToDate
            && !classification.out_of_sync
        {
            return false;
        }
        true
    }
}

/// Full report document.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub metadata: ReportMetadata,
    pub packages: BTreeMap<String, ReportEntry>,
}

/// Tallies are taken over every reconciled package, before filtering.
#[derive(Debug, Default, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub generated_by: String,
    pub distro: String,
    pub total_packages: usize,
    pub listed_packages: usize,
    pub up_to_date: usize,
    pub outdated: usize,
    pub ahead: usize,
    pub missing: usize,
    pub errors: usize,
    pub out_of_sync: usize,
    pub installed: usize,
    pub ambiguous: usize,
    pub diagnostics: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub status: Status,
    pub out_of_sync: bool,
    pub upstream_version: Option<String>,
    pub aur_package: Option<String>,
    pub aur_version: Option<String>,
    pub maintainer: Option<String>,
    pub mirror_version: Option<String>,
    pub installed: bool,
    pub installed_version: Option<String>,
    pub ambiguous_candidates: Option<usize>,
}

impl From<&PackageRecord> for ReportEntry {
    fn from(record: &PackageRecord) -> Self {
        let classification = record.classify();
        let text = |value: Option<VersionValue>| value.map(|v| v.to_string());
        Self {
            status: classification.status,
            out_of_sync: classification.out_of_sync,
            upstream_version: text(record.upstream_version()),
            aur_package: record.repo_name().map(str::to_string),
            aur_version: text(record.repo_version()),
            maintainer: record.maintainer().map(str::to_string),
            mirror_version: text(record.mirror_version()),
            installed: record.is_installed(),
            installed_version: text(record.installed_version()),
            ambiguous_candidates: record.ambiguous_candidates(),
        }
    }
}

/// Build the report from all records, listing only those the filter admits.
pub fn build_report(
    records: &BTreeMap<String, PackageRecord>,
    filter: ReportFilter,
    distro: &str,
    diagnostics: usize,
) -> ReportDocument {
    let mut metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        generated_by: "distro_check".into(),
        distro: distro.into(),
        total_packages: records.len(),
        diagnostics,
        ..ReportMetadata::default()
    };
    let mut packages = BTreeMap::new();

    for (name, record) in records {
        let classification = record.classify();
        match classification.status {
            Status::UpToDate => metadata.up_to_date += 1,
            Status::Outdated => metadata.outdated += 1,
            Status::Ahead => metadata.ahead += 1,
            Status::Missing => metadata.missing += 1,
            Status::Error => metadata.errors += 1,
        }
        if classification.out_of_sync {
            metadata.out_of_sync += 1;
        }
        if record.is_installed() {
            metadata.installed += 1;
        }
        if record.ambiguous_candidates().is_some() {
            metadata.ambiguous += 1;
        }
        if filter.admits(record) {
            packages.insert(name.clone(), ReportEntry::from(record));
        }
    }

    metadata.listed_packages = packages.len();
    ReportDocument { metadata, packages }
}

fn or_none(value: Option<VersionValue>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Multi-line human-readable summary of one record.
pub fn render_record(record: &PackageRecord) -> String {
    let classification = record.classify();
    let mut output = format!("{}: {}", record.name(), classification.status);
    if classification.out_of_sync {
        output.push_str(" [out of sync]");
    }
    output.push_str(&format!(
        "\n - upstream:  {}",
        or_none(record.upstream_version())
    ));
    let repo_line = match (record.repo_version(), record.ambiguous_candidates()) {
        (Some(version), _) => format!(
            "{version} (Maintainer: {})",
            record.maintainer().unwrap_or("none")
        ),
        (None, Some(candidates)) => format!("ambiguous ({candidates} candidates)"),
        (None, None) => "None".to_string(),
    };
    output.push_str(&format!("\n - AUR:       {repo_line}"));
    if let Some(version) = record.mirror_version() {
        output.push_str(&format!("\n - mirror:    {version}"));
    }
    output.push_str(&format!(
        "\nInstalled:    {}",
        or_none(record.installed_version())
    ));
    output
}

/// One-line tally for the end of a run.
pub fn render_summary(metadata: &ReportMetadata) -> String {
    format!(
        "→ {} packages ({} listed): up-to-date={} outdated={} ahead={} missing={} error={} out-of-sync={} installed={} diagnostics={}",
        metadata.total_packages,
        metadata.listed_packages,
        metadata.up_to_date,
        metadata.outdated,
        metadata.ahead,
        metadata.missing,
        metadata.errors,
        metadata.out_of_sync,
        metadata.installed,
        metadata.diagnostics
    )
}

/// Persist the report as pretty JSON.
pub fn write_report(document: &ReportDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            DistroCheckError::Filesystem(format!(
                "Failed to create report directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        DistroCheckError::Filesystem(format!(
            "Failed to create report file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        DistroCheckError::Serialization(format!(
            "Failed to write report {}: {err}",
            path.display()
        ))
    })?;
    Ok(())
}
