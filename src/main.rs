/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Distro-Check. Enumerates upstream release
    packages, reconciles them against the AUR, the PKGBUILD
    mirror and the local install state, and reports status.

  Security / Safety Notes:
    Operates within user privileges. Executes `pacman -Q` and
    performs HTTPS GET requests only.

  Dependencies:
    clap for CLI parsing, chrono for timestamps, tokio runtime.

  Operational Scope:
    Invoked by packagers auditing a distribution's AUR ports.

  Revision History:
    2026-10-19 COD  Authored Distro-Check runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser};

use distro_check::config::DistroCheckConfig;
use distro_check::error::{DistroCheckError, Result};
use distro_check::logger::Logger;
use distro_check::reconcile::{reconcile, RunContext};
use distro_check::report::{build_report, render_record, render_summary, write_report, ReportFilter};
use distro_check::rosdistro::RosdistroClient;

/// Command-line arguments for Distro-Check.
#[derive(Debug, Parser)]
#[command(
    name = "distro-check",
    version,
    author = "Synavera Systems",
    about = "Compare a distribution's release versions with its AUR packages"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Distribution to check (e.g. melodic, noetic).
    #[arg(long, value_name = "NAME")]
    distro: Option<String>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Write a JSON report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Limit the check to specific upstream packages.
    #[arg(long = "package", value_name = "PKG", action = ArgAction::Append)]
    packages: Vec<String>,
    /// Only list packages installed on this system.
    #[arg(long, action = ArgAction::SetTrue)]
    installed_only: bool,
    /// Do not list packages that are up to date and in sync.
    #[arg(long, action = ArgAction::SetTrue)]
    hide_up_to_date: bool,
    /// Skip PKGBUILD mirror lookups.
    #[arg(long, action = ArgAction::SetTrue)]
    no_mirror: bool,
    /// Packages reconciled concurrently.
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[distro-check] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = DistroCheckConfig::load_from_optional_path(cli.config.as_deref())?;
    if let Some(distro) = &cli.distro {
        config.distro = distro.clone();
    }
    if let Some(jobs) = cli.jobs {
        if jobs == 0 {
            return Err(DistroCheckError::Config("--jobs must be at least 1".into()));
        }
        config.jobs = jobs;
    }
    if cli.no_mirror {
        config.mirror.enabled = false;
    }

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .unwrap_or_else(|| config.log_dir().join(format!("check_{session_stamp}.log")));
    let logger = Arc::new(Logger::new(Some(log_path), cli.verbose)?);
    logger.info(
        "INIT",
        format!("Checking distribution {} against the AUR", config.distro),
    );

    let upstream = RosdistroClient::new(&config.upstream)?;
    let mut manifest = upstream.fetch_manifest(&config.distro, &logger).await?;
    logger.info(
        "UPSTREAM",
        format!("Distribution lists {} released packages", manifest.len()),
    );

    manifest.retain_requested(&cli.packages, &logger);
    if manifest.is_empty() {
        logger.warn("EMPTY", "No packages selected for checking; exiting");
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }

    let context = RunContext::gather(&config, &manifest, logger.clone()).await?;
    let records = reconcile(&manifest, Arc::new(context), config.jobs).await;

    let filter = ReportFilter {
        installed_only: cli.installed_only,
        hide_up_to_date: cli.hide_up_to_date,
    };
    let document = build_report(&records, filter, &config.distro, logger.diagnostics());

    for name in document.packages.keys() {
        if let Some(record) = records.get(name) {
            println!("---\n{}", render_record(record));
        }
    }

    if let Some(report_path) = cli.report.clone().or_else(|| config.paths.report_path.clone()) {
        write_report(&document, &report_path)?;
        logger.info(
            "REPORT",
            format!("Report written to {}", report_path.display()),
        );
    }

    let summary = render_summary(&document.metadata);
    println!("{summary}");
    logger.info("SUMMARY", summary);
    logger.info("COMPLETE", "Distribution check finished.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}
