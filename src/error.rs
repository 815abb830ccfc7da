/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Distro-Check error types: run-level failures
    with stable exit codes, and the per-field version parse
    failure that never escapes a package record.

  Security / Safety Notes:
    Error contexts expose URLs and paths only; no credentials
    are ever part of a request.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate fatal failures and to
    describe recoverable version parse failures.

  Revision History:
    2026-10-19 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Distro-Check operations.
pub type Result<T> = std::result::Result<T, DistroCheckError>;

/// Enumerates high-level error domains that abort a run.
#[derive(Debug, Error)]
pub enum DistroCheckError {
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
}

impl DistroCheckError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DistroCheckError::CommandMissing { .. } => ExitCode::from(10),
            DistroCheckError::CommandFailure { .. } => ExitCode::from(11),
            DistroCheckError::Config(_) => ExitCode::from(20),
            DistroCheckError::Network(_) => ExitCode::from(30),
            DistroCheckError::Serialization(_) => ExitCode::from(31),
            DistroCheckError::Filesystem(_) => ExitCode::from(40),
            DistroCheckError::Runtime(_) => ExitCode::from(50),
        }
    }
}

/// A version string that does not start with a `major.minor.patch` triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse version `{input}`")]
pub struct VersionParseError {
    pub input: String,
}

impl VersionParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
