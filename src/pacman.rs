/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check::pacman
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Read the local pacman database to learn which AUR
    packages are installed and at which version.

  Security / Safety Notes:
    Executes `pacman -Q` with user privileges only; no
    privilege escalation is attempted.

  Dependencies:
    tokio::process for async command execution.

  Operational Scope:
    Supplies the installed channel of each package record.

  Revision History:
    2026-10-19 COD  Crafted pacman query layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
============================================================*/

use std::collections::HashMap;
use std::io;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{DistroCheckError, Result};

/// Installed package names mapped to their version strings.
pub type InstalledPackages = HashMap<String, String>;

/// Enumerate all installed packages via `pacman -Q`.
pub async fn query_installed_packages() -> Result<InstalledPackages> {
    let output = Command::new("pacman")
        .arg("-Q")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| map_spawn_error(err, "pacman"))?;

    if !output.status.success() {
        return Err(DistroCheckError::CommandFailure {
            command: "pacman -Q".into(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|err| {
        DistroCheckError::Serialization(format!("pacman -Q emitted invalid UTF-8: {err}"))
    })?;

    Ok(parse_query_output(&stdout))
}

/// Parse `name version` lines; malformed lines are skipped.
pub fn parse_query_output(stdout: &str) -> InstalledPackages {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            Some((name.to_string(), version.to_string()))
        })
        .collect()
}

fn map_spawn_error(err: io::Error, command: &str) -> DistroCheckError {
    if err.kind() == io::ErrorKind::NotFound {
        DistroCheckError::CommandMissing {
            command: command.into(),
        }
    } else {
        DistroCheckError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_version_pairs() {
        let output = "\
ros-melodic-roscpp 1.14.10-1
ros-melodic-rostime 0.6.13-2

garbage-line
linux 6.11.1.arch1-1
";
        let installed = parse_query_output(output);
        assert_eq!(installed.len(), 3);
        assert_eq!(installed["ros-melodic-roscpp"], "1.14.10-1");
        assert_eq!(installed["ros-melodic-rostime"], "0.6.13-2");
        assert_eq!(installed["linux"], "6.11.1.arch1-1");
        assert!(!installed.contains_key("garbage-line"));
    }

    #[test]
    fn missing_binary_maps_to_command_missing() {
        let err = map_spawn_error(io::Error::from(io::ErrorKind::NotFound), "pacman");
        assert!(matches!(err, DistroCheckError::CommandMissing { command } if command == "pacman"));
    }

    #[test]
    fn other_spawn_errors_map_to_runtime() {
        let err = map_spawn_error(io::Error::from(io::ErrorKind::PermissionDenied), "pacman");
        assert!(matches!(err, DistroCheckError::Runtime(_)));
    }
}
