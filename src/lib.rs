/*============================================================
  Synavera Project: Distro-Check
  Module: distro_check
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reconciliation engine comparing a distribution's release
    manifest with AUR packages, their PKGBUILD mirror and the
    local pacman database.

  Security / Safety Notes:
    Read-only network access and read-only pacman queries.

  Dependencies:
    See Cargo.toml; each module names its own.

  Operational Scope:
    Consumed by the `distro-check` binary and by tests.

  Revision History:
    2026-10-19 COD  Split engine into a library crate.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Pure core, I/O at the edges
============================================================*/

pub mod aur;
pub mod config;
pub mod error;
pub mod logger;
pub mod mirror;
pub mod package_info;
pub mod pacman;
pub mod reconcile;
pub mod report;
pub mod rosdistro;
pub mod version;
