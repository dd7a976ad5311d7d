//! CLI subcommands

pub mod config;
pub mod health;
pub mod info;
pub mod token;
pub mod webhook;

/// Turns a non-2xx reply status into an error so the process exits non-zero
///
/// The reply itself has already been printed by the caller.
pub fn ensure_success(status_code: u16, message: &str) -> anyhow::Result<()> {
    if (200..300).contains(&status_code) {
        Ok(())
    } else {
        anyhow::bail!("{message} (HTTP {status_code})")
    }
}
