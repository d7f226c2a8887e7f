//! API key lookup from the OS secret store.
//!
//! The key never comes from the environment or a config file; the only
//! source is the platform keychain, queried with an argument vector.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "GOOGLE_AI_API_KEY";
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const SERVICE_USER: &str = "discord-status-fusion";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch the API key, or `None` when the store has no entry. Absence is a
/// supported mode, not an error.
pub(crate) async fn api_key() -> Option<String> {
    let mut cmd = lookup_command()?;
    cmd.kill_on_drop(true);

    let output = match timeout(LOOKUP_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            warn!(error = %err, "keychain lookup could not run");
            return None;
        }
        Err(_) => {
            warn!("keychain lookup timed out");
            return None;
        }
    };

    if !output.status.success() {
        debug!(service = SERVICE_NAME, "no API key in the keychain");
        return None;
    }

    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

#[cfg(target_os = "macos")]
fn lookup_command() -> Option<Command> {
    let mut cmd = Command::new("security");
    cmd.args(["find-generic-password", "-s", SERVICE_NAME, "-w"]);
    Some(cmd)
}

#[cfg(target_os = "linux")]
fn lookup_command() -> Option<Command> {
    let mut cmd = Command::new("secret-tool");
    cmd.args([
        "lookup",
        "service",
        SERVICE_NAME,
        "username",
        SERVICE_USER,
    ]);
    Some(cmd)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn lookup_command() -> Option<Command> {
    debug!("no secret store integration on this platform");
    None
}
