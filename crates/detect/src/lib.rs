//! Running-application detection.
//!
//! Enumerates OS processes through the platform process lister and filters
//! them down to a deduplicated set of applications worth surfacing in a
//! status line.

mod process;
mod rules;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use rules::is_interesting_app;

/// Deduplicated set of application display names observed in one poll.
///
/// A `BTreeSet` keeps snapshot equality independent of enumeration order.
pub type AppSnapshot = BTreeSet<String>;

const LIST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to spawn process lister: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("process lister exited with {0}")]
    Failed(std::process::ExitStatus),

    #[error("process lister timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of the current set of interesting applications.
///
/// An error means "no data this cycle"; callers degrade to an empty
/// snapshot rather than aborting.
#[async_trait]
pub trait AppSource: Send + Sync {
    async fn interesting_apps(&self) -> Result<AppSnapshot, DetectError>;
}

/// Live implementation backed by the OS process table.
#[derive(Debug, Default)]
pub struct SystemApps;

#[async_trait]
impl AppSource for SystemApps {
    async fn interesting_apps(&self) -> Result<AppSnapshot, DetectError> {
        list_interesting_apps().await
    }
}

/// List the interesting applications currently running.
pub async fn list_interesting_apps() -> Result<AppSnapshot, DetectError> {
    let raw = process::list_processes(LIST_TIMEOUT).await?;
    let snapshot = filter_snapshot(process::parse_process_output(&raw));
    tracing::debug!(count = snapshot.len(), "interesting apps detected");
    Ok(snapshot)
}

fn filter_snapshot(names: impl IntoIterator<Item = String>) -> AppSnapshot {
    names
        .into_iter()
        .filter(|name| rules::is_interesting_app(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_deduplicates_and_drops_uninteresting() {
        let names = vec![
            "Safari".to_string(),
            "Safari".to_string(),
            "kernel_task".to_string(),
            "cursor".to_string(),
        ];

        let snapshot = filter_snapshot(names);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("Safari"));
        assert!(snapshot.contains("cursor"));
    }

    #[test]
    fn snapshot_equality_ignores_enumeration_order() {
        let forward: AppSnapshot = ["Safari", "cursor", "Figma"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reversed: AppSnapshot = ["Figma", "cursor", "Safari"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(forward, reversed);
    }
}
