//! Status composition: turn the observed desktop state into a two-line
//! presence payload, preferring a model-written status and degrading to a
//! deterministic fallback whenever the remote path is unavailable.

mod credentials;
mod gemini;
mod payload;
mod prompt;

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub use payload::{fallback_status, StatusPayload, FIELD_LIMIT};

/// Minimum spacing between remote generation calls. Ticks inside the window
/// still produce a payload, just the fallback one.
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(2000);

/// Composes presence payloads from app and media observations.
///
/// The API key is resolved from the OS keychain on first use and cached for
/// the lifetime of the composer, including the "no key" outcome.
pub struct Composer {
    client: reqwest::Client,
    api_key: OnceCell<Option<String>>,
    last_call_at: Mutex<Option<Instant>>,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: OnceCell::new(),
            last_call_at: Mutex::new(None),
        }
    }

    /// Construct with a fixed key decision, skipping the keychain lookup.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: OnceCell::from(api_key),
            last_call_at: Mutex::new(None),
        }
    }

    /// Produce the payload for the current observations. Never fails: every
    /// degraded path collapses to [`fallback_status`].
    pub async fn compose(
        &self,
        apps: &BTreeSet<String>,
        media: Option<&str>,
    ) -> StatusPayload {
        let Some(api_key) = self.resolve_api_key().await else {
            return fallback_status(media);
        };

        if !self.call_permitted() {
            debug!("generation rate guard active, using fallback");
            return fallback_status(media);
        }

        let prompt = prompt::build_prompt(apps, media);
        match gemini::generate(&self.client, &api_key, &prompt).await {
            Ok(completion) => {
                self.mark_called();
                let (details, state) = prompt::parse_status_lines(&completion);
                StatusPayload::new(&details, &state, payload::SMALL_TEXT_AI)
            }
            Err(err) => {
                warn!(error = %err, "status generation failed, using fallback");
                fallback_status(media)
            }
        }
    }

    async fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .get_or_init(|| async {
                let key = credentials::api_key().await;
                if key.is_some() {
                    info!("API key loaded from the system keychain");
                } else {
                    warn!("no API key available, running in fallback mode");
                }
                key
            })
            .await
            .clone()
    }

    fn call_permitted(&self) -> bool {
        let last = *self.last_call_at.lock().unwrap_or_else(|e| e.into_inner());
        call_due(last, Instant::now())
    }

    fn mark_called(&self) {
        *self.last_call_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

fn call_due(last: Option<Instant>, now: Instant) -> bool {
    match last {
        Some(at) => now.duration_since(at) >= MIN_CALL_INTERVAL,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_always_due() {
        assert!(call_due(None, Instant::now()));
    }

    #[test]
    fn calls_inside_the_window_are_held() {
        let now = Instant::now();
        assert!(!call_due(Some(now), now + Duration::from_millis(500)));
    }

    #[test]
    fn calls_past_the_window_are_due() {
        let now = Instant::now();
        assert!(call_due(Some(now), now + MIN_CALL_INTERVAL));
    }

    #[tokio::test]
    async fn rate_guarded_compose_falls_back_without_a_call() {
        let composer = Composer::with_api_key(Some("test-key".to_string()));
        *composer.last_call_at.lock().unwrap() = Some(Instant::now());

        let apps: BTreeSet<String> = ["Cursor".to_string()].into_iter().collect();
        let payload = composer.compose(&apps, None).await;

        assert_eq!(payload.state, "LLM temporarily unavailable");
        assert_eq!(payload.small_image_text, "Fallback Mode");
    }

    #[tokio::test]
    async fn composer_without_a_key_falls_back() {
        let composer = Composer::with_api_key(None);
        let apps: BTreeSet<String> = ["Cursor".to_string()].into_iter().collect();
        let payload = composer.compose(&apps, Some("Song by Artist on Spotify")).await;
        assert_eq!(payload.state, "♪ Song by Artist on Spotify");
        assert_eq!(payload.small_image_text, "Fallback Mode");
    }
}
