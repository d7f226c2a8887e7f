//! Rich Presence channel over the local Discord IPC socket.
//!
//! The channel holds at most one connection. Connecting is explicit, loss is
//! observable through [`PresenceSink::wait_disconnect`], and the caller owns
//! the reconnect policy.

use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use discord_sdk::{
    activity::{ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use fusion_compose::StatusPayload;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// Misconfiguration that no amount of retrying can fix.
    #[error("invalid application id: {0}")]
    Login(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    #[error("not connected")]
    NotConnected,
    #[error("activity update failed: {0}")]
    Publish(String),
}

impl PresenceError {
    /// Fatal errors should abort the daemon instead of feeding the
    /// reconnect loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PresenceError::Login(_))
    }
}

/// Destination for status payloads.
#[async_trait]
pub trait PresenceSink: Send {
    async fn connect(&mut self) -> Result<(), PresenceError>;
    async fn publish(&mut self, payload: &StatusPayload) -> Result<(), PresenceError>;
    /// Resolves when the current connection drops. Pends forever while
    /// disconnected so it can sit in a select arm.
    async fn wait_disconnect(&mut self);
    fn is_connected(&self) -> bool;
    async fn close(&mut self);
}

struct Connected {
    discord: Discord,
    user_events: watch::Receiver<UserState>,
}

/// Live channel to the local Discord client.
pub struct PresenceChannel {
    app_id: i64,
    client: Option<Connected>,
}

impl PresenceChannel {
    /// Validates the application id up front; a malformed id is fatal.
    pub fn new(app_id: &str) -> Result<Self, PresenceError> {
        Ok(Self {
            app_id: validate_app_id(app_id)?,
            client: None,
        })
    }
}

#[async_trait]
impl PresenceSink for PresenceChannel {
    async fn connect(&mut self) -> Result<(), PresenceError> {
        if self.client.is_some() {
            return Ok(());
        }

        let (wheel, handler) = Wheel::new(Box::new(|err| {
            warn!(error = ?err, "discord event error");
        }));
        let mut user_events = wheel.user().0;

        let discord = Discord::new(self.app_id, Subscriptions::ACTIVITY, Box::new(handler))
            .map_err(|err| PresenceError::Connect(format!("{err:?}")))?;

        let handshake = timeout(HANDSHAKE_TIMEOUT, async {
            if user_events.changed().await.is_err() {
                return Err(PresenceError::Connect("event stream closed".to_string()));
            }
            match &*user_events.borrow() {
                UserState::Connected(user) => Ok(user.clone()),
                UserState::Disconnected(err) => {
                    Err(PresenceError::Connect(format!("{err:?}")))
                }
            }
        })
        .await;

        let user = match handshake {
            Ok(Ok(user)) => user,
            Ok(Err(err)) => {
                discord.disconnect().await;
                return Err(err);
            }
            Err(_) => {
                discord.disconnect().await;
                return Err(PresenceError::HandshakeTimeout(HANDSHAKE_TIMEOUT));
            }
        };

        info!(user = %user.username, "rich presence connected");
        self.client = Some(Connected {
            discord,
            user_events,
        });
        Ok(())
    }

    async fn publish(&mut self, payload: &StatusPayload) -> Result<(), PresenceError> {
        let connected = self.client.as_mut().ok_or(PresenceError::NotConnected)?;

        let start = UNIX_EPOCH + Duration::from_millis(payload.start_timestamp.max(0) as u64);
        let activity = ActivityBuilder::new()
            .details(payload.details.clone())
            .state(payload.state.clone())
            .assets(
                Assets::default()
                    .large(
                        payload.large_image_key.clone(),
                        Some(payload.large_image_text.clone()),
                    )
                    .small(
                        payload.small_image_key.clone(),
                        Some(payload.small_image_text.clone()),
                    ),
            )
            .start_timestamp(start);

        connected
            .discord
            .update_activity(activity)
            .await
            .map_err(|err| PresenceError::Publish(format!("{err:?}")))?;
        debug!(details = %payload.details, "activity published");
        Ok(())
    }

    async fn wait_disconnect(&mut self) {
        {
            let Some(connected) = self.client.as_mut() else {
                return std::future::pending::<()>().await;
            };
            loop {
                if connected.user_events.changed().await.is_err() {
                    break;
                }
                if matches!(&*connected.user_events.borrow(), UserState::Disconnected(_)) {
                    break;
                }
            }
        }
        self.client = None;
        warn!("rich presence connection lost");
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn close(&mut self) {
        if let Some(connected) = self.client.take() {
            if let Err(err) = connected.discord.clear_activity().await {
                debug!(error = ?err, "could not clear activity on shutdown");
            }
            connected.discord.disconnect().await;
            info!("rich presence closed");
        }
    }
}

/// Application ids are snowflakes: 17 to 19 ASCII digits.
fn validate_app_id(raw: &str) -> Result<i64, PresenceError> {
    let trimmed = raw.trim();
    let digits_only = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || !(17..=19).contains(&trimmed.len()) {
        return Err(PresenceError::Login(format!(
            "expected a 17-19 digit id, got {raw:?}"
        )));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| PresenceError::Login(format!("id out of range: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_snowflakes() {
        assert_eq!(validate_app_id("12345678901234567").unwrap(), 12345678901234567);
        assert!(validate_app_id(" 1234567890123456789 ").is_ok());
    }

    #[test]
    fn rejects_short_long_and_non_numeric_ids() {
        assert!(validate_app_id("1234567890123456").is_err());
        assert!(validate_app_id("12345678901234567890").is_err());
        assert!(validate_app_id("12345678901234abc").is_err());
        assert!(validate_app_id("").is_err());
    }

    #[test]
    fn malformed_id_is_fatal() {
        let err = validate_app_id("nope").unwrap_err();
        assert!(err.is_fatal());
        assert!(!PresenceError::NotConnected.is_fatal());
    }
}
