//! Now-playing detection for desktop media players.
//!
//! Players are queried in a fixed order and the first active track wins.
//! A missing or erroring player is not an application error; every failure
//! path collapses to `None`.

mod players;

use async_trait::async_trait;

/// Source of the current now-playing description.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// `None` when nothing is playing or the query mechanism itself fails.
    async fn current_media(&self) -> Option<String>;
}

/// Live implementation backed by the OS scripting bridge.
#[derive(Debug, Default)]
pub struct SystemMedia;

#[async_trait]
impl MediaSource for SystemMedia {
    async fn current_media(&self) -> Option<String> {
        current_media().await
    }
}

/// Query the supported players in order and return the first active track
/// as a `"<track> by <artist> on <Player>"` line.
pub async fn current_media() -> Option<String> {
    if let Some(track) = players::apple_music().await {
        return Some(track);
    }
    players::spotify().await
}
