//! Status payload pushed to the presence channel.

use serde::Serialize;

/// Hard per-field limit imposed by the presence service.
pub const FIELD_LIMIT: usize = 128;

pub(crate) const PRODUCT_NAME: &str = "Discord Status Fusion";
pub(crate) const UNAVAILABLE_STATE: &str = "LLM temporarily unavailable";
pub(crate) const LARGE_IMAGE_KEY: &str = "fusion_idle";
pub(crate) const SMALL_IMAGE_KEY: &str = "active";
pub(crate) const SMALL_TEXT_AI: &str = "AI-Generated";
pub(crate) const SMALL_TEXT_FALLBACK: &str = "Fallback Mode";

/// One status update: two display lines plus image metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub details: String,
    pub state: String,
    pub large_image_key: String,
    pub large_image_text: String,
    pub small_image_key: String,
    pub small_image_text: String,
    /// Epoch millis marking when this payload became active.
    pub start_timestamp: i64,
}

impl StatusPayload {
    pub(crate) fn new(details: &str, state: &str, small_image_text: &str) -> Self {
        Self {
            details: truncate(details, FIELD_LIMIT),
            state: truncate(state, FIELD_LIMIT),
            large_image_key: LARGE_IMAGE_KEY.to_string(),
            large_image_text: PRODUCT_NAME.to_string(),
            small_image_key: SMALL_IMAGE_KEY.to_string(),
            small_image_text: small_image_text.to_string(),
            start_timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Deterministic status used whenever the remote generation path is
/// unavailable, rate-limited, or erroring. Pure: no I/O, never fails.
pub fn fallback_status(media: Option<&str>) -> StatusPayload {
    let state = match media {
        Some(track) => format!("♪ {track}"),
        None => UNAVAILABLE_STATE.to_string(),
    };
    StatusPayload::new(PRODUCT_NAME, &state, SMALL_TEXT_FALLBACK)
}

/// Truncate to `max` characters, replacing the tail with an ellipsis marker
/// so the result sits exactly at the limit.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("Working", FIELD_LIMIT), "Working");
    }

    #[test]
    fn long_text_is_cut_to_exactly_the_limit() {
        let long = "x".repeat(200);
        let cut = truncate(&long, FIELD_LIMIT);
        assert_eq!(cut.chars().count(), FIELD_LIMIT);
        assert_eq!(cut, format!("{}...", "x".repeat(FIELD_LIMIT - 3)));
    }

    #[test]
    fn text_at_the_limit_is_untouched() {
        let exact = "y".repeat(FIELD_LIMIT);
        assert_eq!(truncate(&exact, FIELD_LIMIT), exact);
    }

    #[test]
    fn fallback_without_media_reports_unavailable() {
        let payload = fallback_status(None);
        assert_eq!(payload.details, PRODUCT_NAME);
        assert!(payload.state.contains("temporarily unavailable"));
        assert_eq!(payload.small_image_text, SMALL_TEXT_FALLBACK);
        assert_eq!(payload.large_image_key, LARGE_IMAGE_KEY);
    }

    #[test]
    fn fallback_with_media_shows_the_track() {
        let payload = fallback_status(Some("Song by Artist on Spotify"));
        assert_eq!(payload.state, "♪ Song by Artist on Spotify");
    }

    #[test]
    fn payload_fields_never_exceed_the_limit() {
        let long = "z".repeat(500);
        let payload = StatusPayload::new(&long, &long, SMALL_TEXT_AI);
        assert!(payload.details.chars().count() <= FIELD_LIMIT);
        assert!(payload.state.chars().count() <= FIELD_LIMIT);
    }
}
