//! Per-player AppleScript queries.
//!
//! Each query is one `osascript` invocation with an argument vector; the
//! script returns a single descriptive line when the player is actively
//! playing and nothing otherwise.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

const APPLE_MUSIC_SUFFIX: &str = " on Apple Music";

const APPLE_MUSIC_SCRIPT: &str = r#"
tell application "Music"
    if player state is playing then
        set trackName to name of current track
        set artistName to artist of current track
        return trackName & " by " & artistName & " on Apple Music"
    end if
end tell
"#;

const SPOTIFY_SCRIPT: &str = r#"
tell application "Spotify"
    if player state is playing then
        set trackName to name of current track
        set artistName to artist of current track
        return trackName & " by " & artistName & " on Spotify"
    end if
end tell
"#;

pub(crate) async fn apple_music() -> Option<String> {
    let track = run_osascript(APPLE_MUSIC_SCRIPT).await?;
    Some(ensure_suffix(track, APPLE_MUSIC_SUFFIX))
}

pub(crate) async fn spotify() -> Option<String> {
    run_osascript(SPOTIFY_SCRIPT).await
}

/// Some Music versions return the bare track line; normalize the format.
fn ensure_suffix(track: String, suffix: &str) -> String {
    if track.contains(suffix) {
        track
    } else {
        format!("{track}{suffix}")
    }
}

async fn run_osascript(script: &str) -> Option<String> {
    let mut cmd = Command::new("osascript");
    cmd.args(["-e", script]).kill_on_drop(true);

    let output = match timeout(QUERY_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            debug!(error = %err, "osascript invocation failed");
            return None;
        }
        Err(_) => {
            debug!("osascript query timed out");
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let line = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_missing_player_suffix() {
        assert_eq!(
            ensure_suffix("Song by Artist".to_string(), APPLE_MUSIC_SUFFIX),
            "Song by Artist on Apple Music"
        );
    }

    #[test]
    fn keeps_existing_player_suffix() {
        assert_eq!(
            ensure_suffix("Song by Artist on Apple Music".to_string(), APPLE_MUSIC_SUFFIX),
            "Song by Artist on Apple Music"
        );
    }
}
