//! Daemon configuration from the environment.

use std::time::Duration;

use tracing::warn;

const CLIENT_ID_VAR: &str = "DISCORD_CLIENT_ID";
const UPDATE_INTERVAL_VAR: &str = "FUSION_UPDATE_INTERVAL_MS";
const FORCE_REFRESH_VAR: &str = "FUSION_FORCE_REFRESH_MS";

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(30_000);
const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(5_000);
const DEFAULT_FORCE_REFRESH: Duration = Duration::from_millis(300_000);
const MIN_FORCE_REFRESH: Duration = Duration::from_millis(60_000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{CLIENT_ID_VAR} is not set")]
    MissingClientId,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_client_id: String,
    pub update_interval: Duration,
    pub force_refresh_interval: Duration,
}

impl Config {
    /// Read configuration from the environment. Only the client id is
    /// required; malformed intervals fall back to their defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let discord_client_id = std::env::var(CLIENT_ID_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingClientId)?;

        Ok(Self {
            discord_client_id,
            update_interval: env_ms(UPDATE_INTERVAL_VAR, DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL),
            force_refresh_interval: env_ms(FORCE_REFRESH_VAR, DEFAULT_FORCE_REFRESH, MIN_FORCE_REFRESH),
        })
    }
}

fn env_ms(var: &str, default: Duration, floor: Duration) -> Duration {
    match std::env::var(var) {
        Ok(raw) => parse_ms(var, &raw, default, floor),
        Err(_) => default,
    }
}

fn parse_ms(var: &str, raw: &str, default: Duration, floor: Duration) -> Duration {
    match raw.trim().parse::<u64>() {
        Ok(ms) => {
            let parsed = Duration::from_millis(ms);
            if parsed < floor {
                warn!(%var, value = ms, floor_ms = floor.as_millis() as u64, "interval below floor, clamping");
                floor
            } else {
                parsed
            }
        }
        Err(_) => {
            warn!(%var, value = raw, "unparseable interval, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_millis_are_accepted() {
        let d = parse_ms("X", "45000", DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL);
        assert_eq!(d, Duration::from_millis(45_000));
    }

    #[test]
    fn values_below_the_floor_are_clamped() {
        let d = parse_ms("X", "100", DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL);
        assert_eq!(d, MIN_UPDATE_INTERVAL);
    }

    #[test]
    fn garbage_falls_back_to_the_default() {
        let d = parse_ms("X", "soon", DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL);
        assert_eq!(d, DEFAULT_UPDATE_INTERVAL);
        let d = parse_ms("X", "-5", DEFAULT_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL);
        assert_eq!(d, DEFAULT_UPDATE_INTERVAL);
    }
}
