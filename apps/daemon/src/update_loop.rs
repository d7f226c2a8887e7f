//! The polling core: observe, decide, publish.
//!
//! Every tick reads both sources and publishes only when the observed state
//! changed or the forced-refresh window elapsed. Cached state moves forward
//! only after a successful publish, so a failed push is retried naturally on
//! the next tick.

use std::time::Duration;

use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fusion_compose::Composer;
use fusion_detect::{AppSnapshot, AppSource};
use fusion_media::MediaSource;
use fusion_presence::PresenceSink;

use crate::backoff::Reconnect;

enum LoopEvent {
    Tick,
    ChannelDropped,
    ReconnectDue,
    Shutdown,
}

pub struct UpdateLoop<A, M, S> {
    apps: A,
    media: M,
    composer: Composer,
    sink: S,
    update_interval: Duration,
    force_refresh_interval: Duration,
    last_apps: Option<AppSnapshot>,
    last_media: Option<Option<String>>,
    last_force_refresh_at: Instant,
    in_flight: bool,
}

impl<A, M, S> UpdateLoop<A, M, S>
where
    A: AppSource,
    M: MediaSource,
    S: PresenceSink,
{
    pub fn new(
        apps: A,
        media: M,
        composer: Composer,
        sink: S,
        update_interval: Duration,
        force_refresh_interval: Duration,
    ) -> Self {
        Self {
            apps,
            media,
            composer,
            sink,
            update_interval,
            force_refresh_interval,
            last_apps: None,
            last_media: None,
            last_force_refresh_at: Instant::now(),
            in_flight: false,
        }
    }

    /// Run until the token is cancelled. The sink must already be
    /// connected; lost connections are retried here with backoff.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut timer = interval(self.update_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut schedule = Reconnect::new();
        let mut reconnect_at: Option<Instant> = None;

        info!(
            interval_ms = self.update_interval.as_millis() as u64,
            force_refresh_ms = self.force_refresh_interval.as_millis() as u64,
            "update loop running"
        );

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => LoopEvent::Shutdown,
                _ = timer.tick() => LoopEvent::Tick,
                _ = self.sink.wait_disconnect() => LoopEvent::ChannelDropped,
                _ = reconnect_wait(reconnect_at) => LoopEvent::ReconnectDue,
            };

            match event {
                LoopEvent::Tick => self.run_tick().await,
                LoopEvent::ChannelDropped => {
                    schedule = Reconnect::new();
                    reconnect_at = schedule.next_delay().map(|delay| Instant::now() + delay);
                }
                LoopEvent::ReconnectDue => {
                    reconnect_at = None;
                    match self.sink.connect().await {
                        Ok(()) => {
                            schedule.reset();
                            info!("presence connection restored");
                        }
                        Err(err) if err.is_fatal() => {
                            error!(error = %err, "presence channel unusable, not retrying");
                        }
                        Err(err) => match schedule.next_delay() {
                            Some(delay) => {
                                warn!(error = %err, delay_ms = delay.as_millis() as u64, "reconnect failed, retrying");
                                reconnect_at = Some(Instant::now() + delay);
                            }
                            None => {
                                error!(error = %err, "reconnect attempts exhausted, presence stays offline");
                            }
                        },
                    }
                }
                LoopEvent::Shutdown => break,
            }
        }

        self.sink.close().await;
        info!("update loop stopped");
    }

    /// One timer fire. A fire that lands while a tick body is still in
    /// flight is a logged no-op.
    async fn run_tick(&mut self) {
        if self.in_flight {
            debug!("tick skipped, previous tick still in flight");
            return;
        }
        self.in_flight = true;
        self.tick().await;
        self.in_flight = false;
    }

    async fn tick(&mut self) {
        let (apps, media) = tokio::join!(self.apps.interesting_apps(), self.media.current_media());
        let apps = apps.unwrap_or_else(|err| {
            warn!(error = %err, "app detection failed, treating as empty");
            AppSnapshot::new()
        });

        let changed = self.last_apps.as_ref() != Some(&apps)
            || self.last_media.as_ref() != Some(&media);
        let force_due =
            self.last_force_refresh_at.elapsed() >= self.force_refresh_interval;

        if !changed && !force_due {
            debug!("state unchanged, nothing to publish");
            return;
        }

        if !self.sink.is_connected() {
            debug!("presence channel offline, skipping publish");
            return;
        }

        let payload = self.composer.compose(&apps, media.as_deref()).await;
        match self.sink.publish(&payload).await {
            Ok(()) => {
                info!(details = %payload.details, state = %payload.state, "status published");
                self.last_apps = Some(apps);
                self.last_media = Some(media);
                if force_due {
                    self.last_force_refresh_at = Instant::now();
                }
            }
            Err(err) => {
                warn!(error = %err, "publish failed, will retry on the next tick");
            }
        }
    }
}

async fn reconnect_wait(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
