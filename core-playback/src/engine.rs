//! # Playback Engine
//!
//! Drives a host [`AudioTransport`] through a station's stream sources:
//!
//! 1. direct playback of the resolved URL (or the origin URL)
//! 2. on failure, a health probe of that URL
//! 3. when the origin is healthy, playback through the relay backend
//! 4. on a final failure, one deferred automatic retry
//!
//! All mutable state lives in a single [`PlaybackSession`] behind a mutex
//! that is never held across an `.await`. Every operation that touches the
//! transport takes a new epoch; a call that finds the epoch moved on returns
//! [`PlaybackError::Superseded`] and leaves the session alone.
//!
//! Deferred work (the auto-retry, media-key actions) is sent as a
//! command to a driver task spawned at build time.

use bridge_traits::audio::{AudioTransport, TransportEvent, TransportListener};
use bridge_traits::media_session::{ActionHandler, MediaPlaybackState, MediaSessionHost};
use bridge_traits::Station;
use core_runtime::events::{CoreEvent, EventBus, EventStream, Notification, PlaybackEvent};
use core_stream::StreamHealthCheck;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::EngineConfig;
use crate::error::{ErrorInfo, PlaybackError, Result};
use crate::media_session::{MediaHandlers, MediaSessionAdapter};
use crate::relay_client::RelayEndpoint;
use crate::session::{PlaybackSession, PlaybackState, SessionSnapshot, SourceMode};

/// Work queued for the engine's driver task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineCommand {
    /// Runs only if no operation took an epoch since `armed_epoch`.
    AutoRetry { armed_epoch: u64 },
    TogglePlayPause,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryOrigin {
    /// User action; restores the auto-retry allowance.
    Manual,
    /// Fired by the retry timer.
    Auto { armed_epoch: u64 },
}

// ============================================================================
// Builder
// ============================================================================

pub struct PlaybackEngineBuilder {
    config: EngineConfig,
    transport: Arc<dyn AudioTransport>,
    health: Arc<dyn StreamHealthCheck>,
    media_host: Option<Arc<dyn MediaSessionHost>>,
    events: Option<EventBus>,
}

impl PlaybackEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn media_session(mut self, host: Arc<dyn MediaSessionHost>) -> Self {
        self.media_host = Some(host);
        self
    }

    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the engine. Must be called inside a Tokio runtime.
    pub fn build(self) -> Result<PlaybackEngine> {
        self.config.validate().map_err(PlaybackError::InvalidConfig)?;

        let runtime = Handle::try_current().map_err(|_| {
            PlaybackError::InvalidConfig(
                "the playback engine must be built inside a Tokio runtime".to_string(),
            )
        })?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let volume = self.config.default_volume;
        let media = MediaSessionAdapter::new(
            self.media_host,
            self.config.app_name.clone(),
            self.config.fallback_artwork.clone(),
        );

        let inner = Arc::new(EngineInner {
            relay: RelayEndpoint::new(self.config.relay_base.clone()),
            session: Mutex::new(PlaybackSession::idle(runtime.clone(), volume, false)),
            config: self.config,
            transport: self.transport,
            health: self.health,
            media,
            events: self.events.unwrap_or_default(),
            epoch: AtomicU64::new(0),
            runtime: runtime.clone(),
            commands,
        });

        runtime.spawn(drive(Arc::downgrade(&inner), receiver));

        let weak = Arc::downgrade(&inner);
        let listener: TransportListener = Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                PlaybackEngine { inner }.on_transport_event(event);
            }
        });
        inner.transport.on_event(listener);

        if let Err(e) = inner.transport.set_volume(f32::from(volume) / 100.0) {
            warn!(error = %e, "Failed to apply initial volume");
        }

        Ok(PlaybackEngine { inner })
    }
}

async fn drive(engine: Weak<EngineInner>, mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
    while let Some(command) = commands.recv().await {
        let Some(inner) = engine.upgrade() else {
            break;
        };
        let engine = PlaybackEngine { inner };
        tokio::spawn(async move { engine.handle_command(command).await });
    }
    debug!("Playback engine driver stopped");
}

// ============================================================================
// Engine
// ============================================================================

struct EngineInner {
    config: EngineConfig,
    transport: Arc<dyn AudioTransport>,
    health: Arc<dyn StreamHealthCheck>,
    media: MediaSessionAdapter,
    relay: RelayEndpoint,
    events: EventBus,
    session: Mutex<PlaybackSession>,
    epoch: AtomicU64,
    runtime: Handle,
    commands: mpsc::UnboundedSender<EngineCommand>,
}

/// Cheaply cloneable handle to the playback engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl PlaybackEngine {
    pub fn builder(
        transport: Arc<dyn AudioTransport>,
        health: Arc<dyn StreamHealthCheck>,
    ) -> PlaybackEngineBuilder {
        PlaybackEngineBuilder {
            config: EngineConfig::default(),
            transport,
            health,
            media_host: None,
            events: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().snapshot()
    }

    /// Engine events (`CoreEvent::Playback` and `CoreEvent::Notification`).
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    /// Select `station` and start it.
    ///
    /// Returns the session once audio plays, or the error the session ended
    /// in. A failed attempt may leave an automatic retry armed.
    #[instrument(skip(self, station), fields(station_id = %station.id))]
    pub async fn play(&self, station: Station) -> Result<SessionSnapshot> {
        let epoch = self.begin();

        let Some(url) = station.primary_url() else {
            let error = PlaybackError::NoStreamUrl(station.id.clone());
            let station_id = station.id.clone();
            let (had_station, was_live) = self.with_current(epoch, |session| {
                let had_station = session.station.is_some();
                let was_live = had_station
                    && matches!(
                        session.state,
                        PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
                    );
                let mut next = PlaybackSession::succeed(session, self.inner.runtime.clone(), station);
                next.state = PlaybackState::Error;
                next.last_error = Some(ErrorInfo::from(&error));
                *session = next;
                (had_station, was_live)
            })?;
            warn!("Station has no stream URL");

            // The previous station must not keep playing behind the error.
            if was_live {
                if let Err(e) = self.inner.transport.unload().await {
                    warn!(error = %e, "Failed to unload previous station");
                }
                self.ensure_current(epoch)?;
            }
            if had_station {
                self.inner.media.clear();
            }

            self.emit(PlaybackEvent::Error {
                station_id: Some(station_id),
                message: error.to_string(),
                recoverable: false,
            });
            self.notify(Notification::error(
                "Stream Error",
                "This station doesn't have a valid stream URL",
            ));
            return Err(error);
        };

        let max_retries = self.inner.config.max_auto_retries;
        self.with_current(epoch, |session| {
            let mut next = PlaybackSession::succeed(session, self.inner.runtime.clone(), station);
            next.auto_retries_remaining = max_retries;
            *session = next;
        })?;

        self.attempt(epoch, url).await
    }

    /// Replay the current station, preferring the URL not tried last time.
    #[instrument(skip(self))]
    pub async fn retry(&self) -> Result<SessionSnapshot> {
        self.retry_with(RetryOrigin::Manual).await
    }

    /// Pause without tearing the session down.
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<SessionSnapshot> {
        let epoch = self.begin();

        let (previous, station_id) = self.with_current(epoch, |session| {
            session.retry.cancel();
            let station_id = session.station.as_ref().map(|s| s.id.clone());
            let previous = session.state;
            if station_id.is_some() && previous != PlaybackState::Error {
                session.state = PlaybackState::Paused;
                session.attempt_in_flight = false;
            }
            (previous, station_id)
        })?;

        let Some(station_id) = station_id else {
            return Err(PlaybackError::NoStationLoaded);
        };
        if previous == PlaybackState::Error {
            // Nothing is playing; pausing only drops the pending retry.
            return Ok(self.snapshot());
        }

        if let Err(e) = self.inner.transport.pause().await {
            self.with_current(epoch, |session| session.state = previous)?;
            return Err(e.into());
        }
        self.ensure_current(epoch)?;

        self.inner.media.clear();
        if previous != PlaybackState::Paused {
            self.emit(PlaybackEvent::Paused { station_id });
        }
        Ok(self.snapshot())
    }

    /// Continue a paused station without reloading it.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<SessionSnapshot> {
        let epoch = self.begin();
        let (state, station) = self.with_current(epoch, |session| {
            if session.state == PlaybackState::Paused {
                session.attempt_in_flight = true;
            }
            (session.state, session.station.clone())
        })?;
        let station = station.ok_or(PlaybackError::NoStationLoaded)?;

        match state {
            PlaybackState::Paused => {}
            PlaybackState::Error => return self.retry().await,
            _ => return Ok(self.snapshot()),
        }

        let resumed = self.inner.transport.play().await;
        self.ensure_current(epoch)?;

        match resumed {
            Ok(()) => {
                let max_retries = self.inner.config.max_auto_retries;
                let snapshot = self.with_current(epoch, |session| {
                    session.state = PlaybackState::Playing;
                    session.attempt_in_flight = false;
                    session.last_error = None;
                    session.auto_retries_remaining = max_retries;
                    session.snapshot()
                })?;
                self.inner.media.publish(&station, self.media_handlers());
                self.emit(PlaybackEvent::Resumed {
                    station_id: station.id.clone(),
                });
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Failed to resume playback");
                let error = PlaybackError::PlaybackFailed("Failed to resume playback".to_string());
                self.with_current(epoch, |session| {
                    session.state = PlaybackState::Error;
                    session.attempt_in_flight = false;
                    session.last_error = Some(ErrorInfo::from(&error));
                })?;
                self.emit(PlaybackEvent::Error {
                    station_id: Some(station.id.clone()),
                    message: error.to_string(),
                    recoverable: false,
                });
                self.notify(Notification::error("Playback Error", "Could not resume playback"));
                Err(error)
            }
        }
    }

    /// `Playing`/`Loading` pause, `Paused` resumes, `Error` retries.
    pub async fn toggle_play_pause(&self) -> Result<SessionSnapshot> {
        let state = self.inner.session.lock().state;
        match state {
            PlaybackState::Playing | PlaybackState::Loading => self.pause().await,
            PlaybackState::Paused => self.resume().await,
            PlaybackState::Error => self.retry().await,
            PlaybackState::Idle => Err(PlaybackError::NoStationLoaded),
        }
    }

    /// Cancel everything, unload the transport and go back to `Idle`.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let epoch = self.begin();
        self.with_current(epoch, |session| {
            session.retry.cancel();
            *session = PlaybackSession::idle(self.inner.runtime.clone(), session.volume, session.muted);
        })?;

        if let Err(e) = self.inner.transport.unload().await {
            warn!(error = %e, "Failed to unload transport");
        }

        self.inner.media.clear();
        self.emit(PlaybackEvent::Stopped);
        Ok(())
    }

    /// Set the stored volume, clamped to `0..=100`. Returns the stored value.
    pub fn set_volume(&self, level: i32) -> Result<u8> {
        let volume = level.clamp(0, 100) as u8;
        let (effective, muted) = {
            let mut session = self.inner.session.lock();
            session.volume = volume;
            (session.effective_volume(), session.muted)
        };
        self.apply_volume(effective)?;
        self.emit(PlaybackEvent::VolumeChanged { volume, muted });
        Ok(volume)
    }

    /// Flip the mute overlay. Returns the new mute flag.
    pub fn toggle_mute(&self) -> Result<bool> {
        let (effective, volume, muted) = {
            let mut session = self.inner.session.lock();
            session.muted = !session.muted;
            (session.effective_volume(), session.volume, session.muted)
        };
        self.apply_volume(effective)?;
        self.emit(PlaybackEvent::VolumeChanged { volume, muted });
        Ok(muted)
    }

    // ------------------------------------------------------------------------
    // Attempts
    // ------------------------------------------------------------------------

    async fn retry_with(&self, origin: RetryOrigin) -> Result<SessionSnapshot> {
        let epoch = match origin {
            RetryOrigin::Manual => self.begin(),
            RetryOrigin::Auto { armed_epoch } => self.begin_after(armed_epoch).ok_or_else(|| {
                debug!("Dropping auto-retry, a newer operation took over");
                PlaybackError::Superseded
            })?,
        };
        let max_retries = self.inner.config.max_auto_retries;

        let url = self.with_current(epoch, |session| -> Result<String> {
            session.retry.cancel();
            let station = session.station.clone().ok_or(PlaybackError::NoStationLoaded)?;

            let candidates = station.stream_candidates();
            let last = session.last_direct_url.clone();
            let url = candidates
                .iter()
                .find(|candidate| Some(candidate.as_str()) != last.as_deref())
                .or_else(|| candidates.first())
                .cloned()
                .ok_or_else(|| PlaybackError::NoStreamUrl(station.id.clone()))?;

            let budget = match origin {
                RetryOrigin::Manual => max_retries,
                RetryOrigin::Auto { .. } => session.auto_retries_remaining,
            };
            let mut next = PlaybackSession::succeed(session, self.inner.runtime.clone(), station);
            next.auto_retries_remaining = budget;
            next.last_direct_url = last;
            *session = next;
            Ok(url)
        })??;

        self.attempt(epoch, url).await
    }

    /// Direct, then probe, then relay.
    async fn attempt(&self, epoch: u64, url: String) -> Result<SessionSnapshot> {
        let station = self
            .with_current(epoch, |session| {
                session.state = PlaybackState::Loading;
                session.attempt_in_flight = true;
                session.source_mode = SourceMode::Direct;
                session.active_url = Some(url.clone());
                session.last_direct_url = Some(url.clone());
                session.last_error = None;
                session.station.clone()
            })?
            .ok_or(PlaybackError::NoStationLoaded)?;

        self.emit(PlaybackEvent::Loading {
            station_id: station.id.clone(),
            source_mode: SourceMode::Direct.as_str().to_string(),
        });

        let direct = self.start_source(&url).await;
        self.ensure_current(epoch)?;
        match direct {
            Ok(()) => return self.commit_playing(epoch, &station, SourceMode::Direct),
            Err(e) => {
                info!(station_id = %station.id, error = %e, "Direct playback failed, probing origin")
            }
        }

        let health = self.inner.health.check(&station.id, &url).await;
        self.ensure_current(epoch)?;
        if !health.healthy() {
            return Err(self.fail(epoch, PlaybackError::StreamUnreachable(health.message)));
        }

        let proxied = self.inner.relay.stream_url(&station.id, &url);
        self.with_current(epoch, |session| {
            session.source_mode = SourceMode::Proxied;
            session.active_url = Some(proxied.clone());
        })?;
        self.emit(PlaybackEvent::Loading {
            station_id: station.id.clone(),
            source_mode: SourceMode::Proxied.as_str().to_string(),
        });

        let relayed = self.start_source(&proxied).await;
        self.ensure_current(epoch)?;
        match relayed {
            Ok(()) => self.commit_playing(epoch, &station, SourceMode::Proxied),
            Err(e) => Err(self.fail(
                epoch,
                PlaybackError::PlaybackFailed(format!("Relayed playback failed: {}", e)),
            )),
        }
    }

    /// `load` + `play`, bounded by the start timeout.
    async fn start_source(&self, url: &str) -> Result<()> {
        let transport = &self.inner.transport;
        let limit = self.inner.config.start_timeout;

        let started = tokio::time::timeout(limit, async {
            transport.load(url).await?;
            transport.play().await
        })
        .await;

        match started {
            Ok(result) => result.map_err(PlaybackError::from),
            Err(_) => Err(PlaybackError::PlaybackFailed(format!(
                "Timed out starting playback after {}ms",
                limit.as_millis()
            ))),
        }
    }

    fn commit_playing(
        &self,
        epoch: u64,
        station: &Station,
        mode: SourceMode,
    ) -> Result<SessionSnapshot> {
        let max_retries = self.inner.config.max_auto_retries;
        let snapshot = self.with_current(epoch, |session| {
            session.state = PlaybackState::Playing;
            session.source_mode = mode;
            session.attempt_in_flight = false;
            session.last_error = None;
            // A stream that plays again may drop again later.
            session.auto_retries_remaining = max_retries;
            session.snapshot()
        })?;

        info!(station_id = %station.id, source_mode = mode.as_str(), "Playback started");
        self.inner.media.publish(station, self.media_handlers());
        self.emit(PlaybackEvent::Started {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            source_mode: mode.as_str().to_string(),
        });
        self.notify(Notification::info("Now Playing", station.name.clone()));
        Ok(snapshot)
    }

    /// Record a failed attempt and arm the auto-retry.
    fn fail(&self, epoch: u64, error: PlaybackError) -> PlaybackError {
        let outcome = self.with_current(epoch, |session| {
            session.state = PlaybackState::Error;
            session.attempt_in_flight = false;
            session.last_error = Some(ErrorInfo::from(&error));
            let armed = self.arm_retry(session);
            (session.station.as_ref().map(|s| s.id.clone()), armed)
        });

        let (station_id, armed) = match outcome {
            Ok(outcome) => outcome,
            Err(superseded) => return superseded,
        };

        warn!(error = %error, retry_armed = armed, "Playback attempt failed");
        self.emit(PlaybackEvent::Error {
            station_id: station_id.clone(),
            message: error.to_string(),
            recoverable: armed,
        });
        if let (Some(station_id), true) = (station_id, armed) {
            self.emit(PlaybackEvent::RetryScheduled {
                station_id,
                delay_ms: self.inner.config.retry_delay.as_millis() as u64,
            });
        }
        self.notify(Notification::error(
            "Playback Error",
            "Could not start playback. The station may be offline.",
        ));
        error
    }

    /// Arm the session's retry timer if the allowance permits.
    fn arm_retry(&self, session: &mut PlaybackSession) -> bool {
        if session.auto_retries_remaining == 0 || session.retry.is_pending() {
            return false;
        }

        let commands = self.inner.commands.clone();
        let armed_epoch = self.inner.epoch.load(Ordering::SeqCst);
        let armed = session.retry.arm(self.inner.config.retry_delay, async move {
            let _ = commands.send(EngineCommand::AutoRetry { armed_epoch });
        });
        if armed {
            session.auto_retries_remaining -= 1;
        }
        armed
    }

    // ------------------------------------------------------------------------
    // Transport events
    // ------------------------------------------------------------------------

    fn on_transport_event(&self, event: TransportEvent) {
        let mut emitted = Vec::new();
        let mut media_state = None;
        let mut republish = None;

        {
            let mut session = self.inner.session.lock();
            if session.attempt_in_flight {
                trace!(%event, "Transport event during attempt ignored");
                return;
            }
            let Some(station_id) = session.station.as_ref().map(|s| s.id.clone()) else {
                return;
            };

            match (&event, session.state) {
                (TransportEvent::Playing, PlaybackState::Loading) => {
                    session.state = PlaybackState::Playing;
                    emitted.push(CoreEvent::Playback(PlaybackEvent::Resumed { station_id }));
                }
                (TransportEvent::Playing, PlaybackState::Paused) => {
                    // Resumed by the host (headset button, OS controls).
                    session.state = PlaybackState::Playing;
                    session.auto_retries_remaining = self.inner.config.max_auto_retries;
                    republish = session.station.clone();
                    emitted.push(CoreEvent::Playback(PlaybackEvent::Resumed { station_id }));
                }
                (TransportEvent::Waiting | TransportEvent::Stalled, PlaybackState::Playing) => {
                    session.state = PlaybackState::Loading;
                    emitted.push(CoreEvent::Playback(PlaybackEvent::Buffering { station_id }));
                    if event == TransportEvent::Stalled {
                        emitted.push(CoreEvent::Notification(Notification::warning(
                            "Connection Issue",
                            "Stream is buffering...",
                        )));
                    }
                }
                (TransportEvent::Paused, PlaybackState::Playing) => {
                    session.state = PlaybackState::Paused;
                    media_state = Some(MediaPlaybackState::Paused);
                    emitted.push(CoreEvent::Playback(PlaybackEvent::Paused { station_id }));
                }
                (TransportEvent::Error { message }, _) if session.stream_established() => {
                    let error = PlaybackError::PlaybackFailed(message.clone());
                    session.state = PlaybackState::Error;
                    session.last_error = Some(ErrorInfo::from(&error));
                    let armed = self.arm_retry(&mut session);

                    emitted.push(CoreEvent::Playback(PlaybackEvent::Error {
                        station_id: Some(station_id.clone()),
                        message: error.to_string(),
                        recoverable: armed,
                    }));
                    if armed {
                        emitted.push(CoreEvent::Playback(PlaybackEvent::RetryScheduled {
                            station_id,
                            delay_ms: self.inner.config.retry_delay.as_millis() as u64,
                        }));
                    }
                    let description = if armed {
                        "Failed to load stream. Retrying..."
                    } else {
                        "Failed to load stream."
                    };
                    emitted.push(CoreEvent::Notification(Notification::error(
                        "Stream Error",
                        description,
                    )));
                }
                _ => trace!(%event, state = ?session.state, "Transport event ignored"),
            }
        }

        if let Some(station) = republish {
            self.inner.media.publish(&station, self.media_handlers());
        }
        if let Some(state) = media_state {
            self.inner.media.update_playback_state(state);
        }
        for event in emitted {
            let _ = self.inner.events.emit(event);
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    async fn handle_command(&self, command: EngineCommand) {
        let result = match command {
            EngineCommand::AutoRetry { armed_epoch } => {
                info!("Auto-retrying stream");
                self.retry_with(RetryOrigin::Auto { armed_epoch })
                    .await
                    .map(|_| ())
            }
            EngineCommand::TogglePlayPause => self.toggle_play_pause().await.map(|_| ()),
            EngineCommand::Stop => self.stop().await,
        };

        if let Err(e) = result {
            debug!(?command, error = %e, "Engine command finished with error");
        }
    }

    fn media_handlers(&self) -> MediaHandlers {
        let handler = |command: EngineCommand| -> ActionHandler {
            let commands = self.inner.commands.clone();
            Arc::new(move || {
                let _ = commands.send(command);
            })
        };

        MediaHandlers {
            play: Some(handler(EngineCommand::TogglePlayPause)),
            pause: Some(handler(EngineCommand::TogglePlayPause)),
            stop: Some(handler(EngineCommand::Stop)),
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn begin(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Take the epoch following `expected`, unless another operation already
    /// moved past it.
    fn begin_after(&self, expected: u64) -> Option<u64> {
        self.inner
            .epoch
            .compare_exchange(expected, expected + 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| expected + 1)
    }

    fn ensure_current(&self, epoch: u64) -> Result<()> {
        if self.inner.epoch.load(Ordering::SeqCst) == epoch {
            Ok(())
        } else {
            Err(PlaybackError::Superseded)
        }
    }

    /// Run `f` on the session if `epoch` is still the latest.
    fn with_current<R>(&self, epoch: u64, f: impl FnOnce(&mut PlaybackSession) -> R) -> Result<R> {
        let mut session = self.inner.session.lock();
        self.ensure_current(epoch)?;
        Ok(f(&mut session))
    }

    fn apply_volume(&self, effective: u8) -> Result<()> {
        self.inner
            .transport
            .set_volume(f32::from(effective) / 100.0)
            .map_err(PlaybackError::from)
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.inner.events.emit(CoreEvent::Playback(event));
    }

    fn notify(&self, notification: Notification) {
        let _ = self.inner.events.emit(CoreEvent::Notification(notification));
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("session", &self.snapshot())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use core_stream::HealthCheckResult;

    // ========================================================================
    // Fakes
    // ========================================================================

    #[derive(Default)]
    struct DeadTransport {
        loads: Mutex<usize>,
    }

    #[async_trait]
    impl AudioTransport for DeadTransport {
        async fn load(&self, _url: &str) -> BridgeResult<()> {
            *self.loads.lock() += 1;
            Ok(())
        }

        async fn play(&self) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("offline".to_string()))
        }

        async fn pause(&self) -> BridgeResult<()> {
            Ok(())
        }

        async fn unload(&self) -> BridgeResult<()> {
            Ok(())
        }

        fn set_volume(&self, _volume: f32) -> BridgeResult<()> {
            Ok(())
        }

        fn on_event(&self, _listener: TransportListener) {}
    }

    struct Unreachable;

    #[async_trait]
    impl StreamHealthCheck for Unreachable {
        async fn check(&self, _station_id: &str, _url: &str) -> HealthCheckResult {
            HealthCheckResult {
                reachable: false,
                http_status: 503,
                content_type: None,
                is_audio_like: false,
                message: "Stream responded with HTTP 503".to_string(),
            }
        }
    }

    async fn failed_engine() -> (PlaybackEngine, Arc<DeadTransport>, u64) {
        let transport = Arc::new(DeadTransport::default());
        let engine = PlaybackEngine::builder(transport.clone(), Arc::new(Unreachable))
            .build()
            .unwrap();

        let station = Station::new("st-1", "Dead FM").with_origin_url("http://dead.example/live");
        engine.play(station).await.unwrap_err();
        assert!(engine.snapshot().retry_scheduled);

        let armed_epoch = engine.inner.epoch.load(Ordering::SeqCst);
        (engine, transport, armed_epoch)
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_auto_retry_runs_when_nothing_intervened() {
        let (engine, transport, armed_epoch) = failed_engine().await;

        engine
            .handle_command(EngineCommand::AutoRetry { armed_epoch })
            .await;

        assert_eq!(*transport.loads.lock(), 2);
        assert_eq!(engine.snapshot().state, PlaybackState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_drops_auto_retry_already_queued() {
        let (engine, transport, armed_epoch) = failed_engine().await;

        // Timer fired and queued its command; the user pauses before it runs.
        engine.pause().await.unwrap();
        engine
            .handle_command(EngineCommand::AutoRetry { armed_epoch })
            .await;

        assert_eq!(*transport.loads.lock(), 1);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Error);
        assert!(!snapshot.retry_scheduled);
    }
}
