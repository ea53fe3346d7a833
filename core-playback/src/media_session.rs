//! Media session adapter.
//!
//! Mirrors the engine into the host's media session (lock screen, media
//! keys). Everything here is best effort: without a host, or with a host that
//! reports [`BridgeError::NotAvailable`], every call is a no-op.

use bridge_traits::error::BridgeError;
use bridge_traits::media_session::{
    ActionHandler, Artwork, MediaAction, MediaMetadata, MediaPlaybackState, MediaSessionHost,
};
use bridge_traits::Station;
use std::sync::Arc;
use tracing::{debug, warn};

const ARTWORK_SIZES: [&str; 3] = ["96x96", "192x192", "512x512"];

/// Handlers offered to the host on publish.
#[derive(Default, Clone)]
pub struct MediaHandlers {
    pub play: Option<ActionHandler>,
    pub pause: Option<ActionHandler>,
    pub stop: Option<ActionHandler>,
}

impl MediaHandlers {
    fn entries(&self) -> [(MediaAction, Option<&ActionHandler>); 3] {
        [
            (MediaAction::Play, self.play.as_ref()),
            (MediaAction::Pause, self.pause.as_ref()),
            (MediaAction::Stop, self.stop.as_ref()),
        ]
    }
}

pub struct MediaSessionAdapter {
    host: Option<Arc<dyn MediaSessionHost>>,
    app_name: String,
    fallback_artwork: [String; 3],
}

impl MediaSessionAdapter {
    pub fn new(
        host: Option<Arc<dyn MediaSessionHost>>,
        app_name: impl Into<String>,
        fallback_artwork: [String; 3],
    ) -> Self {
        Self {
            host,
            app_name: app_name.into(),
            fallback_artwork,
        }
    }

    /// Adapter without a host.
    pub fn disabled() -> Self {
        Self::new(None, "", Default::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.host.is_some()
    }

    /// Now-playing metadata for `station`.
    pub fn metadata_for(&self, station: &Station) -> MediaMetadata {
        let favicon = station
            .favicon
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());
        let album = station
            .tags
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.app_name.as_str());

        let artwork = ARTWORK_SIZES
            .iter()
            .zip(self.fallback_artwork.iter())
            .map(|(sizes, fallback)| Artwork {
                src: favicon.unwrap_or(fallback.as_str()).to_string(),
                sizes: sizes.to_string(),
                mime_type: "image/png".to_string(),
            })
            .collect();

        MediaMetadata {
            title: station.name.clone(),
            artist: station.country.clone(),
            album: album.to_string(),
            artwork,
        }
    }

    /// Publish `station` and register the supplied handlers.
    pub fn publish(&self, station: &Station, handlers: MediaHandlers) {
        let Some(host) = &self.host else {
            return;
        };

        if !report("set metadata", host.set_metadata(Some(self.metadata_for(station)))) {
            return;
        }

        for (action, handler) in handlers.entries() {
            if let Some(handler) = handler {
                report(
                    action.as_str(),
                    host.set_action_handler(action, Some(Arc::clone(handler))),
                );
            }
        }

        report("set playback state", host.set_playback_state(MediaPlaybackState::Playing));
    }

    pub fn update_playback_state(&self, state: MediaPlaybackState) {
        if let Some(host) = &self.host {
            report("set playback state", host.set_playback_state(state));
        }
    }

    /// Reset metadata, set state `none` and unregister every action.
    pub fn clear(&self) {
        let Some(host) = &self.host else {
            return;
        };

        report("clear metadata", host.set_metadata(None));
        report("set playback state", host.set_playback_state(MediaPlaybackState::None));

        for action in MediaAction::ALL {
            report(action.as_str(), host.set_action_handler(action, None));
        }
    }
}

/// Log a failed host call. Returns `false` when the host has no media session.
fn report(operation: &str, result: bridge_traits::error::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(BridgeError::NotAvailable(reason)) => {
            debug!(operation, %reason, "Media session not available");
            false
        }
        Err(e) => {
            warn!(operation, error = %e, "Media session call failed");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // ========================================================================
    // Recording host
    // ========================================================================

    #[derive(Default)]
    struct RecordingHost {
        metadata: Mutex<Vec<Option<MediaMetadata>>>,
        handlers: Mutex<Vec<(MediaAction, bool)>>,
        states: Mutex<Vec<MediaPlaybackState>>,
        reject: Option<MediaAction>,
        unavailable: bool,
    }

    impl MediaSessionHost for RecordingHost {
        fn set_metadata(&self, metadata: Option<MediaMetadata>) -> bridge_traits::error::Result<()> {
            if self.unavailable {
                return Err(BridgeError::NotAvailable("media session".into()));
            }
            self.metadata.lock().push(metadata);
            Ok(())
        }

        fn set_action_handler(
            &self,
            action: MediaAction,
            handler: Option<ActionHandler>,
        ) -> bridge_traits::error::Result<()> {
            if self.reject == Some(action) {
                return Err(BridgeError::OperationFailed(format!("{} unsupported", action)));
            }
            self.handlers.lock().push((action, handler.is_some()));
            Ok(())
        }

        fn set_playback_state(&self, state: MediaPlaybackState) -> bridge_traits::error::Result<()> {
            self.states.lock().push(state);
            Ok(())
        }
    }

    fn adapter(host: Arc<RecordingHost>) -> MediaSessionAdapter {
        MediaSessionAdapter::new(
            Some(host),
            "Radio Stream",
            [
                "/radio-logo.png".to_string(),
                "/icons/icon-192.png".to_string(),
                "/icons/icon-512.png".to_string(),
            ],
        )
    }

    fn noop() -> ActionHandler {
        Arc::new(|| {})
    }

    #[test]
    fn test_metadata_falls_back_to_app_name_and_icons() {
        let adapter = adapter(Arc::new(RecordingHost::default()));
        let station = Station::new("s1", "Jazz FM").with_country("France");

        let metadata = adapter.metadata_for(&station);
        assert_eq!(metadata.title, "Jazz FM");
        assert_eq!(metadata.artist, "France");
        assert_eq!(metadata.album, "Radio Stream");
        assert_eq!(metadata.artwork.len(), 3);
        assert_eq!(metadata.artwork[1].src, "/icons/icon-192.png");
        assert_eq!(metadata.artwork[2].sizes, "512x512");
        assert!(metadata.artwork.iter().all(|a| a.mime_type == "image/png"));
    }

    #[test]
    fn test_metadata_prefers_station_details() {
        let adapter = adapter(Arc::new(RecordingHost::default()));
        let mut station = Station::new("s1", "Jazz FM");
        station.tags = Some("jazz,smooth".into());
        station.favicon = Some("https://jazz.example/icon.png".into());

        let metadata = adapter.metadata_for(&station);
        assert_eq!(metadata.album, "jazz,smooth");
        assert!(metadata
            .artwork
            .iter()
            .all(|a| a.src == "https://jazz.example/icon.png"));
    }

    #[test]
    fn test_publish_registers_supplied_handlers_only() {
        let host = Arc::new(RecordingHost {
            reject: Some(MediaAction::Stop),
            ..Default::default()
        });
        let adapter = adapter(Arc::clone(&host));

        adapter.publish(
            &Station::new("s1", "One"),
            MediaHandlers {
                play: Some(noop()),
                pause: None,
                stop: Some(noop()),
            },
        );

        assert_eq!(host.metadata.lock().len(), 1);
        assert_eq!(*host.handlers.lock(), vec![(MediaAction::Play, true)]);
        assert_eq!(*host.states.lock(), vec![MediaPlaybackState::Playing]);
    }

    #[test]
    fn test_clear_unregisters_everything() {
        let host = Arc::new(RecordingHost {
            reject: Some(MediaAction::SeekForward),
            ..Default::default()
        });
        let adapter = adapter(Arc::clone(&host));

        adapter.clear();

        assert_eq!(*host.metadata.lock(), vec![None]);
        assert_eq!(*host.states.lock(), vec![MediaPlaybackState::None]);
        let handlers = host.handlers.lock();
        assert_eq!(handlers.len(), 6);
        assert!(handlers.iter().all(|(_, registered)| !registered));
    }

    #[test]
    fn test_unavailable_host_is_noop() {
        let host = Arc::new(RecordingHost {
            unavailable: true,
            ..Default::default()
        });
        let adapter = adapter(Arc::clone(&host));

        adapter.publish(
            &Station::new("s1", "One"),
            MediaHandlers {
                play: Some(noop()),
                ..Default::default()
            },
        );

        assert!(host.handlers.lock().is_empty());
        assert!(host.states.lock().is_empty());
    }

    #[test]
    fn test_disabled_adapter() {
        let adapter = MediaSessionAdapter::disabled();
        assert!(!adapter.is_enabled());
        adapter.publish(&Station::new("s1", "One"), MediaHandlers::default());
        adapter.clear();
    }
}
