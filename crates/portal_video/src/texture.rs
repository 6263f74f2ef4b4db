//! Shared video texture

use std::sync::Arc;
use std::time::Duration;

use portal_core::{IntervalTimer, TimerHandle};
use portal_render::{RenderEngine, TextureId, TextureSource};

use crate::{VideoLayerResult, VideoSource};

/// The one GPU texture fed by a video source.
///
/// A refresh timer marks it dirty at most `refresh_hz` times per second,
/// and only while the source has a decoded frame. The engine clears the
/// dirty flag when it uploads.
pub struct SharedTexture {
    texture: TextureId,
    source: Arc<dyn VideoSource>,
    refresh: IntervalTimer,
}

impl SharedTexture {
    pub fn new(
        engine: &mut dyn RenderEngine,
        source: Arc<dyn VideoSource>,
        refresh_hz: u32,
    ) -> VideoLayerResult<Self> {
        let texture = engine.create_texture(TextureSource::Media(source.media_id()))?;
        Ok(Self {
            texture,
            source,
            refresh: IntervalTimer::from_hz(refresh_hz),
        })
    }

    pub fn id(&self) -> TextureId {
        self.texture
    }

    pub fn source(&self) -> &Arc<dyn VideoSource> {
        &self.source
    }

    /// Start refreshing; no-op if already running
    pub fn start_refresh(&mut self, now: Duration) -> TimerHandle {
        self.refresh.start(now)
    }

    pub fn stop_refresh(&mut self) -> bool {
        self.refresh.stop()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    /// Timer handle, 0 while stopped
    pub fn refresh_handle(&self) -> u32 {
        self.refresh.raw_handle()
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh.period()
    }

    /// Poll the refresh timer; returns true if the texture was marked dirty
    pub fn tick(&mut self, engine: &mut dyn RenderEngine, now: Duration) -> VideoLayerResult<bool> {
        if !self.refresh.poll(now) || !self.source.ready_state().has_frame() {
            return Ok(false);
        }
        engine.mark_texture_dirty(self.texture)?;
        Ok(true)
    }
}

impl std::fmt::Debug for SharedTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTexture")
            .field("texture", &self.texture)
            .field("media", &self.source.media_id())
            .field("refresh", &self.refresh)
            .finish()
    }
}
