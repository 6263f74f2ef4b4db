//! Portal application
//!
//! Owns every collaborator and exposes what the host page does: enter XR
//! from the entry button, run the frame callback, end the session, and
//! recover from a lost GPU context.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use portal_render::RenderEngine;
use portal_video::{Representation, VideoLayerConfig, VideoLayerError, VideoLayerManager, VideoSource};
use portal_xr::{EndReason, SessionId, XrPlatform};

use crate::{
    ControllerInput, FrameContext, FrameLoopCoordinator, FrameReport, GuiOverlay, SceneUpdate,
    SessionError, SessionLifecycleController, SessionResult,
};

/// The stereo video demo
pub struct PortalApp<P: XrPlatform, E: RenderEngine> {
    platform: P,
    engine: E,
    video: VideoLayerManager,
    overlay: GuiOverlay,
    lifecycle: SessionLifecycleController,
    frame_loop: FrameLoopCoordinator,
    scene: Box<dyn SceneUpdate>,
    loop_generation: u32,
}

impl<P: XrPlatform, E: RenderEngine> PortalApp<P, E> {
    /// Build the app and set up the preview environment (WebGL video and
    /// GUI panel in the scene, entry button enabled)
    pub fn new(
        platform: P,
        mut engine: E,
        source: Arc<dyn VideoSource>,
        config: VideoLayerConfig,
        enable_layers: bool,
        scene: Box<dyn SceneUpdate>,
    ) -> SessionResult<Self> {
        let video = VideoLayerManager::new(config, source, &mut engine)?;
        let mut app = Self {
            platform,
            engine,
            video,
            overlay: GuiOverlay::default(),
            lifecycle: SessionLifecycleController::new(enable_layers),
            frame_loop: FrameLoopCoordinator::default(),
            scene,
            loop_generation: 0,
        };
        app.setup_environment(Duration::ZERO)?;
        Ok(app)
    }

    pub fn with_input(mut self, input: Box<dyn ControllerInput>) -> Self {
        self.frame_loop = FrameLoopCoordinator::new(input);
        self
    }

    fn setup_environment(&mut self, now: Duration) -> SessionResult<()> {
        self.overlay
            .attach_to_scene(&mut self.engine)
            .map_err(VideoLayerError::from)?;
        if self.video.active().is_none() {
            self.video.init_video_layer(
                Representation::WebGlPlanes,
                &mut self.engine,
                None,
                None,
                now,
            )?;
        }
        self.frame_loop.restart();
        self.loop_generation += 1;
        self.lifecycle.mark_ready();
        log::info!("Environment set up (frame loop generation {})", self.loop_generation);
        Ok(())
    }

    /// Entry button handler
    pub async fn enter_xr(&mut self) -> SessionResult<SessionId> {
        self.lifecycle
            .enter(&mut self.platform, &mut self.engine, &self.video)
            .await
    }

    /// Per-frame callback
    pub fn render_frame(&mut self, timestamp: Duration, inbound: Option<Value>) -> FrameReport {
        self.frame_loop.run_frame(
            timestamp,
            FrameContext {
                platform: &mut self.platform,
                engine: &mut self.engine,
                video: &mut self.video,
                overlay: &mut self.overlay,
                lifecycle: &mut self.lifecycle,
                scene: self.scene.as_mut(),
                inbound,
            },
        )
    }

    /// End the live session from the application side
    pub fn end_session(&mut self, now: Duration) -> SessionResult<Option<EndReason>> {
        let ended = self
            .lifecycle
            .end_session(&mut self.platform, &mut self.engine, &mut self.video, now)?;
        if ended.is_some() {
            self.frame_loop.on_session_ended(&mut self.overlay);
        }
        Ok(ended)
    }

    /// GPU context came back: rebuild the scene resources and restart the loop
    pub fn restore_context(&mut self, now: Duration) -> SessionResult<()> {
        log::info!("GPU context restored");
        self.setup_environment(now)
    }

    /// Swap the XR runtime, e.g. for the emulated device. Only while no
    /// session is live.
    pub fn replace_platform(&mut self, platform: P) -> SessionResult<P> {
        if self.lifecycle.session().is_some() {
            return Err(SessionError::AlreadyActive);
        }
        log::info!("Replacing XR platform {} with {}", self.platform.name(), platform.name());
        Ok(std::mem::replace(&mut self.platform, platform))
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn video(&self) -> &VideoLayerManager {
        &self.video
    }

    pub fn overlay(&self) -> &GuiOverlay {
        &self.overlay
    }

    pub fn lifecycle(&self) -> &SessionLifecycleController {
        &self.lifecycle
    }

    pub fn frame_loop(&self) -> &FrameLoopCoordinator {
        &self.frame_loop
    }

    /// Bumped each time the environment is set up
    pub fn loop_generation(&self) -> u32 {
        self.loop_generation
    }
}
