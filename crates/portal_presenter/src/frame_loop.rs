//! Frame loop coordinator
//!
//! One `run_frame` per platform frame callback. The steps run in a fixed
//! order and each is optional; a failing step is logged and the frame
//! carries on.
//!
//! ```text
//! pump runtime ─► end signal ─► 1 input ─► 2 camera layers ─► 3 compositor setup
//!     ─► 4 GUI upload ─► 5 scene update ─► 6 render ─► 7 video texture refresh
//! ```

use std::time::Duration;

use serde_json::Value;

use portal_render::{CameraRig, ClipPlane, FrameStats, RenderEngine};
use portal_video::VideoLayerManager;
use portal_xr::{EndReason, XrPlatform};

use crate::compositor_setup::is_stale;
use crate::{
    CompositorSetup, ControllerInput, EndSessionGesture, FrameClock, FrameTime, GuiOverlay,
    SceneFrame, SceneUpdate, SessionLifecycleController, SetupContext, SetupPhase,
};

/// Collaborators borrowed for one frame
pub struct FrameContext<'a> {
    /// XR runtime, pumped at the start of the frame
    pub platform: &'a mut dyn XrPlatform,
    pub engine: &'a mut dyn RenderEngine,
    /// Owner of the active video representation
    pub video: &'a mut VideoLayerManager,
    /// Stats panel and its compositor quad
    pub overlay: &'a mut GuiOverlay,
    /// Live session, if any, and its end signal
    pub lifecycle: &'a mut SessionLifecycleController,
    /// Application scene, updated after input
    pub scene: &'a mut dyn SceneUpdate,
    /// Event for the scene when input produced none
    pub inbound: Option<Value>,
}

/// What happened during one frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub time: FrameTime,
    /// What the render call drew
    pub stats: FrameStats,
    /// Controller action text, when a button changed this frame
    pub action: Option<String>,
    /// The end-session gesture is half done
    pub awaiting_confirmation: bool,
    /// Compositor setup phase after this frame's step, if one exists
    pub setup_phase: Option<SetupPhase>,
    /// The GUI panel was copied into its compositor quad
    pub gui_uploaded: bool,
    /// The WebGL video texture was refreshed
    pub video_refreshed: bool,
    /// The session ended during this frame
    pub session_ended: Option<EndReason>,
    /// Messages the scene sent to the host page
    pub outbound: Vec<Value>,
}

/// Runs the per-frame pipeline
pub struct FrameLoopCoordinator {
    clock: FrameClock,
    rig: CameraRig,
    input: Box<dyn ControllerInput>,
    setup: Option<CompositorSetup>,
    clipping_planes: Vec<ClipPlane>,
}

impl Default for FrameLoopCoordinator {
    fn default() -> Self {
        Self::new(Box::new(EndSessionGesture::new()))
    }
}

impl FrameLoopCoordinator {
    /// Coordinator reading controllers through `input`
    pub fn new(input: Box<dyn ControllerInput>) -> Self {
        Self {
            clock: FrameClock::new().with_max_delta(Duration::from_millis(250)),
            rig: CameraRig::new(),
            input,
            setup: None,
            clipping_planes: Vec::new(),
        }
    }

    /// Cameras as configured by the last frame
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Compositor setup of the current or last session
    pub fn setup(&self) -> Option<&CompositorSetup> {
        self.setup.as_ref()
    }

    /// Frames run since creation or the last restart
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Planes applied to every render and handed to the scene
    pub fn set_clipping_planes(&mut self, planes: Vec<ClipPlane>) {
        self.clipping_planes = planes;
    }

    /// Run every step for the frame at `timestamp`. Never fails; step
    /// errors are logged.
    pub fn run_frame(&mut self, timestamp: Duration, ctx: FrameContext<'_>) -> FrameReport {
        let FrameContext {
            platform,
            engine,
            video,
            overlay,
            lifecycle,
            scene,
            inbound,
        } = ctx;

        let time = self.clock.tick(timestamp);
        let mut report = FrameReport {
            time,
            ..Default::default()
        };

        platform.pump();
        if let Some(reason) = lifecycle.poll_end(engine, video, timestamp) {
            self.on_session_ended(overlay);
            report.session_ended = Some(reason);
        }

        // 1. input
        if let Some(id) = lifecycle.current_session() {
            let controllers = platform.input_sources(id);
            let outcome = lifecycle.session_mut().map(|session| {
                session.actions.begin_frame();
                self.input.poll(&controllers, &mut session.actions)
            });
            if let Some(outcome) = outcome {
                report.action = outcome.action;
                report.awaiting_confirmation = outcome.awaiting_confirmation;
                if outcome.end_session_requested {
                    match lifecycle.end_session(platform, engine, video, timestamp) {
                        Ok(Some(reason)) => {
                            self.on_session_ended(overlay);
                            report.session_ended = Some(reason);
                        }
                        Ok(None) => {}
                        Err(e) => log::warn!("End session request failed: {}", e),
                    }
                }
            }
        }

        // 2. camera layers
        let live = lifecycle.current_session();
        let stereo = live.map(|id| platform.view_count(id) >= 2).unwrap_or(false);
        self.rig.configure(live.is_some(), stereo);

        // 3. compositor setup, begun once per session
        if let Some(session) = lifecycle.session_mut() {
            if session.wants_compositor()
                && platform.is_compositor_binding_available()
                && session.claim_media_layer()
            {
                log::info!("Begin compositor layer setup for session {}", session.id());
                self.setup = Some(CompositorSetup::new(session.id()));
            }
        }
        if let Some(setup) = self.setup.as_mut() {
            if !setup.phase().is_terminal() {
                let result = setup.advance(SetupContext {
                    live_session: live,
                    platform: &mut *platform,
                    engine: &mut *engine,
                    video: &mut *video,
                    overlay: &mut *overlay,
                    now: timestamp,
                });
                match result {
                    Ok(_) => {}
                    Err(e) if is_stale(&e) => log::debug!("{}", e),
                    Err(e) => log::warn!("Compositor setup step failed: {}", e),
                }
            }
            report.setup_phase = Some(setup.phase());
        }

        // 4. GUI overlay
        if let Err(e) = overlay.update_stats(engine, time.delta) {
            log::warn!("GUI overlay update failed: {}", e);
        }
        if live.is_some() {
            match overlay.upload_if_needed(platform) {
                Ok(uploaded) => report.gui_uploaded = uploaded,
                Err(e) => log::warn!("GUI layer upload failed: {}", e),
            }
        }

        // 5. scene update
        let action_event = lifecycle.session().and_then(|s| s.actions.to_event());
        let event = action_event.or(inbound);
        let mut outbound = Vec::new();
        {
            let mut collect = |message: Value| outbound.push(message);
            scene.update(
                SceneFrame {
                    session: live,
                    delta: time.delta,
                    elapsed: time.elapsed,
                    inbound: event.as_ref(),
                    clipping_planes: &self.clipping_planes,
                },
                Some(&mut collect),
            );
        }
        report.outbound = outbound;

        // 6. render
        engine.set_clipping_planes(&self.clipping_planes);
        match engine.render(&self.rig) {
            Ok(stats) => report.stats = stats,
            Err(e) => log::warn!("Render failed: {}", e),
        }

        // 7. video texture refresh
        match video.tick(engine, timestamp) {
            Ok(refreshed) => report.video_refreshed = refreshed,
            Err(e) => log::warn!("Video texture refresh failed: {}", e),
        }

        report
    }

    /// Drop per-session frame state
    pub fn on_session_ended(&mut self, overlay: &mut GuiOverlay) {
        overlay.unbind_layer();
        self.input.reset();
        if let Some(setup) = &self.setup {
            log::debug!("Compositor setup for {} ended at {:?}", setup.session(), setup.phase());
        }
    }

    /// Restart the clock and camera state, as after a lost GPU context
    pub fn restart(&mut self) {
        self.clock.reset();
        self.rig = CameraRig::new();
    }
}

impl std::fmt::Debug for FrameLoopCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoopCoordinator")
            .field("frames", &self.clock.frame_count())
            .field("rig", &self.rig)
            .field("setup", &self.setup)
            .finish()
    }
}
