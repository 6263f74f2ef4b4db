//! Compositor layer setup
//!
//! Promoting the video to a compositor layer takes two runtime
//! completions, and the session may end while either is in flight. The
//! setup is therefore an explicit state machine advanced once per frame;
//! each continuation first checks that its session is still the live one.
//!
//! ```text
//! Idle ─► NegotiatingCompatibility ─► AcquiringReferenceSpace ─► LayersBound
//!                  │                            │
//!                  └──────── session gone ──────┴──► Abandoned
//!                  └──────── runtime error ─────┴──► Failed
//! ```

use std::time::Duration;

use portal_render::RenderEngine;
use portal_video::{CompositorTarget, LayerHandle, Representation, VideoLayerManager};
use portal_xr::{
    Deferred, LayerId, ReferenceSpaceId, ReferenceSpaceType, SessionId, XrError, XrPlatform,
};

use crate::{GuiOverlay, SessionError, SessionResult};

/// Observable phase of a [`CompositorSetup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    Idle,
    NegotiatingCompatibility,
    AcquiringReferenceSpace,
    LayersBound,
    Failed,
    Abandoned,
}

impl SetupPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LayersBound | Self::Failed | Self::Abandoned)
    }
}

enum SetupState {
    Idle,
    NegotiatingCompatibility(Deferred<()>),
    AcquiringReferenceSpace(Deferred<ReferenceSpaceId>),
    LayersBound {
        space: ReferenceSpaceId,
        video: Option<LayerId>,
        gui: LayerId,
    },
    Failed,
    Abandoned,
}

/// Collaborators a setup step may touch
pub struct SetupContext<'a> {
    /// The session the lifecycle controller currently considers live
    pub live_session: Option<SessionId>,
    pub platform: &'a mut dyn XrPlatform,
    pub engine: &'a mut dyn RenderEngine,
    pub video: &'a mut VideoLayerManager,
    pub overlay: &'a mut GuiOverlay,
    pub now: Duration,
}

/// One session's compositor layer setup
pub struct CompositorSetup {
    session: SessionId,
    state: SetupState,
}

impl CompositorSetup {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            state: SetupState::Idle,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn phase(&self) -> SetupPhase {
        match self.state {
            SetupState::Idle => SetupPhase::Idle,
            SetupState::NegotiatingCompatibility(_) => SetupPhase::NegotiatingCompatibility,
            SetupState::AcquiringReferenceSpace(_) => SetupPhase::AcquiringReferenceSpace,
            SetupState::LayersBound { .. } => SetupPhase::LayersBound,
            SetupState::Failed => SetupPhase::Failed,
            SetupState::Abandoned => SetupPhase::Abandoned,
        }
    }

    /// Video and GUI layers, once bound
    pub fn bound_layers(&self) -> Option<(Option<LayerId>, LayerId)> {
        match self.state {
            SetupState::LayersBound { video, gui, .. } => Some((video, gui)),
            _ => None,
        }
    }

    pub fn reference_space(&self) -> Option<ReferenceSpaceId> {
        match self.state {
            SetupState::LayersBound { space, .. } => Some(space),
            _ => None,
        }
    }

    /// Run whatever continuation is ready. Never blocks.
    ///
    /// Returns `StaleSessionContinuation` (and moves to `Abandoned`) when
    /// the session ended underneath the setup.
    pub fn advance(&mut self, ctx: SetupContext<'_>) -> SessionResult<SetupPhase> {
        if self.phase().is_terminal() {
            return Ok(self.phase());
        }
        if ctx.live_session != Some(self.session) {
            log::info!(
                "Session {} ended during compositor setup ({:?}), discarding",
                self.session,
                self.phase()
            );
            self.state = SetupState::Abandoned;
            return Err(SessionError::StaleSessionContinuation(self.session));
        }

        let next = match std::mem::replace(&mut self.state, SetupState::Idle) {
            SetupState::Idle => {
                log::info!("Make GPU context XR compatible");
                SetupState::NegotiatingCompatibility(ctx.platform.make_context_xr_compatible())
            }
            SetupState::NegotiatingCompatibility(mut compatible) => match compatible.try_take() {
                None => SetupState::NegotiatingCompatibility(compatible),
                Some(Ok(())) => SetupState::AcquiringReferenceSpace(
                    ctx.platform
                        .request_reference_space(self.session, ReferenceSpaceType::LocalFloor),
                ),
                Some(Err(e)) => return self.fail(e.into()),
            },
            SetupState::AcquiringReferenceSpace(mut space) => match space.try_take() {
                None => SetupState::AcquiringReferenceSpace(space),
                Some(Ok(space)) => match self.bind_layers(space, ctx) {
                    Ok(bound) => bound,
                    Err(e) => return self.fail(e),
                },
                Some(Err(e)) => return self.fail(e.into()),
            },
            terminal => terminal,
        };

        self.state = next;
        log::debug!("Compositor setup for {} now {:?}", self.session, self.phase());
        Ok(self.phase())
    }

    /// GUI quad, then the video promotion, then the render state.
    ///
    /// A failure after the GUI quad is bound unbinds it and puts the video
    /// back on the WebGL planes, so the session keeps a visible video.
    fn bind_layers(&self, space: ReferenceSpaceId, ctx: SetupContext<'_>) -> SessionResult<SetupState> {
        let SetupContext {
            platform,
            engine,
            video,
            overlay,
            now,
            ..
        } = ctx;

        let gui = platform.create_quad_layer(self.session, &overlay.quad_descriptor(space))?;
        overlay.bind_layer(gui);

        match self.install_layers(space, gui, &mut *platform, &mut *engine, &mut *video, now) {
            Ok(video_layer) => Ok(SetupState::LayersBound {
                space,
                video: video_layer,
                gui,
            }),
            Err(e) => {
                overlay.unbind_layer();
                if video.active() != Some(Representation::WebGlPlanes) {
                    if let Err(restore) =
                        video.transition_to(Representation::WebGlPlanes, engine, None, None, now)
                    {
                        log::error!("Could not restore WebGL video planes: {}", restore);
                    }
                }
                Err(e)
            }
        }
    }

    /// Promote the video and install the render state; returns the video
    /// quad if the promotion produced one
    fn install_layers(
        &self,
        space: ReferenceSpaceId,
        gui: LayerId,
        platform: &mut dyn XrPlatform,
        engine: &mut dyn RenderEngine,
        video: &mut VideoLayerManager,
        now: Duration,
    ) -> SessionResult<Option<LayerId>> {
        let target = CompositorTarget {
            session: self.session,
            space,
        };
        let video_layer = match video.transition_to(
            Representation::CompositorLayer,
            engine,
            Some(&mut *platform),
            Some(target),
            now,
        )? {
            LayerHandle::Quad(layer) => Some(layer),
            LayerHandle::Planes(_) => None,
        };

        let existing = platform.render_state_layers(self.session);
        let mut layers: Vec<LayerId> = video_layer.into_iter().collect();
        layers.push(gui);
        if let Some(projection) = existing.first() {
            layers.push(*projection);
        }
        platform.update_render_state(self.session, &layers)?;
        log::info!("Render state layers for {}: {:?}", self.session, layers);
        Ok(video_layer)
    }

    fn fail(&mut self, error: SessionError) -> SessionResult<SetupPhase> {
        log::warn!("Compositor setup for {} failed: {}", self.session, error);
        self.state = SetupState::Failed;
        Err(error)
    }
}

impl std::fmt::Debug for CompositorSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositorSetup")
            .field("session", &self.session)
            .field("phase", &self.phase())
            .finish()
    }
}

/// True for errors that mean the session went away mid-setup
pub fn is_stale(error: &SessionError) -> bool {
    matches!(
        error,
        SessionError::StaleSessionContinuation(_) | SessionError::Xr(XrError::SessionEnded(_))
    )
}
