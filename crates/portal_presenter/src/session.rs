//! Session lifecycle
//!
//! ```text
//!  Idle ──request_session──► Requesting ──on_session_started──► Active
//!   ▲                            │                                │
//!   │◄──── both requests fail ───┘                 end_session / platform end
//!   │                                                             ▼
//!   └───────────────────── on_session_ended ◄──────────────── Ending
//! ```
//!
//! Session state lives in a [`SessionContext`] owned by the controller;
//! the runtime's end signal replaces an end event listener.

use std::time::Duration;

use portal_render::RenderEngine;
use portal_video::{Representation, VideoLayerManager};
use portal_xr::{
    Deferred, EndReason, SessionFeature, SessionId, SessionInit, SessionMode, XrPlatform,
};

use crate::{ActionContext, SessionError, SessionResult};

/// Where the controller is in the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Requesting,
    Active,
    Ending,
}

/// State of the entry button shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrEntryState {
    /// Disabled: still loading, or a request is in flight or failed
    Preparing,
    EnterXr,
    Reload,
}

impl XrEntryState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preparing => "Preparing...",
            Self::EnterXr => "Enter XR",
            Self::Reload => "Reload",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Preparing)
    }
}

/// A granted session before it is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGrant {
    pub id: SessionId,
    pub mode: SessionMode,
    /// Compositor layers were wanted when the session was requested
    pub use_compositor: bool,
}

/// Everything the demo tracks about the live session
#[derive(Debug)]
pub struct SessionContext {
    id: SessionId,
    mode: SessionMode,
    layers_capable: bool,
    use_compositor: bool,
    media_layer_initialized: bool,
    end_signal: Deferred<EndReason>,
    /// Input state folded across frames
    pub actions: ActionContext,
}

impl SessionContext {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The session was granted the layers feature
    pub fn layers_capable(&self) -> bool {
        self.layers_capable
    }

    pub fn use_compositor(&self) -> bool {
        self.use_compositor
    }

    /// Compositor promotion is both wanted and possible
    pub fn wants_compositor(&self) -> bool {
        self.use_compositor && self.layers_capable
    }

    pub fn has_media_layer_initialized(&self) -> bool {
        self.media_layer_initialized
    }

    /// Returns true exactly once per session
    pub fn claim_media_layer(&mut self) -> bool {
        !std::mem::replace(&mut self.media_layer_initialized, true)
    }
}

/// Requests, starts and ends XR sessions and moves the video between
/// representations at session boundaries
#[derive(Debug)]
pub struct SessionLifecycleController {
    state: LifecycleState,
    session: Option<SessionContext>,
    entry: XrEntryState,
    enable_layers: bool,
    last_end: Option<(SessionId, EndReason)>,
}

impl SessionLifecycleController {
    pub fn new(enable_layers: bool) -> Self {
        Self {
            state: LifecycleState::Idle,
            session: None,
            entry: XrEntryState::Preparing,
            enable_layers,
            last_end: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn entry_state(&self) -> XrEntryState {
        self.entry
    }

    pub fn layers_enabled(&self) -> bool {
        self.enable_layers
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SessionContext> {
        self.session.as_mut()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn last_end(&self) -> Option<(SessionId, EndReason)> {
        self.last_end
    }

    /// Scene is set up; let the user enter XR
    pub fn mark_ready(&mut self) {
        if self.state == LifecycleState::Idle && self.session.is_none() {
            self.entry = XrEntryState::EnterXr;
        }
    }

    /// Request an immersive session.
    ///
    /// With layers enabled and an AR-capable runtime, asks for immersive-ar
    /// with optional layers and required local-floor, retrying a rejection
    /// once as immersive-vr with optional local-floor. Otherwise the
    /// immersive-vr request is the only attempt. A final rejection fails
    /// with `SessionUnavailable` and the entry button stays at "Preparing...".
    pub async fn request_session(&mut self, platform: &mut dyn XrPlatform) -> SessionResult<SessionGrant> {
        if self.state != LifecycleState::Idle || self.session.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        self.state = LifecycleState::Requesting;
        self.entry = XrEntryState::Preparing;

        let use_layers = self.enable_layers && platform.is_compositor_binding_available();
        let ar_supported = use_layers
            && platform
                .is_session_supported(SessionMode::ImmersiveAr)
                .await
                .unwrap_or(false);

        let (mode, init) = if ar_supported {
            (
                SessionMode::ImmersiveAr,
                SessionInit::new()
                    .optional(SessionFeature::Layers)
                    .require(SessionFeature::LocalFloor),
            )
        } else {
            Self::reduced_request()
        };

        log::info!("Requesting {} session on {} (layers: {})", mode, platform.name(), use_layers);
        let (id, mode) = match platform.request_session(mode, &init).await {
            Ok(id) => (id, mode),
            Err(first) if !ar_supported => {
                log::warn!("{} request rejected ({})", mode, first);
                self.state = LifecycleState::Idle;
                return Err(SessionError::SessionUnavailable(first.to_string()));
            }
            Err(first) => {
                log::warn!("{} request rejected ({}), retrying without layers", mode, first);
                let (mode, init) = Self::reduced_request();
                match platform.request_session(mode, &init).await {
                    Ok(id) => (id, mode),
                    Err(second) => {
                        log::warn!("{} request rejected ({})", mode, second);
                        self.state = LifecycleState::Idle;
                        return Err(SessionError::SessionUnavailable(second.to_string()));
                    }
                }
            }
        };

        Ok(SessionGrant {
            id,
            mode,
            use_compositor: use_layers,
        })
    }

    fn reduced_request() -> (SessionMode, SessionInit) {
        (
            SessionMode::ImmersiveVr,
            SessionInit::new().optional(SessionFeature::LocalFloor),
        )
    }

    /// Bind a granted session to the renderer and start the video.
    ///
    /// The WebGL planes stay in place; the frame loop promotes the video to
    /// a compositor layer once the binding is ready.
    pub fn on_session_started(
        &mut self,
        grant: SessionGrant,
        platform: &mut dyn XrPlatform,
        engine: &mut dyn RenderEngine,
        video: &VideoLayerManager,
    ) -> SessionResult<SessionId> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        let end_signal = match platform.session_end_signal(grant.id) {
            Ok(signal) => signal,
            Err(e) => {
                self.state = LifecycleState::Idle;
                return Err(e.into());
            }
        };
        engine.bind_xr_session(Some(grant.id));

        let context = SessionContext {
            id: grant.id,
            mode: grant.mode,
            layers_capable: platform.supports_render_layers(grant.id),
            use_compositor: grant.use_compositor,
            media_layer_initialized: false,
            end_signal,
            actions: ActionContext::default(),
        };
        if context.wants_compositor() {
            log::info!("Session {} is layers-capable, compositor video pending", grant.id);
        } else if grant.use_compositor {
            log::info!("Session {} has no layers, keeping WebGL video", grant.id);
        }

        video.source().play();

        log::info!("{} session {} started", grant.mode, grant.id);
        self.session = Some(context);
        self.state = LifecycleState::Active;
        self.entry = XrEntryState::Reload;
        Ok(grant.id)
    }

    /// Request and start a session in one go
    pub async fn enter(
        &mut self,
        platform: &mut dyn XrPlatform,
        engine: &mut dyn RenderEngine,
        video: &VideoLayerManager,
    ) -> SessionResult<SessionId> {
        let grant = self.request_session(&mut *platform).await?;
        self.on_session_started(grant, platform, engine, video)
    }

    /// Ask the runtime to end the live session and process the end if the
    /// runtime reports it right away
    pub fn end_session(
        &mut self,
        platform: &mut dyn XrPlatform,
        engine: &mut dyn RenderEngine,
        video: &mut VideoLayerManager,
        now: Duration,
    ) -> SessionResult<Option<EndReason>> {
        let id = self.current_session().ok_or(SessionError::NotActive)?;
        self.state = LifecycleState::Ending;
        if let Err(e) = platform.end_session(id) {
            self.state = LifecycleState::Active;
            return Err(e.into());
        }
        Ok(self.poll_end(engine, video, now))
    }

    /// Check the live session's end signal; handles the end if it fired
    pub fn poll_end(
        &mut self,
        engine: &mut dyn RenderEngine,
        video: &mut VideoLayerManager,
        now: Duration,
    ) -> Option<EndReason> {
        let reason = match self.session.as_mut()?.end_signal.try_take()? {
            Ok(reason) => reason,
            Err(e) => {
                log::warn!("Session end signal failed: {}", e);
                EndReason::Error
            }
        };
        self.on_session_ended(reason, engine, video, now);
        Some(reason)
    }

    /// Tear down session state and put the WebGL planes back.
    ///
    /// Returns false if there was no session. Works whether or not the
    /// compositor layer was ever created.
    pub fn on_session_ended(
        &mut self,
        reason: EndReason,
        engine: &mut dyn RenderEngine,
        video: &mut VideoLayerManager,
        now: Duration,
    ) -> bool {
        let Some(context) = self.session.take() else {
            return false;
        };
        engine.bind_xr_session(None);

        if video.active() != Some(Representation::WebGlPlanes) {
            if let Err(e) = video.transition_to(Representation::WebGlPlanes, engine, None, None, now) {
                log::warn!("Could not restore WebGL video: {}", e);
            }
        }

        log::info!("Session {} ended ({:?})", context.id, reason);
        self.state = LifecycleState::Idle;
        self.last_end = Some((context.id, reason));
        true
    }
}
