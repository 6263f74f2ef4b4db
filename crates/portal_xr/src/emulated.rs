//! Emulated XR device
//!
//! An in-process runtime used when no native runtime can provide an
//! immersive session, and as the test double for everything above this
//! crate. It records every request so callers can assert on what the core
//! asked the runtime to do.
//!
//! Session-level requests settle immediately. Context compatibility and
//! reference space requests settle after `completion_latency` pumps, which
//! lets tests end a session while those completions are still in flight.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    deferred, Deferred, EndReason, GamepadButton, GamepadState, Hand, HandControllers,
    InputDeviceId, InputSource, LayerId, MediaSourceId, Pose, QuadLayerInit, ReferenceSpaceId,
    ReferenceSpaceType, Resolver, SessionFeature, SessionId, SessionInit, SessionMode, XrError,
    XrPlatform, XrResult,
};

/// Hardware the emulator pretends to be
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub name: String,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    /// Interpupillary distance (meters)
    pub ipd: f32,
    pub views: usize,
    pub left_controller: Pose,
    pub right_controller: Pose,
}

impl DeviceProfile {
    pub fn meta_quest_3() -> Self {
        let grip = Quat::from_xyzw(0.147_663_06, 0.024_713_667, -0.003_776_739_6, 0.988_721_7);
        Self {
            name: "Meta Quest 3".to_string(),
            fov_y: 75.0_f32.to_radians(),
            ipd: 0.063,
            views: 2,
            left_controller: Pose::new(Vec3::new(-0.156_49, 1.434_74, -0.383_68), grip),
            right_controller: Pose::new(Vec3::new(0.156_49, 1.434_74, -0.383_68), grip),
        }
    }

    /// Look up a built-in profile by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "meta-quest-3" | "quest3" | "meta quest 3" => Some(Self::meta_quest_3()),
            _ => None,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::meta_quest_3()
    }
}

/// Emulator capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorSettings {
    pub profile: String,
    pub supports_vr: bool,
    pub supports_ar: bool,
    /// Grant the layers feature when requested
    pub supports_layers: bool,
    /// GL/media bindings for compositor layers exist
    pub compositor_binding: bool,
    /// Pumps before a deferred completion settles
    pub completion_latency: u32,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            profile: "meta-quest-3".to_string(),
            supports_vr: true,
            supports_ar: true,
            supports_layers: true,
            compositor_binding: true,
            completion_latency: 2,
        }
    }
}

/// What kind of compositor layer the emulator created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatedLayerKind {
    /// The session's default projection layer
    Projection,
    /// GPU texture quad the application uploads into
    Quad,
    /// Quad bound to a media element
    MediaQuad(MediaSourceId),
}

/// A layer as the emulator sees it
#[derive(Debug, Clone)]
pub struct EmulatedLayer {
    pub session: SessionId,
    pub kind: EmulatedLayerKind,
    pub init: Option<QuadLayerInit>,
    pub needs_redraw: bool,
    pub uploads: u32,
    pub destroyed: bool,
}

struct EmulatedSession {
    mode: SessionMode,
    layers_granted: bool,
    render_layers: Vec<LayerId>,
    spaces: Vec<(ReferenceSpaceId, ReferenceSpaceType)>,
    end_resolvers: Vec<Resolver<EndReason>>,
    ended: Option<EndReason>,
}

enum PendingWork {
    Compatible(Resolver<()>),
    ReferenceSpace {
        session: SessionId,
        space: ReferenceSpaceType,
        resolver: Resolver<ReferenceSpaceId>,
    },
}

struct Pending {
    remaining: u32,
    work: PendingWork,
}

/// In-process XR runtime
pub struct EmulatedXrDevice {
    profile: DeviceProfile,
    settings: EmulatorSettings,
    sessions: HashMap<SessionId, EmulatedSession>,
    layers: HashMap<LayerId, EmulatedLayer>,
    pending: Vec<Pending>,
    requests: Vec<(SessionMode, SessionInit)>,
    controllers: HandControllers,
    context_compatible: bool,
    fail_requests: u32,
}

impl EmulatedXrDevice {
    pub fn new(profile: DeviceProfile, settings: EmulatorSettings) -> Self {
        log::info!(
            "Installing emulated XR device: {} (layers: {}, compositor binding: {})",
            profile.name,
            settings.supports_layers,
            settings.compositor_binding
        );
        let mut device = Self {
            profile,
            settings,
            sessions: HashMap::new(),
            layers: HashMap::new(),
            pending: Vec::new(),
            requests: Vec::new(),
            controllers: HandControllers::default(),
            context_compatible: false,
            fail_requests: 0,
        };
        device.connect_controller(Hand::Left);
        device.connect_controller(Hand::Right);
        device
    }

    /// Build from settings, resolving the profile by name
    pub fn from_settings(settings: EmulatorSettings) -> Self {
        let profile = DeviceProfile::by_name(&settings.profile).unwrap_or_else(|| {
            log::warn!("Unknown device profile '{}', using Meta Quest 3", settings.profile);
            DeviceProfile::meta_quest_3()
        });
        Self::new(profile, settings)
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn settings(&self) -> &EmulatorSettings {
        &self.settings
    }

    /// Reject the next `count` session requests regardless of capabilities
    pub fn fail_next_requests(&mut self, count: u32) {
        self.fail_requests = count;
    }

    /// Every session request received, in order
    pub fn requests(&self) -> &[(SessionMode, SessionInit)] {
        &self.requests
    }

    pub fn layer(&self, id: LayerId) -> Option<&EmulatedLayer> {
        self.layers.get(&id)
    }

    /// All layers ever created, including destroyed ones
    pub fn layers(&self) -> impl Iterator<Item = (&LayerId, &EmulatedLayer)> {
        self.layers.iter()
    }

    pub fn media_layer_count(&self) -> usize {
        self.layers
            .values()
            .filter(|l| matches!(l.kind, EmulatedLayerKind::MediaQuad(_)))
            .count()
    }

    pub fn quad_layer_count(&self) -> usize {
        self.layers
            .values()
            .filter(|l| l.kind == EmulatedLayerKind::Quad)
            .count()
    }

    pub fn is_session_active(&self, session: SessionId) -> bool {
        self.sessions
            .get(&session)
            .map(|s| s.ended.is_none())
            .unwrap_or(false)
    }

    pub fn end_reason(&self, session: SessionId) -> Option<EndReason> {
        self.sessions.get(&session).and_then(|s| s.ended)
    }

    pub fn session_mode(&self, session: SessionId) -> Option<SessionMode> {
        self.sessions.get(&session).map(|s| s.mode)
    }

    /// Completions still waiting for pumps
    pub fn pending_completions(&self) -> usize {
        self.pending.len()
    }

    pub fn is_context_xr_compatible(&self) -> bool {
        self.context_compatible
    }

    pub fn connect_controller(&mut self, hand: Hand) {
        let ray_space = match hand {
            Hand::Left => self.profile.left_controller,
            Hand::Right => self.profile.right_controller,
        };
        let source = InputSource {
            hand,
            device: InputDeviceId::next(),
            ray_space,
            gamepad: GamepadState::default(),
        };
        match hand {
            Hand::Left => self.controllers.left = Some(source),
            Hand::Right => self.controllers.right = Some(source),
        }
    }

    pub fn disconnect_controller(&mut self, hand: Hand) {
        match hand {
            Hand::Left => self.controllers.left = None,
            Hand::Right => self.controllers.right = None,
        }
    }

    pub fn set_button(&mut self, hand: Hand, button: GamepadButton, pressed: bool) {
        if let Some(source) = self.controllers.get_mut(hand) {
            source.gamepad.set(button, pressed);
        }
    }

    /// End a session from the runtime side (headset removed, system menu, crash)
    pub fn platform_end(&mut self, session: SessionId, reason: EndReason) {
        self.finish_session(session, reason);
    }

    fn finish_session(&mut self, session: SessionId, reason: EndReason) {
        let Some(state) = self.sessions.get_mut(&session) else {
            return;
        };
        if state.ended.is_some() {
            return;
        }
        state.ended = Some(reason);
        state.render_layers.clear();
        for resolver in state.end_resolvers.drain(..) {
            resolver.resolve(reason);
        }
        for layer in self.layers.values_mut().filter(|l| l.session == session) {
            layer.destroyed = true;
        }
        log::info!("Emulated session {} ended ({:?})", session, reason);
    }

    fn live_session(&self, session: SessionId) -> XrResult<&EmulatedSession> {
        let state = self
            .sessions
            .get(&session)
            .ok_or(XrError::InvalidSession(session))?;
        if state.ended.is_some() {
            return Err(XrError::SessionEnded(session));
        }
        Ok(state)
    }

    fn check_layer_support(&self, session: SessionId) -> XrResult<()> {
        let state = self.live_session(session)?;
        if !state.layers_granted || !self.settings.compositor_binding {
            return Err(XrError::CompositorUnsupported);
        }
        Ok(())
    }

    fn feature_available(&self, feature: SessionFeature) -> bool {
        match feature {
            SessionFeature::Layers => self.settings.supports_layers,
            SessionFeature::Local | SessionFeature::LocalFloor => true,
            SessionFeature::HandTracking => false,
        }
    }

    fn mode_supported(&self, mode: SessionMode) -> bool {
        match mode {
            SessionMode::Inline => true,
            SessionMode::ImmersiveVr => self.settings.supports_vr,
            SessionMode::ImmersiveAr => self.settings.supports_ar,
        }
    }

    fn complete(&mut self, work: PendingWork) {
        match work {
            PendingWork::Compatible(resolver) => {
                self.context_compatible = true;
                resolver.resolve(());
            }
            PendingWork::ReferenceSpace {
                session,
                space,
                resolver,
            } => match self.sessions.get_mut(&session) {
                Some(state) if state.ended.is_none() => {
                    let id = ReferenceSpaceId::next();
                    state.spaces.push((id, space));
                    resolver.resolve(id);
                }
                Some(_) => resolver.reject(XrError::SessionEnded(session)),
                None => resolver.reject(XrError::InvalidSession(session)),
            },
        }
    }

    fn schedule(&mut self, work: PendingWork) {
        if self.settings.completion_latency == 0 {
            self.complete(work);
        } else {
            self.pending.push(Pending {
                remaining: self.settings.completion_latency,
                work,
            });
        }
    }

    fn insert_layer(
        &mut self,
        session: SessionId,
        kind: EmulatedLayerKind,
        init: Option<QuadLayerInit>,
    ) -> LayerId {
        let id = LayerId::next();
        self.layers.insert(
            id,
            EmulatedLayer {
                session,
                kind,
                init,
                needs_redraw: true,
                uploads: 0,
                destroyed: false,
            },
        );
        id
    }
}

impl Default for EmulatedXrDevice {
    fn default() -> Self {
        Self::new(DeviceProfile::meta_quest_3(), EmulatorSettings::default())
    }
}

impl XrPlatform for EmulatedXrDevice {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn pump(&mut self) {
        let mut ready = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for mut pending in self.pending.drain(..) {
            pending.remaining = pending.remaining.saturating_sub(1);
            if pending.remaining == 0 {
                ready.push(pending.work);
            } else {
                waiting.push(pending);
            }
        }
        self.pending = waiting;
        for work in ready {
            self.complete(work);
        }
    }

    fn is_session_supported(&self, mode: SessionMode) -> Deferred<bool> {
        Deferred::ready(self.mode_supported(mode))
    }

    fn request_session(&mut self, mode: SessionMode, init: &SessionInit) -> Deferred<SessionId> {
        self.requests.push((mode, init.clone()));

        if self.fail_requests > 0 {
            self.fail_requests -= 1;
            return Deferred::failed(XrError::SessionUnavailable(format!(
                "{} request rejected by emulator",
                mode
            )));
        }
        if !self.mode_supported(mode) {
            return Deferred::failed(XrError::NotSupported(mode.to_string()));
        }
        if let Some(missing) = init
            .required_features
            .iter()
            .find(|f| !self.feature_available(**f))
        {
            return Deferred::failed(XrError::NotSupported(missing.as_str().to_string()));
        }
        if mode.is_immersive()
            && self
                .sessions
                .values()
                .any(|s| s.ended.is_none() && s.mode.is_immersive())
        {
            return Deferred::failed(XrError::Runtime(
                "an immersive session is already active".to_string(),
            ));
        }

        let layers_granted =
            init.requests(SessionFeature::Layers) && self.feature_available(SessionFeature::Layers);
        let id = SessionId::next();

        let mut render_layers = Vec::new();
        if layers_granted && self.settings.compositor_binding {
            render_layers.push(self.insert_layer(id, EmulatedLayerKind::Projection, None));
        }

        self.sessions.insert(
            id,
            EmulatedSession {
                mode,
                layers_granted,
                render_layers,
                spaces: Vec::new(),
                end_resolvers: Vec::new(),
                ended: None,
            },
        );

        log::info!(
            "Emulated {} session {} started (layers granted: {})",
            mode,
            id,
            layers_granted
        );
        Deferred::ready(id)
    }

    fn end_session(&mut self, session: SessionId) -> XrResult<()> {
        if !self.sessions.contains_key(&session) {
            return Err(XrError::InvalidSession(session));
        }
        self.finish_session(session, EndReason::User);
        Ok(())
    }

    fn session_end_signal(&mut self, session: SessionId) -> XrResult<Deferred<EndReason>> {
        let state = self
            .sessions
            .get_mut(&session)
            .ok_or(XrError::InvalidSession(session))?;
        if let Some(reason) = state.ended {
            return Ok(Deferred::ready(reason));
        }
        let (signal, resolver) = deferred();
        state.end_resolvers.push(resolver);
        Ok(signal)
    }

    fn supports_render_layers(&self, session: SessionId) -> bool {
        self.sessions
            .get(&session)
            .map(|s| s.layers_granted)
            .unwrap_or(false)
    }

    fn is_compositor_binding_available(&self) -> bool {
        self.settings.compositor_binding
    }

    fn make_context_xr_compatible(&mut self) -> Deferred<()> {
        if self.context_compatible {
            return Deferred::ready(());
        }
        let (compatible, resolver) = deferred();
        self.schedule(PendingWork::Compatible(resolver));
        compatible
    }

    fn request_reference_space(
        &mut self,
        session: SessionId,
        space: ReferenceSpaceType,
    ) -> Deferred<ReferenceSpaceId> {
        if let Err(e) = self.live_session(session) {
            return Deferred::failed(e);
        }
        let (reference, resolver) = deferred();
        self.schedule(PendingWork::ReferenceSpace {
            session,
            space,
            resolver,
        });
        reference
    }

    fn create_quad_layer(&mut self, session: SessionId, init: &QuadLayerInit) -> XrResult<LayerId> {
        self.check_layer_support(session)?;
        let id = self.insert_layer(session, EmulatedLayerKind::Quad, Some(init.clone()));
        log::debug!("Emulated quad layer {} ({}x{})", id, init.width, init.height);
        Ok(id)
    }

    fn create_media_quad_layer(
        &mut self,
        session: SessionId,
        media: MediaSourceId,
        init: &QuadLayerInit,
    ) -> XrResult<LayerId> {
        self.check_layer_support(session)?;
        let id = self.insert_layer(session, EmulatedLayerKind::MediaQuad(media), Some(init.clone()));
        log::debug!(
            "Emulated media quad layer {} for {} ({})",
            id,
            media,
            init.layout.as_str()
        );
        Ok(id)
    }

    fn render_state_layers(&self, session: SessionId) -> Vec<LayerId> {
        self.sessions
            .get(&session)
            .map(|s| s.render_layers.clone())
            .unwrap_or_default()
    }

    fn update_render_state(&mut self, session: SessionId, layers: &[LayerId]) -> XrResult<()> {
        let state = self.live_session(session)?;
        if !state.layers_granted && !layers.is_empty() {
            return Err(XrError::NotSupported("layers".to_string()));
        }
        for id in layers {
            match self.layers.get(id) {
                Some(layer) if layer.session == session && !layer.destroyed => {}
                _ => {
                    return Err(XrError::Runtime(format!(
                        "layer {} does not belong to session {}",
                        id, session
                    )))
                }
            }
        }
        if let Some(state) = self.sessions.get_mut(&session) {
            state.render_layers = layers.to_vec();
        }
        Ok(())
    }

    fn layer_needs_redraw(&self, layer: LayerId) -> bool {
        self.layers
            .get(&layer)
            .map(|l| l.needs_redraw && !l.destroyed)
            .unwrap_or(false)
    }

    fn upload_layer_texture(
        &mut self,
        layer: LayerId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> XrResult<()> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(XrError::Runtime(format!(
                "raster is {} bytes, expected {}",
                rgba.len(),
                expected
            )));
        }
        let state = self
            .layers
            .get_mut(&layer)
            .ok_or_else(|| XrError::Runtime(format!("unknown layer {}", layer)))?;
        if state.destroyed {
            return Err(XrError::SessionEnded(state.session));
        }
        if state.kind != EmulatedLayerKind::Quad {
            return Err(XrError::NotSupported(
                "texture upload into a non-quad layer".to_string(),
            ));
        }
        state.uploads += 1;
        state.needs_redraw = false;
        Ok(())
    }

    fn view_count(&self, session: SessionId) -> usize {
        match self.sessions.get(&session) {
            Some(s) if s.ended.is_none() && s.mode.is_immersive() => self.profile.views,
            _ => 1,
        }
    }

    fn input_sources(&self, session: SessionId) -> HandControllers {
        if self.is_session_active(session) {
            self.controllers.clone()
        } else {
            HandControllers::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers_init() -> SessionInit {
        SessionInit::new()
            .require(SessionFeature::LocalFloor)
            .optional(SessionFeature::Layers)
    }

    fn start(device: &mut EmulatedXrDevice, mode: SessionMode, init: &SessionInit) -> SessionId {
        let mut request = device.request_session(mode, init);
        match request.try_take() {
            Some(Ok(id)) => id,
            other => panic!("session request failed: {:?}", other),
        }
    }

    #[test]
    fn test_layers_session_gets_projection_layer() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveAr, &layers_init());
        assert!(device.supports_render_layers(session));
        assert_eq!(device.render_state_layers(session).len(), 1);
        assert_eq!(device.view_count(session), 2);
    }

    #[test]
    fn test_plain_session_has_no_layers() {
        let mut device = EmulatedXrDevice::default();
        let init = SessionInit::new().optional(SessionFeature::LocalFloor);
        let session = start(&mut device, SessionMode::ImmersiveVr, &init);
        assert!(!device.supports_render_layers(session));
        assert!(device.render_state_layers(session).is_empty());
    }

    #[test]
    fn test_unsupported_required_feature_rejects() {
        let mut device = EmulatedXrDevice::default();
        let init = SessionInit::new().require(SessionFeature::HandTracking);
        let mut request = device.request_session(SessionMode::ImmersiveVr, &init);
        assert!(matches!(request.try_take(), Some(Err(XrError::NotSupported(_)))));
    }

    #[test]
    fn test_second_immersive_session_rejected() {
        let mut device = EmulatedXrDevice::default();
        start(&mut device, SessionMode::ImmersiveVr, &SessionInit::new());
        let mut second = device.request_session(SessionMode::ImmersiveVr, &SessionInit::new());
        assert!(matches!(second.try_take(), Some(Err(XrError::Runtime(_)))));
    }

    #[test]
    fn test_completions_wait_for_pumps() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveAr, &layers_init());
        let mut compatible = device.make_context_xr_compatible();
        let mut space = device.request_reference_space(session, ReferenceSpaceType::LocalFloor);
        assert_eq!(device.pending_completions(), 2);

        device.pump();
        assert!(compatible.try_take().is_none());
        device.pump();
        assert_eq!(compatible.try_take(), Some(Ok(())));
        assert!(matches!(space.try_take(), Some(Ok(_))));
        assert!(device.is_context_xr_compatible());
    }

    #[test]
    fn test_reference_space_rejects_after_end() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveAr, &layers_init());
        let mut space = device.request_reference_space(session, ReferenceSpaceType::LocalFloor);
        device.end_session(session).unwrap();
        device.pump();
        device.pump();
        assert_eq!(space.try_take(), Some(Err(XrError::SessionEnded(session))));
    }

    #[test]
    fn test_end_signal_settles_once() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveVr, &SessionInit::new());
        let mut signal = device.session_end_signal(session).unwrap();
        assert!(!signal.is_settled());

        device.platform_end(session, EndReason::Platform);
        device.end_session(session).unwrap();
        assert_eq!(signal.try_take(), Some(Ok(EndReason::Platform)));
        assert_eq!(signal.try_take(), None);
    }

    #[test]
    fn test_media_layer_requires_layers_session() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveVr, &SessionInit::new());
        let init = QuadLayerInit::new(ReferenceSpaceId::next(), 1.0, 1.0, Pose::IDENTITY);
        let result = device.create_media_quad_layer(session, MediaSourceId::next(), &init);
        assert_eq!(result, Err(XrError::CompositorUnsupported));
    }

    #[test]
    fn test_upload_clears_redraw_flag() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveAr, &layers_init());
        let init = QuadLayerInit::new(ReferenceSpaceId::next(), 1.0, 1.0, Pose::IDENTITY)
            .with_view_pixels(2, 2);
        let layer = device.create_quad_layer(session, &init).unwrap();
        assert!(device.layer_needs_redraw(layer));

        device.upload_layer_texture(layer, 2, 2, &[0u8; 16]).unwrap();
        assert!(!device.layer_needs_redraw(layer));
        assert_eq!(device.layer(layer).map(|l| l.uploads), Some(1));
        assert!(device.upload_layer_texture(layer, 2, 2, &[0u8; 4]).is_err());
    }

    #[test]
    fn test_controllers_only_during_session() {
        let mut device = EmulatedXrDevice::default();
        let session = start(&mut device, SessionMode::ImmersiveVr, &SessionInit::new());
        assert!(device.input_sources(session).right.is_some());
        device.end_session(session).unwrap();
        assert!(device.input_sources(session).right.is_none());
    }
}
