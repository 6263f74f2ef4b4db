//! Video layer manager
//!
//! Owns the shared texture and whichever representation is active. The
//! manager decides what gets torn down: callers name the representation
//! they want and never say what was active before.

use std::sync::Arc;
use std::time::Duration;

use portal_render::{GroupId, RenderEngine};
use portal_xr::{LayerId, ReferenceSpaceId, SessionId, XrError, XrPlatform};

use crate::{
    CompositorQuadLayer, SharedTexture, StereoMeshPair, VideoLayerConfig, VideoLayerError,
    VideoLayerResult, VideoSource,
};

/// The two ways the video can be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    WebGlPlanes,
    CompositorLayer,
}

/// What `init_video_layer` produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerHandle {
    /// Mesh group attached to the scene
    Planes(GroupId),
    /// Compositor layer; nothing is attached to the scene
    Quad(LayerId),
}

impl LayerHandle {
    pub fn representation(&self) -> Representation {
        match self {
            Self::Planes(_) => Representation::WebGlPlanes,
            Self::Quad(_) => Representation::CompositorLayer,
        }
    }
}

/// Session and space a compositor layer is created in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorTarget {
    pub session: SessionId,
    pub space: ReferenceSpaceId,
}

#[derive(Debug)]
enum ActiveLayer {
    None,
    Planes(StereoMeshPair),
    Quad(CompositorQuadLayer),
}

/// Keeps at most one video representation alive
#[derive(Debug)]
pub struct VideoLayerManager {
    config: VideoLayerConfig,
    texture: SharedTexture,
    active: ActiveLayer,
    initialized: bool,
}

impl VideoLayerManager {
    pub fn new(
        config: VideoLayerConfig,
        source: Arc<dyn VideoSource>,
        engine: &mut dyn RenderEngine,
    ) -> VideoLayerResult<Self> {
        config.validate()?;
        let texture = SharedTexture::new(engine, source, config.refresh_hz)?;
        Ok(Self {
            config,
            texture,
            active: ActiveLayer::None,
            initialized: false,
        })
    }

    pub fn config(&self) -> &VideoLayerConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn VideoSource> {
        self.texture.source()
    }

    pub fn texture(&self) -> &SharedTexture {
        &self.texture
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn active(&self) -> Option<Representation> {
        match self.active {
            ActiveLayer::None => None,
            ActiveLayer::Planes(_) => Some(Representation::WebGlPlanes),
            ActiveLayer::Quad(_) => Some(Representation::CompositorLayer),
        }
    }

    pub fn handle(&self) -> Option<LayerHandle> {
        match &self.active {
            ActiveLayer::None => None,
            ActiveLayer::Planes(pair) => Some(LayerHandle::Planes(pair.group)),
            ActiveLayer::Quad(quad) => Some(LayerHandle::Quad(quad.layer)),
        }
    }

    pub fn planes(&self) -> Option<&StereoMeshPair> {
        match &self.active {
            ActiveLayer::Planes(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn quad_layer(&self) -> Option<&CompositorQuadLayer> {
        match &self.active {
            ActiveLayer::Quad(quad) => Some(quad),
            _ => None,
        }
    }

    /// Refresh timer handle, 0 while stopped
    pub fn refresh_handle(&self) -> u32 {
        self.texture.refresh_handle()
    }

    /// Show the video using `requested`.
    ///
    /// A compositor request needs a platform, a target, the compositor
    /// binding and a layers-capable session; without all four the WebGL
    /// planes are used instead. Fails with `DuplicateLayerInit` if a
    /// representation is already active.
    pub fn init_video_layer(
        &mut self,
        requested: Representation,
        engine: &mut dyn RenderEngine,
        platform: Option<&mut dyn XrPlatform>,
        target: Option<CompositorTarget>,
        now: Duration,
    ) -> VideoLayerResult<LayerHandle> {
        if let Some(active) = self.active() {
            return Err(VideoLayerError::DuplicateLayerInit(active));
        }

        if requested == Representation::CompositorLayer {
            match (platform, target) {
                (Some(platform), Some(target)) => match self.init_quad(platform, target) {
                    Ok(handle) => return Ok(handle),
                    Err(VideoLayerError::Xr(XrError::CompositorUnsupported)) => {
                        log::warn!("Compositor layers unsupported, staying on WebGL planes");
                    }
                    Err(e) => return Err(e),
                },
                _ => log::debug!("No compositor target, using WebGL planes"),
            }
        }

        self.init_planes(engine, now)
    }

    /// Tear down whatever is active and stop the refresh timer.
    /// Returns what was torn down; calling it again is a no-op.
    pub fn clear_video_layer(&mut self, engine: &mut dyn RenderEngine) -> Option<Representation> {
        self.mark_inactive();
        let cleared = self.active();

        match std::mem::replace(&mut self.active, ActiveLayer::None) {
            ActiveLayer::None => {}
            ActiveLayer::Planes(pair) => {
                log::info!("Remove video layer from WebGL plane geometry");
                pair.destroy(engine);
            }
            ActiveLayer::Quad(quad) => {
                // The runtime frees the layer itself when the session ends
                log::info!("Release compositor video layer {}", quad.layer);
            }
        }

        self.texture.stop_refresh();
        cleared
    }

    /// Switch to `requested` as one unit.
    ///
    /// No-op if `requested` is already active. If initialising the new
    /// representation fails, the WebGL planes are restored before the error
    /// is returned, so the video never ends up without a representation.
    pub fn transition_to(
        &mut self,
        requested: Representation,
        engine: &mut dyn RenderEngine,
        platform: Option<&mut dyn XrPlatform>,
        target: Option<CompositorTarget>,
        now: Duration,
    ) -> VideoLayerResult<LayerHandle> {
        if let Some(handle) = self.handle() {
            if handle.representation() == requested {
                return Ok(handle);
            }
        }

        self.clear_video_layer(engine);
        match self.init_video_layer(requested, engine, platform, target, now) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                log::warn!("Video layer transition to {:?} failed: {}", requested, e);
                if self.active().is_none() {
                    self.init_planes(engine, now)?;
                }
                Err(e)
            }
        }
    }

    /// Drive the texture refresh timer; only the WebGL planes sample it
    pub fn tick(&mut self, engine: &mut dyn RenderEngine, now: Duration) -> VideoLayerResult<bool> {
        if !matches!(self.active, ActiveLayer::Planes(_)) {
            return Ok(false);
        }
        self.texture.tick(engine, now)
    }

    fn init_planes(&mut self, engine: &mut dyn RenderEngine, now: Duration) -> VideoLayerResult<LayerHandle> {
        self.texture.start_refresh(now);

        let pair = match StereoMeshPair::build(engine, self.texture.id(), &self.config) {
            Ok(pair) => pair,
            Err(e) => {
                self.texture.stop_refresh();
                return Err(e);
            }
        };
        if let Err(e) = pair.attach(engine) {
            pair.destroy(engine);
            self.texture.stop_refresh();
            return Err(e);
        }

        log::info!("Add video layer using WebGL plane geometry");
        let handle = LayerHandle::Planes(pair.group);
        self.active = ActiveLayer::Planes(pair);
        self.mark_active();
        Ok(handle)
    }

    fn init_quad(
        &mut self,
        platform: &mut dyn XrPlatform,
        target: CompositorTarget,
    ) -> VideoLayerResult<LayerHandle> {
        if !platform.is_compositor_binding_available() || !platform.supports_render_layers(target.session) {
            return Err(XrError::CompositorUnsupported.into());
        }

        let quad = CompositorQuadLayer::create(
            platform,
            target.session,
            target.space,
            self.texture.source().media_id(),
            &self.config,
        )?;
        let handle = LayerHandle::Quad(quad.layer);
        self.active = ActiveLayer::Quad(quad);
        self.mark_active();
        Ok(handle)
    }

    fn mark_active(&mut self) {
        self.initialized = true;
    }

    fn mark_inactive(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VideoElement;
    use portal_render::HeadlessEngine;
    use portal_xr::{EmulatedXrDevice, SessionFeature, SessionInit, SessionMode};

    fn manager(engine: &mut HeadlessEngine) -> VideoLayerManager {
        let video = Arc::new(VideoElement::new("clip.webm", 2064, 2208));
        VideoLayerManager::new(VideoLayerConfig::default(), video, engine).unwrap()
    }

    fn layers_session(device: &mut EmulatedXrDevice) -> CompositorTarget {
        let init = SessionInit::new().optional(SessionFeature::Layers);
        let session = device
            .request_session(SessionMode::ImmersiveAr, &init)
            .try_take()
            .unwrap()
            .unwrap();
        CompositorTarget {
            session,
            space: ReferenceSpaceId::next(),
        }
    }

    #[test]
    fn test_planes_init() {
        let mut engine = HeadlessEngine::new();
        let mut manager = manager(&mut engine);

        let handle = manager
            .init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();
        let LayerHandle::Planes(group) = handle else {
            panic!("expected planes, got {:?}", handle);
        };
        let meshes = engine.group_meshes(group);
        assert_eq!(meshes.len(), 2);
        let left = engine.mesh(meshes[0]).unwrap();
        let right = engine.mesh(meshes[1]).unwrap();
        assert_eq!(left.layers.mask(), 1 << 1);
        assert_eq!(right.layers.mask(), 1 << 2);
        assert_eq!(left.texture, right.texture);
        assert!(manager.is_initialized());
        assert_ne!(manager.refresh_handle(), 0);
    }

    #[test]
    fn test_duplicate_init_rejected() {
        let mut engine = HeadlessEngine::new();
        let mut manager = manager(&mut engine);
        manager
            .init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();
        let second =
            manager.init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO);
        assert_eq!(
            second,
            Err(VideoLayerError::DuplicateLayerInit(Representation::WebGlPlanes))
        );
        assert_eq!(engine.attached_meshes().len(), 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut engine = HeadlessEngine::new();
        let mut manager = manager(&mut engine);
        manager
            .init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();

        assert_eq!(manager.clear_video_layer(&mut engine), Some(Representation::WebGlPlanes));
        assert_eq!(manager.refresh_handle(), 0);
        assert_eq!(manager.clear_video_layer(&mut engine), None);
        assert_eq!(manager.refresh_handle(), 0);
        assert!(!manager.is_initialized());
        assert!(engine.attached_meshes().is_empty());
    }

    #[test]
    fn test_compositor_without_platform_falls_back() {
        let mut engine = HeadlessEngine::new();
        let mut manager = manager(&mut engine);
        let handle = manager
            .init_video_layer(Representation::CompositorLayer, &mut engine, None, None, Duration::ZERO)
            .unwrap();
        assert_eq!(handle.representation(), Representation::WebGlPlanes);
    }

    #[test]
    fn test_compositor_init_creates_one_media_layer() {
        let mut engine = HeadlessEngine::new();
        let mut device = EmulatedXrDevice::default();
        let target = layers_session(&mut device);
        let mut manager = manager(&mut engine);

        let handle = manager
            .init_video_layer(
                Representation::CompositorLayer,
                &mut engine,
                Some(&mut device),
                Some(target),
                Duration::ZERO,
            )
            .unwrap();
        assert_eq!(handle.representation(), Representation::CompositorLayer);
        assert_eq!(device.media_layer_count(), 1);
        assert!(engine.attached_groups().is_empty());
        assert_eq!(manager.refresh_handle(), 0);
    }

    #[test]
    fn test_compositor_unsupported_falls_back() {
        let mut engine = HeadlessEngine::new();
        let mut device = EmulatedXrDevice::default();
        let session = device
            .request_session(SessionMode::ImmersiveVr, &SessionInit::new())
            .try_take()
            .unwrap()
            .unwrap();
        let target = CompositorTarget {
            session,
            space: ReferenceSpaceId::next(),
        };
        let mut manager = manager(&mut engine);

        let handle = manager
            .init_video_layer(
                Representation::CompositorLayer,
                &mut engine,
                Some(&mut device),
                Some(target),
                Duration::ZERO,
            )
            .unwrap();
        assert_eq!(handle.representation(), Representation::WebGlPlanes);
        assert_eq!(device.media_layer_count(), 0);
    }

    #[test]
    fn test_transition_round_trip() {
        let mut engine = HeadlessEngine::new();
        let mut device = EmulatedXrDevice::default();
        let target = layers_session(&mut device);
        let mut manager = manager(&mut engine);
        manager
            .init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();

        manager
            .transition_to(
                Representation::CompositorLayer,
                &mut engine,
                Some(&mut device),
                Some(target),
                Duration::ZERO,
            )
            .unwrap();
        assert!(engine.attached_meshes().is_empty());

        manager
            .transition_to(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();
        assert_eq!(manager.active(), Some(Representation::WebGlPlanes));
        assert_eq!(engine.attached_meshes().len(), 2);
    }

    #[test]
    fn test_failed_transition_restores_planes() {
        let mut engine = HeadlessEngine::new();
        let mut device = EmulatedXrDevice::default();
        let target = layers_session(&mut device);
        device.end_session(target.session).unwrap();
        let mut manager = manager(&mut engine);
        manager
            .init_video_layer(Representation::WebGlPlanes, &mut engine, None, None, Duration::ZERO)
            .unwrap();

        let result = manager.transition_to(
            Representation::CompositorLayer,
            &mut engine,
            Some(&mut device),
            Some(target),
            Duration::ZERO,
        );
        assert!(matches!(result, Err(VideoLayerError::Xr(XrError::SessionEnded(_)))));
        assert_eq!(manager.active(), Some(Representation::WebGlPlanes));
        assert_eq!(engine.attached_meshes().len(), 2);
    }
}
