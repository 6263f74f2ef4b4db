//! XR platform capability trait

use crate::{
    Deferred, EndReason, HandControllers, LayerId, MediaSourceId, QuadLayerInit,
    ReferenceSpaceId, ReferenceSpaceType, SessionId, SessionInit, SessionMode, XrResult,
};

/// Everything the demo core needs from an XR runtime and its GPU binding.
///
/// Implementations are driven from a single loop. Methods returning
/// [`Deferred`] may settle on a later [`pump`](XrPlatform::pump), in any
/// order relative to frame boundaries.
pub trait XrPlatform {
    /// Runtime name, for logs
    fn name(&self) -> &str;

    /// Run queued runtime work between frames
    fn pump(&mut self);

    /// Whether a session of this mode can be requested at all
    fn is_session_supported(&self, mode: SessionMode) -> Deferred<bool>;

    /// Request a session; rejects if the mode or a required feature is unavailable
    fn request_session(&mut self, mode: SessionMode, init: &SessionInit) -> Deferred<SessionId>;

    /// Ask the runtime to end a session. Ending an ended session is a no-op.
    fn end_session(&mut self, session: SessionId) -> XrResult<()>;

    /// Completion that settles exactly once, when the session ends for any reason
    fn session_end_signal(&mut self, session: SessionId) -> XrResult<Deferred<EndReason>>;

    /// Whether the session was granted the layers feature (render state carries a layer list)
    fn supports_render_layers(&self, session: SessionId) -> bool;

    /// Whether GL and media bindings for compositor layers exist in this runtime
    fn is_compositor_binding_available(&self) -> bool;

    /// Make the GPU context usable for XR layer rendering
    fn make_context_xr_compatible(&mut self) -> Deferred<()>;

    fn request_reference_space(
        &mut self,
        session: SessionId,
        space: ReferenceSpaceType,
    ) -> Deferred<ReferenceSpaceId>;

    /// Quad layer backed by a GPU texture the application uploads into
    fn create_quad_layer(&mut self, session: SessionId, init: &QuadLayerInit) -> XrResult<LayerId>;

    /// Quad layer sampling a media element directly, no application upload path
    fn create_media_quad_layer(
        &mut self,
        session: SessionId,
        media: MediaSourceId,
        init: &QuadLayerInit,
    ) -> XrResult<LayerId>;

    /// Layers currently installed in the session's render state, back to front
    fn render_state_layers(&self, session: SessionId) -> Vec<LayerId>;

    /// Replace the session's render state layer list, back to front
    fn update_render_state(&mut self, session: SessionId, layers: &[LayerId]) -> XrResult<()>;

    /// Whether the runtime lost or cleared the layer's texture contents
    fn layer_needs_redraw(&self, layer: LayerId) -> bool;

    /// Copy an RGBA raster into the layer's color texture for the current frame
    fn upload_layer_texture(
        &mut self,
        layer: LayerId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> XrResult<()>;

    /// Number of views (eyes) the session renders
    fn view_count(&self, session: SessionId) -> usize;

    /// Connected controllers and their current button state
    fn input_sources(&self, session: SessionId) -> HandControllers;
}

impl<P: XrPlatform + ?Sized> XrPlatform for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn pump(&mut self) {
        (**self).pump()
    }

    fn is_session_supported(&self, mode: SessionMode) -> Deferred<bool> {
        (**self).is_session_supported(mode)
    }

    fn request_session(&mut self, mode: SessionMode, init: &SessionInit) -> Deferred<SessionId> {
        (**self).request_session(mode, init)
    }

    fn end_session(&mut self, session: SessionId) -> XrResult<()> {
        (**self).end_session(session)
    }

    fn session_end_signal(&mut self, session: SessionId) -> XrResult<Deferred<EndReason>> {
        (**self).session_end_signal(session)
    }

    fn supports_render_layers(&self, session: SessionId) -> bool {
        (**self).supports_render_layers(session)
    }

    fn is_compositor_binding_available(&self) -> bool {
        (**self).is_compositor_binding_available()
    }

    fn make_context_xr_compatible(&mut self) -> Deferred<()> {
        (**self).make_context_xr_compatible()
    }

    fn request_reference_space(
        &mut self,
        session: SessionId,
        space: ReferenceSpaceType,
    ) -> Deferred<ReferenceSpaceId> {
        (**self).request_reference_space(session, space)
    }

    fn create_quad_layer(&mut self, session: SessionId, init: &QuadLayerInit) -> XrResult<LayerId> {
        (**self).create_quad_layer(session, init)
    }

    fn create_media_quad_layer(
        &mut self,
        session: SessionId,
        media: MediaSourceId,
        init: &QuadLayerInit,
    ) -> XrResult<LayerId> {
        (**self).create_media_quad_layer(session, media, init)
    }

    fn render_state_layers(&self, session: SessionId) -> Vec<LayerId> {
        (**self).render_state_layers(session)
    }

    fn update_render_state(&mut self, session: SessionId, layers: &[LayerId]) -> XrResult<()> {
        (**self).update_render_state(session, layers)
    }

    fn layer_needs_redraw(&self, layer: LayerId) -> bool {
        (**self).layer_needs_redraw(layer)
    }

    fn upload_layer_texture(
        &mut self,
        layer: LayerId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> XrResult<()> {
        (**self).upload_layer_texture(layer, width, height, rgba)
    }

    fn view_count(&self, session: SessionId) -> usize {
        (**self).view_count(session)
    }

    fn input_sources(&self, session: SessionId) -> HandControllers {
        (**self).input_sources(session)
    }
}
