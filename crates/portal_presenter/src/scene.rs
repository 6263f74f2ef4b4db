//! Scene update seam

use serde_json::Value;

use portal_render::ClipPlane;
use portal_xr::SessionId;

/// Per-frame input to the scene
#[derive(Debug, Clone, Copy)]
pub struct SceneFrame<'a> {
    pub session: Option<SessionId>,
    pub delta: f32,
    pub elapsed: f32,
    /// Inbound event for this frame, if any
    pub inbound: Option<&'a Value>,
    pub clipping_planes: &'a [ClipPlane],
}

/// Application scene logic, called once per frame after input and layer
/// bookkeeping
pub trait SceneUpdate {
    /// `outbound`, when present, receives messages the scene wants to send
    fn update(&mut self, frame: SceneFrame<'_>, outbound: Option<&mut dyn FnMut(Value)>);
}

/// Scene that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyScene;

impl SceneUpdate for EmptyScene {
    fn update(&mut self, _frame: SceneFrame<'_>, _outbound: Option<&mut dyn FnMut(Value)>) {}
}
