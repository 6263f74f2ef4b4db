//! # portal_presenter - session lifecycle and frame loop
//!
//! Ties the XR platform, the render engine and the video layer manager
//! together:
//!
//! - [`SessionLifecycleController`] requests sessions (layers-capable
//!   first, then a reduced request), starts them and reverses the video
//!   transition when they end
//! - [`CompositorSetup`] promotes the video to a compositor layer once the
//!   binding is ready, checking session liveness at every step
//! - [`FrameLoopCoordinator`] runs the per-frame pipeline
//! - [`PortalApp`] owns all of the above for a host loop
//!
//! Everything runs on the host's single loop; the only asynchrony is
//! runtime completions, polled once per frame.

pub mod error;
pub mod timing;
pub mod input;
pub mod scene;
pub mod overlay;
pub mod compositor_setup;
pub mod session;
pub mod frame_loop;
pub mod app;

pub use error::{SessionError, SessionResult};
pub use timing::{FrameClock, FrameTime};
pub use input::{ActionContext, ControllerInput, EndSessionGesture, GamepadTracker, InputOutcome};
pub use scene::{EmptyScene, SceneFrame, SceneUpdate};
pub use overlay::GuiOverlay;
pub use compositor_setup::{CompositorSetup, SetupContext, SetupPhase};
pub use session::{
    LifecycleState, SessionContext, SessionGrant, SessionLifecycleController, XrEntryState,
};
pub use frame_loop::{FrameContext, FrameLoopCoordinator, FrameReport};
pub use app::PortalApp;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        ActionContext, CompositorSetup, ControllerInput, EmptyScene, EndSessionGesture,
        FrameClock, FrameLoopCoordinator, FrameReport, FrameTime, GuiOverlay, LifecycleState,
        PortalApp, SceneFrame, SceneUpdate, SessionError, SessionLifecycleController,
        SessionResult, SetupPhase, XrEntryState,
    };
}
