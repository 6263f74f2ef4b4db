//! # portal_xr - XR platform abstraction
//!
//! The seam between the demo core and whatever provides immersive sessions:
//! a browser WebXR runtime, a native runtime, or the bundled emulated device.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  portal_presenter (session lifecycle, frame loop)            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  portal_xr (this crate)                                      │
//! │  ├─ XrPlatform trait        capability queries + requests    │
//! │  ├─ Deferred / Resolver     single-shot async completions    │
//! │  ├─ QuadLayerInit           compositor layer descriptors     │
//! │  └─ EmulatedXrDevice        fallback runtime, test double    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  XR runtime (WebXR / emulator)                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call that can suspend on a real runtime (session request,
//! reference space request, context compatibility negotiation) returns a
//! [`Deferred`]. Callers either `.await` it or poll it once per frame with
//! [`Deferred::try_take`].

pub mod error;
pub mod deferred;
pub mod session;
pub mod layer;
pub mod input;
pub mod platform;
pub mod emulated;

pub use error::{XrError, XrResult};
pub use deferred::{deferred, Deferred, Resolver};
pub use session::{EndReason, ReferenceSpaceType, SessionFeature, SessionInit, SessionMode};
pub use layer::{QuadLayerInit, StereoLayout};
pub use input::{GamepadButton, GamepadState, Hand, HandControllers, InputSource};
pub use platform::XrPlatform;
pub use emulated::{DeviceProfile, EmulatedXrDevice, EmulatorSettings};

use glam::{Mat4, Quat, Vec3};
use portal_core::define_id;

define_id!(
    /// Identity of one XR session, unique for the life of the process
    SessionId
);

define_id!(
    /// Reference space obtained from a session
    ReferenceSpaceId
);

define_id!(
    /// Compositor layer (quad, media quad or projection)
    LayerId
);

define_id!(
    /// Media element a compositor layer can sample directly
    MediaSourceId
);

define_id!(
    /// Tracked input device (controller)
    InputDeviceId
);

/// Pose (position + orientation), the rigid transform of a layer or controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Create a new pose
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    /// Translation only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Convert to transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        deferred, Deferred, Resolver, XrError, XrResult, XrPlatform,
        SessionId, ReferenceSpaceId, LayerId, MediaSourceId, InputDeviceId, Pose,
        SessionMode, SessionFeature, SessionInit, ReferenceSpaceType, EndReason,
        QuadLayerInit, StereoLayout,
        Hand, HandControllers, InputSource, GamepadButton, GamepadState,
        EmulatedXrDevice, EmulatorSettings, DeviceProfile,
    };
}
