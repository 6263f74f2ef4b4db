//! Camera layer masks
//!
//! Every mesh carries a layer mask, every camera carries one too, and a
//! mesh is drawn by a camera only when the masks intersect. Stereo video
//! relies on this: the left plane lives on layer 1, the right plane on
//! layer 2, and each eye's camera enables only its own layer.

use std::fmt;

/// 32-bit visibility mask; layer 0 is the default layer
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraLayers(u32);

impl CameraLayers {
    pub const NONE: CameraLayers = CameraLayers(0);
    /// Left-eye-only content
    pub const LEFT_EYE: u8 = 1;
    /// Right-eye-only content
    pub const RIGHT_EYE: u8 = 2;

    /// Mask containing exactly one layer
    pub fn only(layer: u8) -> Self {
        Self(1 << (layer as u32 & 31))
    }

    /// Replace the mask with a single layer
    pub fn set(&mut self, layer: u8) {
        *self = Self::only(layer);
    }

    pub fn enable(&mut self, layer: u8) {
        self.0 |= 1 << (layer as u32 & 31);
    }

    pub fn disable(&mut self, layer: u8) {
        self.0 &= !(1 << (layer as u32 & 31));
    }

    pub fn contains(&self, layer: u8) -> bool {
        self.0 & (1 << (layer as u32 & 31)) != 0
    }

    /// True if any layer is shared
    pub fn test(&self, other: CameraLayers) -> bool {
        self.0 & other.0 != 0
    }

    pub fn mask(&self) -> u32 {
        self.0
    }
}

impl Default for CameraLayers {
    fn default() -> Self {
        Self::only(0)
    }
}

impl fmt::Debug for CameraLayers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraLayers({:#05b})", self.0)
    }
}

/// The preview camera plus the per-eye sub-cameras used while presenting
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRig {
    pub main: CameraLayers,
    pub left_eye: CameraLayers,
    pub right_eye: CameraLayers,
    presenting: bool,
    stereo: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        let mut rig = Self {
            main: CameraLayers::default(),
            left_eye: CameraLayers::default(),
            right_eye: CameraLayers::default(),
            presenting: false,
            stereo: false,
        };
        rig.configure(false, false);
        rig
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set layer visibility for the current presentation mode.
    ///
    /// The preview camera always shows the left view (layers 0 and 1) so
    /// a flat display gets one coherent image. While presenting in stereo,
    /// the left sub-camera sees {0, 1} and the right sub-camera {0, 2}.
    pub fn configure(&mut self, presenting: bool, stereo: bool) {
        self.presenting = presenting;
        self.stereo = presenting && stereo;

        self.main = CameraLayers::default();
        self.main.enable(CameraLayers::LEFT_EYE);

        self.left_eye = CameraLayers::default();
        self.right_eye = CameraLayers::default();
        if self.stereo {
            self.left_eye.enable(CameraLayers::LEFT_EYE);
            self.right_eye.enable(CameraLayers::RIGHT_EYE);
        } else {
            self.left_eye = self.main;
            self.right_eye = self.main;
        }
    }

    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    /// Masks of the cameras that actually render this frame
    pub fn views(&self) -> Vec<CameraLayers> {
        if self.stereo {
            vec![self.left_eye, self.right_eye]
        } else {
            vec![self.main]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_mask() {
        let mut layers = CameraLayers::default();
        layers.enable(3);
        layers.set(2);
        assert_eq!(layers.mask(), 0b100);
        assert!(!layers.contains(0));
    }

    #[test]
    fn test_preview_mask() {
        let rig = CameraRig::new();
        assert_eq!(rig.main.mask(), 0b011);
        assert_eq!(rig.views(), vec![rig.main]);
    }

    #[test]
    fn test_stereo_masks() {
        let mut rig = CameraRig::new();
        rig.configure(true, true);
        assert_eq!(rig.left_eye.mask(), 0b011);
        assert_eq!(rig.right_eye.mask(), 0b101);
        assert_eq!(rig.views().len(), 2);
    }

    #[test]
    fn test_presenting_mono_falls_back_to_preview() {
        let mut rig = CameraRig::new();
        rig.configure(true, false);
        assert!(rig.is_presenting());
        assert!(!rig.is_stereo());
        assert_eq!(rig.views(), vec![CameraLayers(0b011)]);
    }

    #[test]
    fn test_eye_layers_isolate() {
        let mut rig = CameraRig::new();
        rig.configure(true, true);
        let left_mesh = CameraLayers::only(CameraLayers::LEFT_EYE);
        let right_mesh = CameraLayers::only(CameraLayers::RIGHT_EYE);
        assert!(rig.left_eye.test(left_mesh));
        assert!(!rig.left_eye.test(right_mesh));
        assert!(rig.right_eye.test(right_mesh));
        assert!(!rig.right_eye.test(left_mesh));
    }
}
