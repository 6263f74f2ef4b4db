//! Plane geometry and mesh descriptors

use glam::{Quat, Vec2, Vec3};

use crate::{CameraLayers, TextureId};

/// Sub-rectangle of a texture in UV space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    /// Bottom-left corner
    pub offset: Vec2,
    /// Size relative to the full texture
    pub scale: Vec2,
}

impl UvRect {
    /// The whole texture
    pub const FULL: UvRect = UvRect {
        offset: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Left half of a side-by-side frame
    pub const LEFT_HALF: UvRect = UvRect {
        offset: Vec2::ZERO,
        scale: Vec2::new(0.5, 1.0),
    };

    /// Right half of a side-by-side frame
    pub const RIGHT_HALF: UvRect = UvRect {
        offset: Vec2::new(0.5, 0.0),
        scale: Vec2::new(0.5, 1.0),
    };

    /// Map a unit-square coordinate into this rectangle
    pub fn map(&self, uv: Vec2) -> Vec2 {
        uv * self.scale + self.offset
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A single-segment plane facing +Z, baked with a translation
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneGeometry {
    /// Width in meters
    pub width: f32,
    /// Height in meters
    pub height: f32,
    /// Translation applied to the vertices
    pub translation: Vec3,
    /// Part of the texture mapped onto the plane
    pub uv: UvRect,
}

impl PlaneGeometry {
    /// Centered plane showing the full texture
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            translation: Vec3::ZERO,
            uv: UvRect::FULL,
        }
    }

    /// Bake an extra offset into the vertices
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.translation += offset;
        self
    }

    /// Sample only `uv` of the texture
    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }

    /// Vertex positions in the order top-left, top-right, bottom-left, bottom-right
    pub fn positions(&self) -> [Vec3; 4] {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        let t = self.translation;
        [
            Vec3::new(-hw, hh, 0.0) + t,
            Vec3::new(hw, hh, 0.0) + t,
            Vec3::new(-hw, -hh, 0.0) + t,
            Vec3::new(hw, -hh, 0.0) + t,
        ]
    }

    /// Texture coordinates matching [`positions`](Self::positions)
    pub fn uvs(&self) -> [Vec2; 4] {
        [
            self.uv.map(Vec2::new(0.0, 1.0)),
            self.uv.map(Vec2::new(1.0, 1.0)),
            self.uv.map(Vec2::new(0.0, 0.0)),
            self.uv.map(Vec2::new(1.0, 0.0)),
        ]
    }
}

/// Half-space used to clip scene content
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPlane {
    /// Unit normal pointing at the kept side
    pub normal: Vec3,
    pub constant: f32,
}

impl ClipPlane {
    /// Plane `normal . p + constant = 0`; the normal is normalized
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            constant,
        }
    }

    /// Signed distance; content with a negative distance is clipped
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Everything needed to create a textured mesh
#[derive(Clone, Debug, PartialEq)]
pub struct MeshDesc {
    /// Debug name, shown in logs
    pub name: String,
    pub geometry: PlaneGeometry,
    pub texture: TextureId,
    /// Camera layers that draw the mesh
    pub layers: CameraLayers,
    /// Object position, applied after the baked translation
    pub position: Vec3,
    pub rotation: Quat,
}

impl MeshDesc {
    /// Mesh at the origin, visible on the default camera layer
    pub fn new(name: impl Into<String>, geometry: PlaneGeometry, texture: TextureId) -> Self {
        Self {
            name: name.into(),
            geometry,
            texture,
            layers: CameraLayers::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    /// Restrict the mesh to a single camera layer
    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layers = CameraLayers::only(layer);
        self
    }

    /// Set the object transform
    pub fn placed(mut self, position: Vec3, rotation: Quat) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }
}
