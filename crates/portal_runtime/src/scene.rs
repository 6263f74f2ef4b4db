//! Demo scene: a floor plane and a rotating cube in front of the viewer

use glam::{Quat, Vec3};
use serde_json::{json, Value};

use portal_presenter::{SceneFrame, SceneUpdate};
use portal_render::{GroupId, MeshDesc, PlaneGeometry, RenderEngine, RenderResult, TextureSource};

/// Where the scene group sits
const SCENE_ORIGIN: Vec3 = Vec3::new(0.0, -0.5, -2.5);
const CUBE_SIZE: f32 = 0.25;
/// Radians per frame about x and y
const CUBE_SPIN: f32 = 0.01;

pub struct DemoScene {
    group: Option<GroupId>,
    cube_rotation: (f32, f32),
    frames: u64,
    inbound_events: usize,
}

impl DemoScene {
    pub fn new() -> Self {
        Self {
            group: None,
            cube_rotation: (0.0, 0.0),
            frames: 0,
            inbound_events: 0,
        }
    }

    /// Add the floor and the cube faces to the engine's scene
    pub fn install(&mut self, engine: &mut dyn RenderEngine) -> RenderResult<GroupId> {
        let texture = engine.create_texture(TextureSource::Raster { width: 64, height: 64 })?;
        let group = engine.create_group();

        let floor = MeshDesc::new("floor", PlaneGeometry::new(4.0, 4.0), texture).placed(
            SCENE_ORIGIN + Vec3::new(0.0, -1.0, 0.0),
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        );
        let floor = engine.create_mesh(floor)?;
        engine.add_to_group(group, floor)?;

        for (name, rotation) in cube_faces() {
            let offset = rotation * Vec3::new(0.0, 0.0, CUBE_SIZE / 2.0);
            let face = MeshDesc::new(name, PlaneGeometry::new(CUBE_SIZE, CUBE_SIZE), texture)
                .placed(SCENE_ORIGIN + offset, rotation);
            let face = engine.create_mesh(face)?;
            engine.add_to_group(group, face)?;
        }

        engine.attach(group)?;
        self.group = Some(group);
        log::info!("Demo scene installed");
        Ok(group)
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn cube_rotation(&self) -> (f32, f32) {
        self.cube_rotation
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn inbound_events(&self) -> usize {
        self.inbound_events
    }
}

impl Default for DemoScene {
    fn default() -> Self {
        Self::new()
    }
}

fn cube_faces() -> [(&'static str, Quat); 6] {
    use std::f32::consts::{FRAC_PI_2, PI};
    [
        ("cube_front", Quat::IDENTITY),
        ("cube_back", Quat::from_rotation_y(PI)),
        ("cube_left", Quat::from_rotation_y(-FRAC_PI_2)),
        ("cube_right", Quat::from_rotation_y(FRAC_PI_2)),
        ("cube_top", Quat::from_rotation_x(-FRAC_PI_2)),
        ("cube_bottom", Quat::from_rotation_x(FRAC_PI_2)),
    ]
}

impl SceneUpdate for DemoScene {
    fn update(&mut self, frame: SceneFrame<'_>, outbound: Option<&mut dyn FnMut(Value)>) {
        self.frames += 1;

        if let Some(event) = frame.inbound {
            self.inbound_events += 1;
            log::info!("Scene data in: {}", event);
        }

        self.cube_rotation.0 += CUBE_SPIN;
        self.cube_rotation.1 += CUBE_SPIN;

        if let Some(send) = outbound {
            send(json!({
                "frame": self.frames,
                "elapsed": frame.elapsed,
                "cube_rotation": [self.cube_rotation.0, self.cube_rotation.1],
            }));
        }
    }
}
