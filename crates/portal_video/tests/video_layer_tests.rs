//! Video layer manager behaviour across representations

use std::sync::Arc;
use std::time::Duration;

use portal_render::{HeadlessEngine, RenderEngine};
use portal_video::prelude::*;

fn setup(config: VideoLayerConfig) -> (HeadlessEngine, VideoLayerManager) {
    let mut engine = HeadlessEngine::new();
    let video = Arc::new(VideoElement::new("stereo.webm", 2064, 2208));
    let manager = VideoLayerManager::new(config, video, &mut engine).unwrap();
    (engine, manager)
}

fn init_planes(engine: &mut HeadlessEngine, manager: &mut VideoLayerManager) -> LayerHandle {
    manager
        .init_video_layer(Representation::WebGlPlanes, engine, None, None, Duration::ZERO)
        .unwrap()
}

#[test]
fn planes_are_eye_tagged_and_share_texture() {
    for reducer in [0.0, 0.0906, 0.25] {
        let config = VideoLayerConfig {
            video_reducer: reducer,
            ..Default::default()
        };
        let (mut engine, mut manager) = setup(config);
        let LayerHandle::Planes(group) = init_planes(&mut engine, &mut manager) else {
            panic!("expected WebGL planes");
        };

        let meshes: Vec<_> = engine
            .group_meshes(group)
            .into_iter()
            .filter_map(|m| engine.mesh(m).cloned())
            .collect();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].layers.mask(), 0b010);
        assert_eq!(meshes[1].layers.mask(), 0b100);
        assert_eq!(meshes[0].texture, meshes[1].texture);
        assert_eq!(meshes[0].texture, manager.texture().id());
    }
}

#[test]
fn clear_twice_leaves_timer_stopped() {
    let (mut engine, mut manager) = setup(VideoLayerConfig::default());
    init_planes(&mut engine, &mut manager);
    assert_ne!(manager.refresh_handle(), 0);

    manager.clear_video_layer(&mut engine);
    manager.clear_video_layer(&mut engine);
    assert_eq!(manager.refresh_handle(), 0);
    assert!(!manager.texture().is_refreshing());
    assert_eq!(manager.active(), None);
}

#[test]
fn init_clear_init_attaches_once() {
    let (mut engine, mut manager) = setup(VideoLayerConfig::default());
    init_planes(&mut engine, &mut manager);
    manager.clear_video_layer(&mut engine);
    init_planes(&mut engine, &mut manager);

    assert_eq!(engine.attached_groups().len(), 1);
    assert_eq!(engine.attached_meshes().len(), 2);
    assert_eq!(engine.mesh_count(), 2);
}

#[test]
fn reference_placement() {
    let config = VideoLayerConfig {
        video_width: 2064,
        video_height: 2208,
        video_reducer: 0.0906,
        mesh_width: 5.0,
        ..Default::default()
    };
    let (mut engine, mut manager) = setup(config.clone());
    init_planes(&mut engine, &mut manager);

    let planes = manager.planes().unwrap();
    let left = engine.mesh(planes.left).unwrap();
    assert!((left.geometry.translation.x - (config.video_center_x + 0.0906)).abs() < 1e-6);
    assert!((left.geometry.height - 5.348).abs() < 1e-3);
    assert_eq!(left.geometry.translation.z, config.video_depth_z);
}

#[test]
fn refresh_only_while_planes_active() {
    let (mut engine, mut manager) = setup(VideoLayerConfig::default());
    manager.source().play();
    init_planes(&mut engine, &mut manager);
    assert!(manager.tick(&mut engine, Duration::from_millis(50)).unwrap());

    manager.clear_video_layer(&mut engine);
    assert!(!manager.tick(&mut engine, Duration::from_millis(200)).unwrap());
}
