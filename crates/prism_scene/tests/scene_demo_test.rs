//! # Scene Demo Integration Test
//!
//! Runs the demo scene from a configuration file, the way `scene_demo` does.

use prism_core::EcsError;
use prism_scene::{Scene, SceneConfig};

#[test]
fn test_scene_from_config_file() {
    let path = std::env::temp_dir().join(format!("prism_scene_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "[ecs]\nmax_entities = 64\n\n[demo]\nentity_count = 20\nframes = 5\ndespawn_every = 1\n",
    )
    .unwrap();

    let config = SceneConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut scene = Scene::new(&config).unwrap();
    scene.populate().unwrap();
    let reports = scene.run().unwrap();

    assert_eq!(reports.len(), 5);
    for (index, report) in reports.iter().enumerate() {
        assert_eq!(report.frame as usize, index + 1);
        assert_eq!(report.living, 20);
        assert_eq!(report.replaced, 1);
        assert!(report.draws <= report.renderable);
    }

    // Every slot ever handed out is either in use or free again.
    let render = scene.render();
    assert!(render.cached_entities() <= render.slot_high_water() as usize);
    assert_eq!(render.lifecycle().deleted, 5);
}

#[test]
fn test_population_beyond_capacity_fails() {
    let mut config = SceneConfig::default();
    config.ecs.max_entities = 8;
    config.demo.entity_count = 8;
    assert!(matches!(Scene::new(&config), Err(EcsError::InvalidConfig(_))));
}

#[test]
fn test_churn_at_full_population_recycles_ids() {
    let mut config = SceneConfig::default();
    config.ecs.max_entities = 9;
    config.demo.entity_count = 8;
    config.demo.frames = 40;
    config.demo.despawn_every = 1;

    let mut scene = Scene::new(&config).unwrap();
    scene.populate().unwrap();
    let reports = scene.run().unwrap();

    assert!(reports.iter().all(|report| report.living == 8));
    assert!(scene.props().all(|entity| entity.id() < 9));
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        SceneConfig::load("/nonexistent/scene.toml"),
        Err(EcsError::ConfigIo { .. })
    ));
}
