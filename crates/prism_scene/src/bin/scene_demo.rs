//! # PRISM Scene Demo
//!
//! Headless driver for the render system. Builds a scene, runs a few
//! frames, and prints what each frame would submit to the GPU.
//!
//! ```bash
//! # Defaults
//! ./scene_demo
//!
//! # From a config file
//! ./scene_demo scene.toml
//! ```

use prism_core::EcsResult;
use prism_scene::{Scene, SceneConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("   ✗ FATAL: {e}");
        std::process::exit(1);
    }
}

fn run() -> EcsResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading configuration from {path}");
            SceneConfig::load(&path)?
        }
        None => SceneConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════");
    println!("                  PRISM SCENE DEMO");
    println!("═══════════════════════════════════════════════════════════");
    println!("  max entities:   {}", config.ecs.max_entities);
    println!("  props:          {}", config.demo.entity_count);
    println!("  frames:         {}", config.demo.frames);
    println!("  despawn every:  {}", config.demo.despawn_every);
    println!();

    let mut scene = Scene::new(&config)?;
    scene.populate()?;

    println!("  frame │ living │ renderable │ draws │ replaced │ upload bytes");
    println!("  ──────┼────────┼────────────┼───────┼──────────┼─────────────");
    for report in scene.run()? {
        println!(
            "  {:>5} │ {:>6} │ {:>10} │ {:>5} │ {:>8} │ {:>12}",
            report.frame,
            report.living,
            report.renderable,
            report.draws,
            report.replaced,
            report.upload_bytes
        );
    }

    let lifecycle = scene.render().lifecycle();
    println!();
    println!(
        "  ✓ {} created, {} deleted, {} render slots in use (high water {})",
        lifecycle.created,
        lifecycle.deleted,
        scene.render().cached_entities(),
        scene.render().slot_high_water()
    );
    Ok(())
}
