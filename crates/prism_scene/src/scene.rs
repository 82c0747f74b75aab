//! # Demo Scene
//!
//! A headless scene driven frame by frame: props drift upward, the oldest
//! prop is periodically replaced, and every frame ends with a draw list.
//!
//! Props follow a fixed pattern by spawn serial `s`:
//! - mesh `s % 4`, material `s % 3`
//! - every fifth prop is hidden
//! - every seventh prop has no renderer and never joins the render system

use std::collections::VecDeque;

use prism_core::{Coordinator, EcsResult, Entity};

use crate::components::{MaterialHandle, MeshHandle, MeshRenderer, Name, Transform};
use crate::config::{DemoConfig, SceneConfig};
use crate::render::{instance_bytes, LifecycleStats, RenderSystem};

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u32,
    /// Living entities after the frame.
    pub living: u32,
    /// Entities in the render system.
    pub renderable: usize,
    /// Draw commands emitted.
    pub draws: usize,
    /// Entities replaced this frame.
    pub replaced: u32,
    /// Bytes of instance data ready for upload.
    pub upload_bytes: usize,
    /// Lifecycle traffic since the scene started.
    pub lifecycle: LifecycleStats,
}

/// A coordinator, its render system, and the demo's spawn bookkeeping.
pub struct Scene {
    ecs: Coordinator,
    render: RenderSystem,
    demo: DemoConfig,
    /// Props in spawn order, oldest first.
    props: VecDeque<Entity>,
    next_serial: u32,
    frame: u32,
}

impl Scene {
    /// Builds an empty scene.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or registration failures.
    pub fn new(config: &SceneConfig) -> EcsResult<Self> {
        config.validate()?;
        let mut ecs = Coordinator::new(config.ecs.clone())?;
        ecs.register_component::<Transform>()?;
        ecs.register_component::<MeshRenderer>()?;
        ecs.register_component::<Name>()?;
        let render = RenderSystem::install(&mut ecs)?;

        Ok(Self {
            ecs,
            render,
            demo: config.demo.clone(),
            props: VecDeque::with_capacity(config.demo.entity_count as usize),
            next_serial: 0,
            frame: 0,
        })
    }

    /// Spawns `entity_count` props.
    ///
    /// # Errors
    ///
    /// Entity pool exhaustion.
    pub fn populate(&mut self) -> EcsResult<()> {
        for _ in 0..self.demo.entity_count {
            self.spawn_prop()?;
        }
        tracing::debug!(props = self.props.len(), "scene populated");
        Ok(())
    }

    /// Spawns the next prop in the pattern.
    ///
    /// # Errors
    ///
    /// Entity pool exhaustion.
    pub fn spawn_prop(&mut self) -> EcsResult<Entity> {
        let serial = self.next_serial;
        self.next_serial += 1;

        let entity = self.ecs.create_entity()?;
        self.ecs.add_component(
            entity,
            Transform::from_translation([(serial % 16) as f32, 0.0, (serial / 16) as f32]),
        )?;
        self.ecs.add_component(entity, Name(format!("prop-{serial:04}")))?;
        if serial % 7 != 6 {
            self.ecs.add_component(
                entity,
                MeshRenderer {
                    mesh: MeshHandle(serial % 4),
                    material: MaterialHandle(serial % 3),
                    visible: serial % 5 != 4,
                },
            )?;
        }

        self.props.push_back(entity);
        Ok(entity)
    }

    /// Advances one frame of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Any coordinator error; the scene is left mid-frame.
    pub fn step(&mut self, dt: f32) -> EcsResult<FrameReport> {
        self.frame += 1;

        for transform in self.ecs.components_mut::<Transform>()? {
            transform.translate([0.0, dt, 0.0]);
        }

        let mut replaced = 0;
        if self.demo.despawn_every > 0 && self.frame % self.demo.despawn_every == 0 {
            if let Some(oldest) = self.props.pop_front() {
                self.ecs.destroy_entity(oldest)?;
                self.spawn_prop()?;
                replaced += 1;
            }
        }

        let draws = self.render.build_draw_list(&self.ecs)?;
        let report = FrameReport {
            frame: self.frame,
            living: self.ecs.living_count(),
            renderable: self.ecs.system_entities::<RenderSystem>()?.len(),
            draws: draws.len(),
            replaced,
            upload_bytes: instance_bytes(&draws).len(),
            lifecycle: self.render.lifecycle(),
        };
        tracing::trace!(frame = report.frame, draws = report.draws, "frame complete");
        Ok(report)
    }

    /// Runs the configured number of frames at 60 Hz.
    ///
    /// # Errors
    ///
    /// The first error any frame reports.
    pub fn run(&mut self) -> EcsResult<Vec<FrameReport>> {
        (0..self.demo.frames).map(|_| self.step(1.0 / 60.0)).collect()
    }

    /// The name of `entity`, if it has one.
    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.ecs
            .get_component::<Name>(entity)
            .ok()
            .map(|name| name.0.as_str())
    }

    /// Props in spawn order, oldest first.
    pub fn props(&self) -> impl Iterator<Item = Entity> + '_ {
        self.props.iter().copied()
    }

    /// The coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.ecs
    }

    /// The coordinator, mutably.
    pub fn coordinator_mut(&mut self) -> &mut Coordinator {
        &mut self.ecs
    }

    /// The render system.
    #[must_use]
    pub fn render(&self) -> &RenderSystem {
        &self.render
    }
}
