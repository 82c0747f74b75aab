//! # PRISM Scene
//!
//! Scene data and the render system that consumes the ECS core.
//!
//! The render system is an ordinary collaborator of the coordinator:
//! 1. It registers the components it needs, then itself, with a required
//!    signature of `{Transform, MeshRenderer}`.
//! 2. Its "added" callback is the only place per-entity render state is
//!    created; "removed" is the only place it is released.
//! 3. It listens to [`EntityChanged`](prism_core::EntityChanged) without
//!    knowing which system caused the change.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prism_core::Coordinator;
//! use prism_scene::{MaterialHandle, MeshHandle, MeshRenderer, RenderSystem, Transform};
//!
//! let mut ecs = Coordinator::default();
//! let render = RenderSystem::install(&mut ecs)?;
//!
//! let entity = ecs.create_entity()?;
//! ecs.add_component(entity, Transform::from_translation([0.0, 1.0, 0.0]))?;
//! ecs.add_component(entity, MeshRenderer::new(MeshHandle(0), MaterialHandle(0)))?;
//!
//! let draws = render.build_draw_list(&ecs)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod components;
pub mod config;
pub mod render;
pub mod scene;

pub use components::{MaterialHandle, MeshHandle, MeshRenderer, Name, Transform};
pub use config::{DemoConfig, SceneConfig};
pub use render::{instance_bytes, DrawCommand, InstanceData, LifecycleStats, RenderSystem};
pub use scene::{FrameReport, Scene};
