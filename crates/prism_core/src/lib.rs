//! # PRISM Core Engine
//!
//! Entity Component System runtime for the PRISM renderer and editor.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────────┐
//!   create/destroy   │                      │
//!   add/remove  ───> │     Coordinator      │ ───> EntityChanged events
//!                    │                      │
//!                    └──┬───────┬───────┬───┘
//!                       │       │       │
//!            ┌──────────┘       │       └───────────┐
//!            v                  v                   v
//!   ┌────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//!   │ EntityManager  │ │ ComponentManager│ │ SystemRegistry  │
//!   │ ids+signatures │ │ packed arrays   │ │ membership sets │
//!   └────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Explicit registration** - component, system and event types get their
//!    family ids during a bootstrap phase, in call order.
//! 2. **Dense storage** - every component type lives in one packed array that
//!    never has holes.
//! 3. **Fail at the call site** - every contract violation is returned as an
//!    [`EcsError`] from the call that caused it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prism_core::{Component, Coordinator, EcsConfig, Signature, System};
//!
//! struct Position { x: f32, y: f32, z: f32 }
//! impl Component for Position {}
//!
//! struct Physics;
//! impl System for Physics {}
//!
//! let mut ecs = Coordinator::new(EcsConfig::default())?;
//! let position = ecs.register_component::<Position>()?;
//! ecs.register_system::<Physics>(Signature::EMPTY.with(position))?;
//!
//! let entity = ecs.create_entity()?;
//! ecs.add_component(entity, Position { x: 1.0, y: 2.0, z: 3.0 })?;
//! assert!(ecs.system_entities::<Physics>()?.contains(&entity));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::EcsConfig;
pub use ecs::{
    ComponentArray, ComponentFamily, ComponentManager, Component, Connection, Coordinator,
    Entity, EntityChangeKind, EntityChanged, EntityManager, Event, EventBus, EventFamily,
    FamilyId, FamilyKind, MembershipChange, Receiver, SharedCoordinator, Signal, Signature,
    System, SystemFamily, SystemRegistry, TypeRegistry, SIGNATURE_BITS,
};
pub use error::{EcsError, EcsResult};
