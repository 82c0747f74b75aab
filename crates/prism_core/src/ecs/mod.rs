//! # Entity Component System
//!
//! Signature-based ECS with packed component storage.
//!
//! ## Design Philosophy
//!
//! - Entities are plain non-zero ids, recycled oldest-first
//! - Each entity owns a bitset signature with one bit per component family
//! - Components of one type live in a single dense array (swap-and-pop)
//! - Systems declare a required signature and are told when entities
//!   start or stop matching it
//! - Cross-system notification goes through a synchronous event bus

mod component;
mod coordinator;
mod entity;
mod event;
mod registry;
mod signal;
mod signature;
mod storage;
mod system;

pub use component::{Component, ComponentManager};
pub use coordinator::{Coordinator, EntityChangeKind, EntityChanged, SharedCoordinator};
pub use entity::{Entity, EntityManager};
pub use event::{Event, EventBus, Receiver};
pub use registry::{ComponentFamily, EventFamily, FamilyId, FamilyKind, SystemFamily, TypeRegistry};
pub use signal::{Connection, Signal};
pub use signature::{Signature, SIGNATURE_BITS};
pub use storage::ComponentArray;
pub use system::{MembershipChange, System, SystemRegistry};
