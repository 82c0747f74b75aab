//! # System Registry
//!
//! Tracks, per system type, a required signature and the set of entities
//! currently matching it.
//!
//! ## Invariants
//! - After every processed signature change, a system's set is exactly the
//!   living entities whose signature contains the required bits.
//! - "added" fires only when an entity enters a set, "removed" only when it
//!   leaves one. Re-asserting a match, or losing one that was never held,
//!   is silent.
//! - Notifications fire synchronously, in system registration order.
//!
//! ## Known limitation
//! [`SystemRegistry::set_signature`] does not re-evaluate entities that are
//! already alive. The new requirement applies from each entity's next
//! signature change.

use std::any::type_name;
use std::collections::BTreeSet;

use super::entity::Entity;
use super::registry::{FamilyId, FamilyKind, SystemFamily, TypeRegistry};
use super::signal::{Connection, Signal};
use super::signature::Signature;
use crate::error::{EcsError, EcsResult};

/// Marker trait for system types.
///
/// The registry keys systems by type; the system value itself lives wherever
/// the application keeps it.
pub trait System: 'static {}

/// Payload of a system's added/removed notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipChange {
    /// The entity that entered or left the system.
    pub entity: Entity,
    /// The entity's signature at the time of the change.
    pub signature: Signature,
}

struct SystemDescriptor {
    name: &'static str,
    required: Signature,
    entities: BTreeSet<Entity>,
    added: Signal<MembershipChange>,
    removed: Signal<MembershipChange>,
}

/// Membership bookkeeping for every registered system.
pub struct SystemRegistry {
    registry: TypeRegistry<SystemFamily>,
    /// Descriptors in registration order; `family - 1` indexes this.
    systems: Vec<SystemDescriptor>,
}

impl SystemRegistry {
    /// Creates a registry that accepts family ids `1..limit`.
    ///
    /// # Panics
    ///
    /// Panics if `limit < 2`.
    #[must_use]
    pub fn new(limit: u8) -> Self {
        Self {
            registry: TypeRegistry::new(limit),
            systems: Vec::with_capacity(usize::from(limit)),
        }
    }

    /// Registers `S` with its required signature and an empty entity set.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeAlreadyRegistered`] on double registration.
    /// - [`EcsError::FamilyCapacityExceeded`] if the limit is reached.
    pub fn register<S: System>(&mut self, required: Signature) -> EcsResult<SystemFamily> {
        let family = self.registry.register::<S>()?;
        self.systems.push(SystemDescriptor {
            name: type_name::<S>(),
            required,
            entities: BTreeSet::new(),
            added: Signal::new(),
            removed: Signal::new(),
        });
        tracing::debug!(system = type_name::<S>(), required = ?required, "registered system");
        Ok(family)
    }

    /// Replaces the required signature of `S`. Existing members are not
    /// re-evaluated.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    pub fn set_signature<S: System>(&mut self, required: Signature) -> EcsResult<()> {
        let descriptor = self.descriptor_mut::<S>()?;
        descriptor.required = required;
        tracing::debug!(
            system = descriptor.name,
            required = ?required,
            members = descriptor.entities.len(),
            "system signature changed without re-evaluation"
        );
        Ok(())
    }

    /// The required signature of `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    pub fn signature<S: System>(&self) -> EcsResult<Signature> {
        Ok(self.descriptor::<S>()?.required)
    }

    /// The entities currently matching `S`, in id order.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    pub fn entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        Ok(&self.descriptor::<S>()?.entities)
    }

    /// Checks whether `entity` is a member of `S`. Unknown systems report `false`.
    #[must_use]
    pub fn contains<S: System>(&self, entity: Entity) -> bool {
        self.descriptor::<S>()
            .map_or(false, |descriptor| descriptor.entities.contains(&entity))
    }

    /// The family id of `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    #[inline]
    pub fn family_of<S: System>(&self) -> EcsResult<SystemFamily> {
        self.registry.family_of::<S>()
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Connects `callback` to the "added" notification of `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    pub fn on_added<S, F>(&self, callback: F) -> EcsResult<Connection>
    where
        S: System,
        F: FnMut(&MembershipChange) + Send + 'static,
    {
        Ok(self.descriptor::<S>()?.added.connect(callback))
    }

    /// Connects `callback` to the "removed" notification of `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `S` is unknown.
    pub fn on_removed<S, F>(&self, callback: F) -> EcsResult<Connection>
    where
        S: System,
        F: FnMut(&MembershipChange) + Send + 'static,
    {
        Ok(self.descriptor::<S>()?.removed.connect(callback))
    }

    /// Re-evaluates every system against `signature`, the new signature of
    /// `entity`.
    pub fn entity_signature_changed(&mut self, entity: Entity, signature: Signature) {
        let change = MembershipChange { entity, signature };
        for descriptor in &mut self.systems {
            if signature.matches(descriptor.required) {
                if descriptor.entities.insert(entity) {
                    tracing::trace!(system = descriptor.name, entity = entity.id(), "entity added");
                    descriptor.added.emit(&change);
                }
            } else if descriptor.entities.remove(&entity) {
                tracing::trace!(system = descriptor.name, entity = entity.id(), "entity removed");
                descriptor.removed.emit(&change);
            }
        }
    }

    /// Drops `entity` from every system it belongs to. `signature` is the
    /// entity's final signature, passed through to "removed" listeners.
    pub fn entity_destroyed(&mut self, entity: Entity, signature: Signature) {
        let change = MembershipChange { entity, signature };
        for descriptor in &mut self.systems {
            if descriptor.entities.remove(&entity) {
                tracing::trace!(system = descriptor.name, entity = entity.id(), "entity removed on destroy");
                descriptor.removed.emit(&change);
            }
        }
    }

    fn descriptor<S: System>(&self) -> EcsResult<&SystemDescriptor> {
        let family = self.registry.family_of::<S>()?;
        self.systems
            .get(family.index() - 1)
            .ok_or_else(not_registered::<S>)
    }

    fn descriptor_mut<S: System>(&mut self) -> EcsResult<&mut SystemDescriptor> {
        let family = self.registry.family_of::<S>()?;
        self.systems
            .get_mut(family.index() - 1)
            .ok_or_else(not_registered::<S>)
    }
}

fn not_registered<S>() -> EcsError {
    EcsError::TypeNotRegistered {
        kind: FamilyKind::System,
        type_name: type_name::<S>(),
    }
}
