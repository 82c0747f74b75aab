//! # Coordinator
//!
//! The single facade over entities, components, systems and events. It owns
//! the lifecycle protocol, so callers never touch the managers directly for
//! mutation.
//!
//! ## Entity lifecycle
//!
//! ```text
//! FREE ──create──> LIVE(∅) ──add/remove*──> LIVE(S) ──destroy──> FREE
//!                  │                                  │
//!                  └─ EntityChanged::Created          └─ EntityChanged::Deleted
//! ```
//!
//! Destruction runs in a fixed order:
//! 1. validate the entity
//! 2. emit `Deleted` with the final signature
//! 3. purge every component named by the signature
//! 4. drop the entity from every system ("removed" fires for members)
//! 5. release the id
//!
//! ## Threading
//!
//! The coordinator is `Send` but not shared by itself. Wrap it with
//! [`Coordinator::into_shared`] to serialize every mutation behind one lock.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::component::{Component, ComponentManager};
use super::entity::{Entity, EntityManager};
use super::event::{Event, EventBus, Receiver};
use super::registry::{ComponentFamily, EventFamily, SystemFamily};
use super::signal::Connection;
use super::signature::Signature;
use super::storage::ComponentArray;
use super::system::{MembershipChange, System, SystemRegistry};
use crate::config::EcsConfig;
use crate::error::EcsResult;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityChangeKind {
    /// The entity was just created. Its signature is empty.
    Created,
    /// The entity is about to be torn down. Its components still exist.
    Deleted,
}

/// Built-in lifecycle event, registered by every coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityChanged {
    /// The entity concerned.
    pub entity: Entity,
    /// Created or deleted.
    pub kind: EntityChangeKind,
    /// Signature at the time of the event; the final one for `Deleted`.
    pub signature: Signature,
}

impl Event for EntityChanged {}

/// A coordinator behind a single lock.
pub type SharedCoordinator = Arc<Mutex<Coordinator>>;

/// Facade composing the entity, component, system and event managers.
pub struct Coordinator {
    entities: EntityManager,
    components: ComponentManager,
    systems: SystemRegistry,
    events: EventBus,
    config: EcsConfig,
}

impl Coordinator {
    /// Builds a coordinator sized by `config` and registers [`EntityChanged`].
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`](crate::EcsError::InvalidConfig) if a limit
    /// is out of range.
    pub fn new(config: EcsConfig) -> EcsResult<Self> {
        config.validate()?;

        let mut events = EventBus::new(config.max_event_types);
        events.register::<EntityChanged>()?;

        tracing::debug!(
            max_entities = config.max_entities,
            max_component_types = config.max_component_types,
            preallocate = config.preallocate_components,
            "coordinator ready"
        );

        Ok(Self {
            entities: EntityManager::new(config.max_entities),
            components: ComponentManager::new(
                config.max_component_types,
                config.max_entities,
                config.preallocation(),
            ),
            systems: SystemRegistry::new(config.max_system_types),
            events,
            config,
        })
    }

    /// The configuration this coordinator was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Moves the coordinator behind a lock for use from several threads.
    #[must_use]
    pub fn into_shared(self) -> SharedCoordinator {
        Arc::new(Mutex::new(self))
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Creates an entity with an empty signature and emits
    /// [`EntityChangeKind::Created`].
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityCapacityExceeded`](crate::EcsError::EntityCapacityExceeded)
    /// if every id is in use.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.entities.create()?;
        self.events.emit(&EntityChanged {
            entity,
            kind: EntityChangeKind::Created,
            signature: Signature::EMPTY,
        })?;
        Ok(entity)
    }

    /// Destroys `entity` and everything attached to it.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`](crate::EcsError::EntityOutOfRange)
    /// - [`EcsError::EntityNotAlive`](crate::EcsError::EntityNotAlive) on
    ///   double destroy. Nothing is emitted in that case.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        let signature = self.entities.signature(entity)?;

        self.events.emit(&EntityChanged {
            entity,
            kind: EntityChangeKind::Deleted,
            signature,
        })?;
        self.components.entity_destroyed(entity, signature);
        self.systems.entity_destroyed(entity, signature);
        self.entities.destroy(entity)
    }

    /// Number of living entities.
    #[inline]
    #[must_use]
    pub fn living_count(&self) -> u32 {
        self.entities.living_count()
    }

    /// Checks whether `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Living entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// The signature of a living entity.
    ///
    /// # Errors
    ///
    /// Same as [`Coordinator::destroy_entity`].
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.entities.signature(entity)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Registers `T` and returns its family.
    ///
    /// # Errors
    ///
    /// Double registration, or the component limit is reached.
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentFamily> {
        self.components.register::<T>()
    }

    /// The family of `T`.
    ///
    /// # Errors
    ///
    /// `T` is not registered.
    pub fn component_family<T: Component>(&self) -> EcsResult<ComponentFamily> {
        self.components.family_of::<T>()
    }

    /// Attaches `value` to `entity`, sets its signature bit and re-evaluates
    /// system membership.
    ///
    /// Returns `true` if the `T` array reallocated and moved every stored `T`.
    /// Never `true` for a preallocated array within its population.
    ///
    /// # Errors
    ///
    /// Dead entity, unregistered `T`, or `entity` already has a `T`. The
    /// entity is unchanged on error.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<bool> {
        self.entities.signature(entity)?;
        let family = self.components.family_of::<T>()?;
        let reallocated = self.components.add(entity, value)?;

        let signature = self.entities.update_signature(entity, family, true)?;
        self.systems.entity_signature_changed(entity, signature);
        Ok(reallocated)
    }

    /// Detaches and returns the `T` of `entity`, clears its signature bit and
    /// re-evaluates system membership.
    ///
    /// # Errors
    ///
    /// Dead entity, unregistered `T`, or `entity` has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.entities.signature(entity)?;
        let family = self.components.family_of::<T>()?;
        let value = self.components.remove::<T>(entity)?;

        let signature = self.entities.update_signature(entity, family, false)?;
        self.systems.entity_signature_changed(entity, signature);
        Ok(value)
    }

    /// The `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Dead entity, unregistered `T`, or `entity` has no `T`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.entities.signature(entity)?;
        self.components.get::<T>(entity)
    }

    /// The `T` of `entity`, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`Coordinator::get_component`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.entities.signature(entity)?;
        self.components.get_mut::<T>(entity)
    }

    /// Checks whether `entity` has a `T`. Dead entities and unregistered
    /// types report `false`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity) && self.components.has::<T>(entity)
    }

    /// Number of stored `T` values.
    ///
    /// # Errors
    ///
    /// `T` is not registered.
    pub fn component_count<T: Component>(&self) -> EcsResult<usize> {
        self.components.count::<T>()
    }

    /// The packed array of `T`.
    ///
    /// # Errors
    ///
    /// `T` is not registered.
    pub fn components<T: Component>(&self) -> EcsResult<&ComponentArray<T>> {
        self.components.array::<T>()
    }

    /// The packed array of `T`, mutably. Values may change; membership may not.
    ///
    /// # Errors
    ///
    /// `T` is not registered.
    pub fn components_mut<T: Component>(&mut self) -> EcsResult<&mut [T]> {
        Ok(self.components.array_mut::<T>()?.as_mut_slice())
    }

    /// The component manager, read-only.
    #[inline]
    #[must_use]
    pub fn component_manager(&self) -> &ComponentManager {
        &self.components
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Registers `S` with its required signature.
    ///
    /// Living entities are not evaluated against a new system; register
    /// systems before populating the world.
    ///
    /// # Errors
    ///
    /// Double registration, or the system limit is reached.
    pub fn register_system<S: System>(&mut self, required: Signature) -> EcsResult<SystemFamily> {
        self.systems.register::<S>(required)
    }

    /// Replaces the required signature of `S` without re-evaluating members.
    ///
    /// # Errors
    ///
    /// `S` is not registered.
    pub fn set_system_signature<S: System>(&mut self, required: Signature) -> EcsResult<()> {
        self.systems.set_signature::<S>(required)
    }

    /// The required signature of `S`.
    ///
    /// # Errors
    ///
    /// `S` is not registered.
    pub fn system_signature<S: System>(&self) -> EcsResult<Signature> {
        self.systems.signature::<S>()
    }

    /// Entities currently matching `S`, in id order.
    ///
    /// # Errors
    ///
    /// `S` is not registered.
    pub fn system_entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        self.systems.entities::<S>()
    }

    /// Connects `callback` to the "added" notification of `S`.
    ///
    /// # Errors
    ///
    /// `S` is not registered.
    pub fn on_system_added<S, F>(&self, callback: F) -> EcsResult<Connection>
    where
        S: System,
        F: FnMut(&MembershipChange) + Send + 'static,
    {
        self.systems.on_added::<S, F>(callback)
    }

    /// Connects `callback` to the "removed" notification of `S`.
    ///
    /// # Errors
    ///
    /// `S` is not registered.
    pub fn on_system_removed<S, F>(&self, callback: F) -> EcsResult<Connection>
    where
        S: System,
        F: FnMut(&MembershipChange) + Send + 'static,
    {
        self.systems.on_removed::<S, F>(callback)
    }

    /// The system registry, read-only.
    #[inline]
    #[must_use]
    pub fn system_registry(&self) -> &SystemRegistry {
        &self.systems
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Registers `E`.
    ///
    /// # Errors
    ///
    /// Double registration, or the event limit is reached.
    pub fn register_event<E: Event>(&mut self) -> EcsResult<EventFamily> {
        self.events.register::<E>()
    }

    /// Subscribes `receiver` to `E`.
    ///
    /// # Errors
    ///
    /// `E` is not registered, or `receiver` is already subscribed.
    pub fn subscribe<E, F>(&self, receiver: &mut Receiver, callback: F) -> EcsResult<()>
    where
        E: Event,
        F: FnMut(&E) + Send + 'static,
    {
        self.events.subscribe::<E, F>(receiver, callback)
    }

    /// Removes the subscription of `receiver` to `E`.
    ///
    /// # Errors
    ///
    /// `E` is not registered, or `receiver` is not subscribed to it.
    pub fn unsubscribe<E: Event>(&self, receiver: &mut Receiver) -> EcsResult<()> {
        self.events.unsubscribe::<E>(receiver)
    }

    /// Delivers `event` to every subscriber of `E`. Returns how many ran.
    ///
    /// # Errors
    ///
    /// `E` is not registered.
    pub fn emit<E: Event>(&self, event: &E) -> EcsResult<usize> {
        self.events.emit(event)
    }

    /// Number of receivers subscribed to any event.
    #[must_use]
    pub fn total_connected_receivers(&self) -> usize {
        self.events.total_connected_receivers()
    }

    /// Number of registered event types, [`EntityChanged`] included.
    #[must_use]
    pub fn total_events(&self) -> usize {
        self.events.total_events()
    }

    /// The event bus, read-only.
    #[inline]
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(EcsConfig::default()).expect("default configuration is valid")
    }
}
