//! # Component System
//!
//! Components are pure data containers with no behavior. Each component type
//! is registered once, receives a [`ComponentFamily`], and gets one packed
//! [`ComponentArray`] owned by the [`ComponentManager`].

use std::any::type_name;

use super::entity::Entity;
use super::registry::{ComponentFamily, FamilyId, FamilyKind, TypeRegistry};
use super::signature::Signature;
use super::storage::{ComponentArray, ErasedComponentArray};
use crate::error::{EcsError, EcsResult};

/// Marker trait for ECS components.
///
/// Components must be `Send` so a coordinator can be moved behind a lock
/// when worker threads are introduced.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Position {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Send + 'static {}

/// Owns one packed array per registered component type.
///
/// Arrays live in a table indexed by family id. The table entry for id 0 is
/// always empty.
pub struct ComponentManager {
    /// Type to family mapping.
    registry: TypeRegistry<ComponentFamily>,
    /// Type-erased arrays indexed by family id.
    arrays: Vec<Option<Box<dyn ErasedComponentArray>>>,
    /// Exclusive entity id bound handed to every new array.
    max_entities: u32,
    /// Slots to reserve in every new array, if any.
    preallocate: Option<usize>,
}

impl ComponentManager {
    /// Creates a manager that accepts family ids `1..limit` and entity ids
    /// `1..max_entities`.
    ///
    /// With `preallocate = Some(n)` every registered array reserves `n`
    /// slots up front and does not reallocate until it holds more.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is outside `2..=SIGNATURE_BITS`.
    #[must_use]
    pub fn new(limit: u8, max_entities: u32, preallocate: Option<usize>) -> Self {
        assert!(
            usize::from(limit) <= super::signature::SIGNATURE_BITS,
            "Component limit cannot exceed the signature width"
        );
        Self {
            registry: TypeRegistry::new(limit),
            arrays: std::iter::repeat_with(|| None).take(usize::from(limit)).collect(),
            max_entities,
            preallocate,
        }
    }

    /// Registers `T` and allocates its array.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeAlreadyRegistered`] on double registration.
    /// - [`EcsError::FamilyCapacityExceeded`] if the limit is reached.
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentFamily> {
        let family = self.registry.register::<T>()?;
        let array = match self.preallocate {
            Some(capacity) => ComponentArray::<T>::with_capacity(capacity),
            None => ComponentArray::<T>::new(),
        }
        .with_max_entities(self.max_entities);
        self.arrays[family.index()] = Some(Box::new(array));
        Ok(family)
    }

    /// Returns the family of `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `T` was never registered.
    #[inline]
    pub fn family_of<T: Component>(&self) -> EcsResult<ComponentFamily> {
        self.registry.family_of::<T>()
    }

    /// Number of registered component types.
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.registry.len()
    }

    /// The underlying type registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry<ComponentFamily> {
        &self.registry
    }

    /// Attaches `value` to `entity`. Returns whether the array reallocated.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeNotRegistered`] if `T` is unknown.
    /// - [`EcsError::EntityOutOfRange`] if the id is not below `max_entities`.
    /// - [`EcsError::ComponentAlreadyPresent`] if `entity` already has a `T`.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<bool> {
        self.array_mut::<T>()?.insert(entity, value)
    }

    /// Detaches and returns the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeNotRegistered`] if `T` is unknown.
    /// - [`EcsError::ComponentMissing`] if `entity` has no `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.array_mut::<T>()?.remove(entity)
    }

    /// Returns the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentManager::remove`].
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.array::<T>()?.get(entity)
    }

    /// Returns the `T` of `entity` mutably.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentManager::remove`].
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.array_mut::<T>()?.get_mut(entity)
    }

    /// Checks whether `entity` has a `T`. Unregistered types report `false`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.array::<T>().map_or(false, |array| array.contains(entity))
    }

    /// Number of stored `T` values.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `T` is unknown.
    pub fn count<T: Component>(&self) -> EcsResult<usize> {
        Ok(self.array::<T>()?.len())
    }

    /// Total number of stored components across every type.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.arrays.iter().flatten().map(|array| array.len()).sum()
    }

    /// The packed array of `T`, for iteration.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `T` is unknown.
    pub fn array<T: Component>(&self) -> EcsResult<&ComponentArray<T>> {
        let family = self.family_of::<T>()?;
        self.arrays[family.index()]
            .as_deref()
            .and_then(|array| array.as_any().downcast_ref::<ComponentArray<T>>())
            .ok_or_else(not_registered::<T>)
    }

    /// The packed array of `T`, mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `T` is unknown.
    pub fn array_mut<T: Component>(&mut self) -> EcsResult<&mut ComponentArray<T>> {
        let family = self.family_of::<T>()?;
        self.arrays[family.index()]
            .as_deref_mut()
            .and_then(|array| array.as_any_mut().downcast_mut::<ComponentArray<T>>())
            .ok_or_else(not_registered::<T>)
    }

    /// Purges `entity` from every array whose bit is set in `signature`.
    ///
    /// Bits without a registered array are ignored. Returns the number of
    /// components removed.
    pub fn entity_destroyed(&mut self, entity: Entity, signature: Signature) -> usize {
        let mut removed = 0;
        for bit in signature.bits_set() {
            let slot = self.arrays.get_mut(usize::from(bit)).and_then(Option::as_mut);
            if let Some(array) = slot {
                if array.remove_entity(entity) {
                    removed += 1;
                }
            }
        }
        tracing::trace!(entity = entity.id(), removed, "purged components");
        removed
    }
}

fn not_registered<T>() -> EcsError {
    EcsError::TypeNotRegistered {
        kind: FamilyKind::Component,
        type_name: type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }
    impl Component for Position {}

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Velocity(f32);
    impl Component for Velocity {}

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    fn entity(id: u32) -> Entity {
        Entity::from_raw(id).unwrap()
    }

    #[test]
    fn test_register_assigns_sequential_families() {
        let mut manager = ComponentManager::new(32, 64, None);
        assert_eq!(manager.register::<Position>().unwrap().get(), 1);
        assert_eq!(manager.register::<Velocity>().unwrap().get(), 2);
        assert_eq!(manager.type_count(), 2);

        assert!(matches!(
            manager.register::<Position>(),
            Err(EcsError::TypeAlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_unregistered_type_is_rejected() {
        let mut manager = ComponentManager::new(32, 64, None);
        assert!(matches!(
            manager.add(entity(1), Health(3)),
            Err(EcsError::TypeNotRegistered { kind: FamilyKind::Component, .. })
        ));
        assert!(!manager.has::<Health>(entity(1)));
        assert!(manager.count::<Health>().is_err());
    }

    #[test]
    fn test_add_get_remove() {
        let mut manager = ComponentManager::new(32, 64, None);
        manager.register::<Position>().unwrap();

        let e = entity(1);
        manager.add(e, Position { x: 1.0, y: 2.0, z: 3.0 }).unwrap();
        assert_eq!(
            *manager.get::<Position>(e).unwrap(),
            Position { x: 1.0, y: 2.0, z: 3.0 }
        );

        manager.get_mut::<Position>(e).unwrap().x = 9.0;
        let removed = manager.remove::<Position>(e).unwrap();
        assert!((removed.x - 9.0).abs() < f32::EPSILON);
        assert!(matches!(
            manager.get::<Position>(e),
            Err(EcsError::ComponentMissing { .. })
        ));
    }

    #[test]
    fn test_entity_destroyed_follows_signature() {
        let mut manager = ComponentManager::new(32, 64, None);
        let position = manager.register::<Position>().unwrap();
        let velocity = manager.register::<Velocity>().unwrap();
        let health = manager.register::<Health>().unwrap();

        let (a, b) = (entity(1), entity(2));
        manager.add(a, Position { x: 0.0, y: 0.0, z: 0.0 }).unwrap();
        manager.add(a, Velocity(1.0)).unwrap();
        manager.add(a, Health(10)).unwrap();
        manager.add(b, Health(20)).unwrap();

        let signature = Signature::EMPTY.with(position).with(velocity).with(health);
        assert_eq!(manager.entity_destroyed(a, signature), 3);

        assert_eq!(manager.count::<Position>().unwrap(), 0);
        assert_eq!(manager.count::<Velocity>().unwrap(), 0);
        assert_eq!(manager.count::<Health>().unwrap(), 1);
        assert_eq!(*manager.get::<Health>(b).unwrap(), Health(20));
    }

    #[test]
    fn test_entity_destroyed_tolerates_any_bits() {
        let mut manager = ComponentManager::new(32, 64, None);
        manager.register::<Position>().unwrap();

        assert_eq!(manager.entity_destroyed(entity(4), Signature::EMPTY), 0);
        // Bits for unregistered families and absent components are skipped.
        assert_eq!(manager.entity_destroyed(entity(4), Signature::from_bits(u32::MAX)), 0);
    }

    #[test]
    fn test_add_rejects_ids_beyond_population() {
        let mut manager = ComponentManager::new(32, 64, None);
        manager.register::<Health>().unwrap();

        assert_eq!(
            manager.add(entity(u32::MAX), Health(1)),
            Err(EcsError::EntityOutOfRange {
                id: u32::MAX,
                max_entities: 64,
            })
        );
        assert_eq!(manager.total_count(), 0);
        assert!(!manager.has::<Health>(entity(u32::MAX)));
    }

    #[test]
    fn test_preallocated_arrays() {
        let mut manager = ComponentManager::new(32, 128, Some(64));
        manager.register::<Velocity>().unwrap();
        assert!(manager.array::<Velocity>().unwrap().capacity() >= 64);
        assert!(!manager.add(entity(1), Velocity(0.5)).unwrap());
        assert_eq!(manager.total_count(), 1);
    }
}
