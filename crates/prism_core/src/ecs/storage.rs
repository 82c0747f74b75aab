//! # Component Storage
//!
//! Packed storage for a single component type.
//!
//! The storage keeps three tables in lockstep:
//! - `values`: the dense component array, no holes
//! - `slot_to_entity`: owner of each dense slot
//! - `entity_to_slot`: sparse index keyed by entity id
//!
//! Removal moves the last value into the freed slot (swap-and-pop) and
//! patches both index tables, so iteration always walks contiguous memory.
//!
//! ```text
//! remove(B):   values [A, B, C, D]      values [A, D, C]
//!                         ^        ->              ^ D moved here
//! ```

use std::any::{type_name, Any};

use super::component::Component;
use super::entity::Entity;
use crate::config::DEFAULT_MAX_ENTITIES;
use crate::error::{EcsError, EcsResult};

/// Dense storage for one component type, keyed by entity.
///
/// # Address stability
///
/// Inserting may reallocate `values`, moving every component. Keep entity
/// ids, not references, across insertions. A storage built with
/// [`ComponentArray::with_capacity`] never reallocates until that capacity
/// is exceeded.
///
/// # Id bound
///
/// The sparse index grows with the largest entity id stored, so ids at or
/// above the bound are rejected. [`ComponentArray::new`] uses
/// [`DEFAULT_MAX_ENTITIES`]; use [`ComponentArray::with_max_entities`] to
/// match a configured population.
///
/// # Example
///
/// ```rust,ignore
/// let mut positions: ComponentArray<Position> = ComponentArray::new();
/// positions.insert(entity, Position::new(1.0, 2.0, 3.0))?;
/// let removed = positions.remove(entity)?;
/// ```
pub struct ComponentArray<T> {
    /// Dense component values.
    values: Vec<T>,
    /// Owner of each dense slot.
    slot_to_entity: Vec<Entity>,
    /// Dense slot per entity id, grown on demand.
    entity_to_slot: Vec<Option<u32>>,
    /// Exclusive upper bound on accepted entity ids.
    max_entities: u32,
}

impl<T> ComponentArray<T> {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            slot_to_entity: Vec::new(),
            entity_to_slot: Vec::new(),
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }

    /// Creates storage with room for `capacity` components and entity ids
    /// below `capacity + 1` without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            slot_to_entity: Vec::with_capacity(capacity),
            entity_to_slot: vec![None; capacity + 1],
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }

    /// Only accepts entity ids below `max_entities`.
    #[must_use]
    pub fn with_max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Exclusive upper bound on accepted entity ids.
    #[inline]
    #[must_use]
    pub fn max_entities(&self) -> u32 {
        self.max_entities
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of components the dense array holds before reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Checks whether `entity` has a value here.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Stores `value` for `entity`.
    ///
    /// Returns `true` if the dense array reallocated, which moves every
    /// stored component.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] if the id is not below the bound.
    /// - [`EcsError::ComponentAlreadyPresent`] if `entity` already has a value.
    pub fn insert(&mut self, entity: Entity, value: T) -> EcsResult<bool> {
        if entity.id() >= self.max_entities {
            return Err(EcsError::EntityOutOfRange {
                id: entity.id(),
                max_entities: self.max_entities,
            });
        }
        if self.contains(entity) {
            return Err(EcsError::ComponentAlreadyPresent {
                entity,
                type_name: type_name::<T>(),
            });
        }

        let capacity_before = self.values.capacity();
        let slot = self.values.len();
        self.values.push(value);
        self.slot_to_entity.push(entity);

        let index = entity.index();
        if index >= self.entity_to_slot.len() {
            self.entity_to_slot.resize(index + 1, None);
        }
        // Dense length is bounded by the entity population, which fits u32.
        self.entity_to_slot[index] = u32::try_from(slot).ok();

        Ok(self.values.capacity() != capacity_before)
    }

    /// Removes and returns the value for `entity`, filling the hole with the
    /// last element.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentMissing`] if `entity` has no value.
    pub fn remove(&mut self, entity: Entity) -> EcsResult<T> {
        let slot = self.slot_of(entity).ok_or_else(|| Self::missing(entity))?;

        let value = self.values.swap_remove(slot);
        self.slot_to_entity.swap_remove(slot);
        self.entity_to_slot[entity.index()] = None;

        // If something moved into `slot`, point its owner at the new position.
        if let Some(&moved) = self.slot_to_entity.get(slot) {
            self.entity_to_slot[moved.index()] = u32::try_from(slot).ok();
        }

        Ok(value)
    }

    /// Returns the value for `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentMissing`] if `entity` has no value.
    #[inline]
    pub fn get(&self, entity: Entity) -> EcsResult<&T> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&self.values[slot]),
            None => Err(Self::missing(entity)),
        }
    }

    /// Returns the value for `entity` mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentMissing`] if `entity` has no value.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> EcsResult<&mut T> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&mut self.values[slot]),
            None => Err(Self::missing(entity)),
        }
    }

    /// Dense values in slot order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Dense values in slot order, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Owners of the dense values, parallel to [`ComponentArray::as_slice`].
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.slot_to_entity
    }

    /// Iterates `(entity, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.slot_to_entity.iter().copied().zip(self.values.iter())
    }

    /// Iterates `(entity, value)` pairs in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.slot_to_entity.iter().copied().zip(self.values.iter_mut())
    }

    #[inline]
    fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.entity_to_slot
            .get(entity.index())
            .copied()
            .flatten()
            .map(|slot| slot as usize)
    }

    fn missing(entity: Entity) -> EcsError {
        EcsError::ComponentMissing {
            entity,
            type_name: type_name::<T>(),
        }
    }
}

impl<T> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The operations the component manager needs without knowing `T`.
pub(crate) trait ErasedComponentArray: Send {
    /// Removes `entity` if present; returns whether anything was removed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedComponentArray for ComponentArray<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.contains(entity) && self.remove(entity).is_ok()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
