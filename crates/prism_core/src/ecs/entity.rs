//! # Entity Management
//!
//! Entities are plain non-zero ids. They own no data: they key into
//! component storage and system membership sets.
//!
//! Ids are recycled oldest-first: a destroyed id goes to the back of the
//! free queue and is reissued before any id freed after it.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroU32;

use super::registry::ComponentFamily;
use super::signature::Signature;
use crate::error::{EcsError, EcsResult};

/// Opaque entity identifier. Id 0 is reserved and cannot be constructed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(NonZeroU32);

impl Entity {
    /// Wraps a raw id. Returns `None` for the reserved id 0.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0.get()
    }

    /// Index into per-entity tables.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0.get() as usize
    }
}

impl TryFrom<u32> for Entity {
    type Error = EcsError;

    fn try_from(id: u32) -> EcsResult<Self> {
        Self::from_raw(id).ok_or(EcsError::InvalidEntity)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues and recycles entity ids and stores each entity's signature.
///
/// The manager is sized once: `max_entities` bounds every per-entity table,
/// and ids `1..max_entities` are seeded into the free queue at construction.
pub struct EntityManager {
    /// Free ids, oldest-freed first.
    free_ids: VecDeque<Entity>,
    /// Signature per id. Slot 0 is never used.
    signatures: Box<[Signature]>,
    /// Liveness per id. Slot 0 is never used.
    alive: Box<[bool]>,
    /// Number of living entities.
    living_count: u32,
    /// Exclusive upper bound on ids.
    max_entities: u32,
}

impl EntityManager {
    /// Creates a manager for ids `1..max_entities`.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities < 2`.
    #[must_use]
    pub fn new(max_entities: u32) -> Self {
        assert!(max_entities >= 2, "Entity limit must leave room for at least one id");

        let slots = max_entities as usize;
        let free_ids = (1..max_entities).filter_map(Entity::from_raw).collect();

        Self {
            free_ids,
            signatures: vec![Signature::EMPTY; slots].into_boxed_slice(),
            alive: vec![false; slots].into_boxed_slice(),
            living_count: 0,
            max_entities,
        }
    }

    /// Exclusive upper bound on entity ids.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> u32 {
        self.max_entities
    }

    /// Number of ids that can be alive at once.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.max_entities - 1
    }

    /// Number of currently living entities.
    #[inline]
    #[must_use]
    pub const fn living_count(&self) -> u32 {
        self.living_count
    }

    /// Allocates an entity with an empty signature.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityCapacityExceeded`] if every id is in use.
    pub fn create(&mut self) -> EcsResult<Entity> {
        let entity = self.free_ids.pop_front().ok_or(EcsError::EntityCapacityExceeded {
            living: self.living_count,
            max_entities: self.max_entities,
        })?;

        let index = entity.index();
        debug_assert!(!self.alive[index], "free queue held a living id");
        debug_assert!(self.signatures[index].is_empty(), "recycled id kept stale bits");

        self.alive[index] = true;
        self.living_count += 1;
        tracing::trace!(entity = entity.id(), living = self.living_count, "entity created");
        Ok(entity)
    }

    /// Destroys a living entity: clears its signature and queues the id for reuse.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] if the id exceeds the configured range.
    /// - [`EcsError::EntityNotAlive`] on double destroy.
    pub fn destroy(&mut self, entity: Entity) -> EcsResult<()> {
        let index = self.check_alive(entity)?;

        // Clear before the id re-enters the pool so the next occupant starts empty.
        self.signatures[index] = Signature::EMPTY;
        self.alive[index] = false;
        self.free_ids.push_back(entity);
        self.living_count -= 1;
        tracing::trace!(entity = entity.id(), living = self.living_count, "entity destroyed");
        Ok(())
    }

    /// Replaces the signature of a living entity.
    ///
    /// # Errors
    ///
    /// Same as [`EntityManager::destroy`].
    pub fn set_signature(&mut self, entity: Entity, signature: Signature) -> EcsResult<()> {
        let index = self.check_alive(entity)?;
        self.signatures[index] = signature;
        Ok(())
    }

    /// Sets or clears one bit of a living entity's signature and returns the result.
    ///
    /// # Errors
    ///
    /// Same as [`EntityManager::destroy`].
    pub fn update_signature(
        &mut self,
        entity: Entity,
        family: ComponentFamily,
        enable: bool,
    ) -> EcsResult<Signature> {
        let index = self.check_alive(entity)?;
        let signature = &mut self.signatures[index];
        signature.set(family, enable);
        Ok(*signature)
    }

    /// Returns the signature of a living entity.
    ///
    /// # Errors
    ///
    /// Same as [`EntityManager::destroy`].
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        let index = self.check_alive(entity)?;
        Ok(self.signatures[index])
    }

    /// Checks whether `entity` is a living id of this manager.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Iterates living entities in id order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .filter_map(|(index, _)| u32::try_from(index).ok().and_then(Entity::from_raw))
    }

    fn check_alive(&self, entity: Entity) -> EcsResult<usize> {
        let index = entity.index();
        if entity.id() >= self.max_entities {
            return Err(EcsError::EntityOutOfRange {
                id: entity.id(),
                max_entities: self.max_entities,
            });
        }
        if !self.alive[index] {
            return Err(EcsError::EntityNotAlive(entity));
        }
        Ok(index)
    }
}
