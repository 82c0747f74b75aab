//! # Type Registry
//!
//! Explicit runtime mapping from Rust types to small integer family ids.
//!
//! Component, event and system types each get their own registry. Ids are
//! handed out sequentially from 1 in registration order, so the same
//! bootstrap sequence always produces the same ids (signatures can be
//! persisted). Id 0 is reserved and never issued.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU8;

use crate::error::{EcsError, EcsResult};

/// The registry a family id belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FamilyKind {
    /// Component types.
    Component,
    /// Event types.
    Event,
    /// System types.
    System,
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Component => "component",
            Self::Event => "event",
            Self::System => "system",
        })
    }
}

/// A typed, non-zero family id.
pub trait FamilyId: Copy + Eq + fmt::Debug + 'static {
    /// The registry this id type belongs to.
    const KIND: FamilyKind;

    /// Wraps a raw id. Only registries mint ids.
    #[doc(hidden)]
    fn from_raw(raw: NonZeroU8) -> Self;

    /// Returns the raw id (never 0).
    fn get(self) -> u8;

    /// Returns the id as an index into per-family tables.
    #[inline]
    fn index(self) -> usize {
        usize::from(self.get())
    }
}

macro_rules! family_id {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(NonZeroU8);

        impl FamilyId for $name {
            const KIND: FamilyKind = $kind;

            #[inline]
            fn from_raw(raw: NonZeroU8) -> Self {
                Self(raw)
            }

            #[inline]
            fn get(self) -> u8 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

family_id!(
    /// Family id of a component type. Doubles as the type's signature bit.
    ComponentFamily => FamilyKind::Component
);
family_id!(
    /// Family id of an event type.
    EventFamily => FamilyKind::Event
);
family_id!(
    /// Family id of a system type.
    SystemFamily => FamilyKind::System
);

/// Maps Rust types to family ids of kind `F`.
///
/// ## Invariants
/// - Every entry in `by_type` has a name at `names[id - 1]`.
/// - Issued ids are `1..limit`, in registration order.
pub struct TypeRegistry<F: FamilyId> {
    by_type: HashMap<TypeId, F>,
    names: Vec<&'static str>,
    limit: u8,
}

impl<F: FamilyId> TypeRegistry<F> {
    /// Creates an empty registry that can issue ids `1..limit`.
    ///
    /// # Panics
    ///
    /// Panics if `limit < 2` (no id could ever be issued).
    #[must_use]
    pub fn new(limit: u8) -> Self {
        assert!(limit >= 2, "Family limit must leave room for at least one id");
        Self {
            by_type: HashMap::with_capacity(usize::from(limit)),
            names: Vec::with_capacity(usize::from(limit)),
            limit,
        }
    }

    /// Registers `T` and returns its freshly assigned id.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeAlreadyRegistered`] if `T` already has an id.
    /// - [`EcsError::FamilyCapacityExceeded`] if all ids are taken.
    pub fn register<T: 'static>(&mut self) -> EcsResult<F> {
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            return Err(EcsError::TypeAlreadyRegistered {
                kind: F::KIND,
                type_name: type_name::<T>(),
            });
        }

        // names.len() + 1 is the next id; it must stay below the limit.
        let next = self.names.len() + 1;
        let raw = u8::try_from(next)
            .ok()
            .filter(|&raw| raw < self.limit)
            .and_then(NonZeroU8::new)
            .ok_or(EcsError::FamilyCapacityExceeded {
                kind: F::KIND,
                limit: self.limit,
            })?;

        let family = F::from_raw(raw);
        self.by_type.insert(type_id, family);
        self.names.push(type_name::<T>());
        tracing::debug!(kind = %F::KIND, family = raw.get(), type_name = type_name::<T>(), "registered type");
        Ok(family)
    }

    /// Returns the id of `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `T` was never registered.
    #[inline]
    pub fn family_of<T: 'static>(&self) -> EcsResult<F> {
        self.get::<T>().ok_or(EcsError::TypeNotRegistered {
            kind: F::KIND,
            type_name: type_name::<T>(),
        })
    }

    /// Returns the id of `T`, if registered.
    #[inline]
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<F> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the type name registered under `family`.
    #[must_use]
    pub fn name_of(&self, family: F) -> Option<&'static str> {
        self.names.get(family.index() - 1).copied()
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The configured limit (ids are `1..limit`).
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> u8 {
        self.limit
    }

    /// Iterates registered families in id order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &'static str)> + '_ {
        self.names.iter().enumerate().filter_map(|(i, &name)| {
            let raw = u8::try_from(i + 1).ok().and_then(NonZeroU8::new)?;
            Some((F::from_raw(raw), name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;
    struct Gamma;

    #[test]
    fn test_ids_start_at_one_in_registration_order() {
        let mut registry: TypeRegistry<ComponentFamily> = TypeRegistry::new(32);
        let a = registry.register::<Alpha>().unwrap();
        let b = registry.register::<Beta>().unwrap();

        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(registry.family_of::<Beta>().unwrap(), b);
        assert_eq!(registry.len(), 2);
        assert!(registry.name_of(a).unwrap().ends_with("Alpha"));
    }

    #[test]
    fn test_double_registration_is_rejected() {
        let mut registry: TypeRegistry<EventFamily> = TypeRegistry::new(8);
        registry.register::<Alpha>().unwrap();

        let err = registry.register::<Alpha>().unwrap_err();
        assert!(matches!(
            err,
            EcsError::TypeAlreadyRegistered { kind: FamilyKind::Event, .. }
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregistered_lookup_fails() {
        let registry: TypeRegistry<SystemFamily> = TypeRegistry::new(8);
        assert!(registry.get::<Alpha>().is_none());
        assert!(matches!(
            registry.family_of::<Alpha>(),
            Err(EcsError::TypeNotRegistered { kind: FamilyKind::System, .. })
        ));
    }

    #[test]
    fn test_limit_reserves_zero() {
        // Limit 3 leaves ids 1 and 2.
        let mut registry: TypeRegistry<ComponentFamily> = TypeRegistry::new(3);
        registry.register::<Alpha>().unwrap();
        registry.register::<Beta>().unwrap();

        assert_eq!(
            registry.register::<Gamma>(),
            Err(EcsError::FamilyCapacityExceeded {
                kind: FamilyKind::Component,
                limit: 3,
            })
        );
        let ids: Vec<u8> = registry.iter().map(|(family, _)| family.get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
