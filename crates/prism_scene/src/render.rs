//! # Render System
//!
//! Turns every entity with a [`Transform`] and a [`MeshRenderer`] into a
//! draw command.
//!
//! ## Cache slots
//!
//! Each member entity owns one instance slot in the upload buffer. The slot
//! is acquired in the system's "added" callback and released in "removed",
//! and it is keyed by entity id. Packed component arrays move values on
//! removal, so nothing here holds a reference into component storage.
//!
//! ```text
//! added(e)   -> slot = free_list.pop() or high_water++
//! removed(e) -> free_list.push(slot)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use prism_core::{
    Component, ComponentFamily, Connection, Coordinator, EcsError, EcsResult, Entity,
    EntityChangeKind, EntityChanged, MembershipChange, Receiver, Signature, System,
};

use crate::components::{MaterialHandle, MeshHandle, MeshRenderer, Transform};

/// Per-instance data uploaded for one draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Column-major model matrix.
    pub model: [f32; 16],
}

impl InstanceData {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// One draw, ready for submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// The entity being drawn.
    pub entity: Entity,
    /// Mesh to bind.
    pub mesh: MeshHandle,
    /// Material to bind.
    pub material: MaterialHandle,
    /// Instance slot owned by the entity.
    pub slot: u32,
    /// Instance payload.
    pub instance: InstanceData,
}

impl DrawCommand {
    /// The instance payload as bytes.
    #[inline]
    #[must_use]
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.instance)
    }
}

/// Packs the instance payloads of `commands`, in order, for upload.
#[must_use]
pub fn instance_bytes(commands: &[DrawCommand]) -> Vec<u8> {
    let instances: Vec<InstanceData> = commands.iter().map(|command| command.instance).collect();
    bytemuck::cast_slice::<InstanceData, u8>(&instances).to_vec()
}

/// Entity lifecycle traffic seen through [`EntityChanged`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    /// Entities created.
    pub created: u64,
    /// Entities deleted.
    pub deleted: u64,
}

/// Instance slot bookkeeping, keyed by entity id.
#[derive(Debug, Default)]
struct SlotCache {
    slots: HashMap<u32, u32>,
    /// Released slots, reused most-recent first.
    free_list: Vec<u32>,
    /// Slots ever handed out.
    high_water: u32,
}

impl SlotCache {
    fn acquire(&mut self, entity: Entity) -> u32 {
        if let Some(&slot) = self.slots.get(&entity.id()) {
            return slot;
        }
        let slot = self.free_list.pop().unwrap_or_else(|| {
            self.high_water += 1;
            self.high_water - 1
        });
        self.slots.insert(entity.id(), slot);
        slot
    }

    fn release(&mut self, entity: Entity) -> Option<u32> {
        let slot = self.slots.remove(&entity.id())?;
        self.free_list.push(slot);
        Some(slot)
    }
}

/// The render system. Dropping it disconnects every callback.
pub struct RenderSystem {
    cache: Arc<Mutex<SlotCache>>,
    stats: Arc<Mutex<LifecycleStats>>,
    _added: Connection,
    _removed: Connection,
    _lifecycle: Receiver,
}

impl System for RenderSystem {}

impl RenderSystem {
    /// Registers the render system with `ecs` and wires its callbacks.
    ///
    /// `Transform` and `MeshRenderer` are registered if the application has
    /// not done so already.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeAlreadyRegistered`] if a render system is already
    ///   installed.
    /// - Family capacity errors from component or system registration.
    pub fn install(ecs: &mut Coordinator) -> EcsResult<Self> {
        let transform = ensure_component::<Transform>(ecs)?;
        let renderer = ensure_component::<MeshRenderer>(ecs)?;
        ecs.register_system::<Self>(Signature::EMPTY.with(transform).with(renderer))?;

        let cache = Arc::new(Mutex::new(SlotCache::default()));
        let stats = Arc::new(Mutex::new(LifecycleStats::default()));

        let added = {
            let cache = Arc::clone(&cache);
            ecs.on_system_added::<Self, _>(move |change: &MembershipChange| {
                let slot = cache.lock().acquire(change.entity);
                tracing::trace!(entity = change.entity.id(), slot, "render slot acquired");
            })?
        };
        let removed = {
            let cache = Arc::clone(&cache);
            ecs.on_system_removed::<Self, _>(move |change: &MembershipChange| {
                if let Some(slot) = cache.lock().release(change.entity) {
                    tracing::trace!(entity = change.entity.id(), slot, "render slot released");
                }
            })?
        };

        let mut lifecycle = Receiver::new();
        {
            let stats = Arc::clone(&stats);
            ecs.subscribe::<EntityChanged, _>(&mut lifecycle, move |event| {
                let mut stats = stats.lock();
                match event.kind {
                    EntityChangeKind::Created => stats.created += 1,
                    EntityChangeKind::Deleted => stats.deleted += 1,
                }
            })?;
        }

        tracing::debug!("render system installed");
        Ok(Self {
            cache,
            stats,
            _added: added,
            _removed: removed,
            _lifecycle: lifecycle,
        })
    }

    /// Builds the draw list for every visible member, sorted by material,
    /// then mesh, then entity.
    ///
    /// # Errors
    ///
    /// Propagates lookup errors from `ecs`; a member missing one of its
    /// required components means the coordinator state is corrupt.
    pub fn build_draw_list(&self, ecs: &Coordinator) -> EcsResult<Vec<DrawCommand>> {
        let members = ecs.system_entities::<Self>()?;
        let cache = self.cache.lock();
        let mut commands = Vec::with_capacity(members.len());

        for &entity in members {
            let renderer = ecs.get_component::<MeshRenderer>(entity)?;
            if !renderer.visible {
                continue;
            }
            let Some(&slot) = cache.slots.get(&entity.id()) else {
                tracing::warn!(entity = entity.id(), "member has no render slot");
                continue;
            };
            let transform = ecs.get_component::<Transform>(entity)?;

            commands.push(DrawCommand {
                entity,
                mesh: renderer.mesh,
                material: renderer.material,
                slot,
                instance: InstanceData {
                    model: transform.model_matrix(),
                },
            });
        }

        commands.sort_unstable_by_key(|command| (command.material, command.mesh, command.entity));
        Ok(commands)
    }

    /// The instance slot of `entity`, if it is a member.
    #[must_use]
    pub fn slot_of(&self, entity: Entity) -> Option<u32> {
        self.cache.lock().slots.get(&entity.id()).copied()
    }

    /// Number of entities holding a slot.
    #[must_use]
    pub fn cached_entities(&self) -> usize {
        self.cache.lock().slots.len()
    }

    /// Number of slots ever handed out; the upload buffer's required length.
    #[must_use]
    pub fn slot_high_water(&self) -> u32 {
        self.cache.lock().high_water
    }

    /// Lifecycle traffic observed since installation.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleStats {
        *self.stats.lock()
    }
}

/// Family of `T`, registering it first if needed.
fn ensure_component<T: Component>(ecs: &mut Coordinator) -> EcsResult<ComponentFamily> {
    match ecs.component_family::<T>() {
        Err(EcsError::TypeNotRegistered { .. }) => ecs.register_component::<T>(),
        found => found,
    }
}
