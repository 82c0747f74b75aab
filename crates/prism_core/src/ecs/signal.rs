//! # Signals
//!
//! Synchronous one-to-many callbacks. Used for system membership
//! notifications and, one signal per event type, by the event bus.
//!
//! ## Dispatch rules
//!
//! - `emit` runs every connected callback on the calling thread, in
//!   connection order, before returning.
//! - The slot list is snapshotted before dispatch. Callbacks may connect or
//!   disconnect slots while an emit is running: new slots start receiving on
//!   the next emit, disconnected slots are skipped immediately.
//! - A callback that is already running (an emit reached it again through
//!   reentrancy) is skipped and logged instead of deadlocking.
//!
//! ## Lifetime
//!
//! [`Connection`] holds only a weak link to its signal. Dropping the
//! connection disconnects the slot; dropping the signal first is also fine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<P> = dyn FnMut(&P) + Send;

struct Slot<P> {
    id: u64,
    connected: AtomicBool,
    callback: Mutex<Box<Callback<P>>>,
}

struct SignalShared<P> {
    slots: Mutex<Vec<Arc<Slot<P>>>>,
    next_id: AtomicU64,
}

/// The part of a signal a [`Connection`] needs, independent of the payload type.
trait SlotOwner: Send + Sync {
    fn disconnect(&self, id: u64);
    fn is_connected(&self, id: u64) -> bool;
}

impl<P> SlotOwner for SignalShared<P> {
    fn disconnect(&self, id: u64) {
        let removed = {
            let mut slots = self.slots.lock();
            slots
                .iter()
                .position(|slot| slot.id == id)
                .map(|position| slots.remove(position))
        };
        // Dropped after the lock is released: the callback may own
        // connections to this same signal.
        if let Some(slot) = removed {
            slot.connected.store(false, Ordering::Release);
        }
    }

    fn is_connected(&self, id: u64) -> bool {
        self.slots.lock().iter().any(|slot| slot.id == id)
    }
}

/// A synchronous signal carrying payloads of type `P`.
pub struct Signal<P> {
    shared: Arc<SignalShared<P>>,
}

impl<P: 'static> Signal<P> {
    /// Creates a signal with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SignalShared {
                slots: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Connects `callback`. The slot stays connected until the returned
    /// [`Connection`] is dropped.
    pub fn connect<F>(&self, callback: F) -> Connection
    where
        F: FnMut(&P) + Send + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            id,
            connected: AtomicBool::new(true),
            callback: Mutex::new(Box::new(callback)),
        });
        self.shared.slots.lock().push(slot);

        let owner: Weak<dyn SlotOwner> = Arc::downgrade(&self.shared) as Weak<dyn SlotOwner>;
        Connection { id, owner }
    }

    /// Invokes every connected callback with `payload`. Returns how many ran.
    pub fn emit(&self, payload: &P) -> usize {
        let snapshot: Vec<Arc<Slot<P>>> = self.shared.slots.lock().clone();

        let mut delivered = 0;
        for slot in snapshot {
            if !slot.connected.load(Ordering::Acquire) {
                continue;
            }
            if let Some(mut callback) = slot.callback.try_lock() {
                (*callback)(payload);
                delivered += 1;
            } else {
                tracing::warn!(slot = slot.id, "skipping reentrant dispatch to a running callback");
            }
        }
        delivered
    }

    /// Number of connected slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.slots.lock().len()
    }

    /// Returns `true` if nothing is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: 'static> Default for Signal<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped handle to a connected slot. Dropping it disconnects the slot.
#[must_use = "dropping a Connection disconnects it immediately"]
pub struct Connection {
    id: u64,
    owner: Weak<dyn SlotOwner>,
}

impl Connection {
    /// Checks whether the slot is still connected to a live signal.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.owner
            .upgrade()
            .map_or(false, |owner| owner.is_connected(self.id))
    }

    /// Disconnects now. Equivalent to dropping the handle.
    pub fn disconnect(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.disconnect(self.id);
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
