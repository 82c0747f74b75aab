//! # Event Bus
//!
//! Type-safe, synchronous publish/subscribe for cross-system notification.
//!
//! Every event type is registered once and gets a [`Signal`] of its own.
//! `emit` runs every subscriber on the calling thread, in subscription
//! order, before returning. There is no queue and no deferred delivery.
//!
//! ## Receivers
//!
//! A [`Receiver`] is the subscriber-side handle. It holds **at most one**
//! live subscription at a time, across all event types: subscribing a
//! receiver that is already subscribed to anything fails with
//! [`EcsError::ReceiverAlreadySubscribed`]. Listen to several event types
//! with several receivers.
//!
//! Dropping a receiver disconnects its subscription, so the bus never calls
//! into a subscriber that is gone. The bus may also be dropped first.

use std::any::{type_name, Any};

use super::registry::{EventFamily, FamilyId, FamilyKind, TypeRegistry};
use super::signal::{Connection, Signal};
use crate::error::{EcsError, EcsResult};

/// Marker trait for event types.
pub trait Event: 'static {}

/// Subscriber handle. Owns at most one live subscription.
#[derive(Debug, Default)]
pub struct Receiver {
    subscription: Option<(EventFamily, Connection)>,
}

impl Receiver {
    /// Creates an unsubscribed receiver.
    #[must_use]
    pub fn new() -> Self {
        Self { subscription: None }
    }

    /// Checks whether the receiver holds a live subscription.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .map_or(false, |(_, connection)| connection.is_connected())
    }

    /// The event family the receiver is subscribed to, if any.
    #[must_use]
    pub fn subscribed_family(&self) -> Option<EventFamily> {
        self.subscription
            .as_ref()
            .filter(|(_, connection)| connection.is_connected())
            .map(|(family, _)| *family)
    }
}

/// The operations the bus needs on a signal without knowing its payload.
trait ErasedSignal: Send {
    fn connected(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

impl<E: Event> ErasedSignal for Signal<E> {
    fn connected(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry of event types and their signals.
pub struct EventBus {
    registry: TypeRegistry<EventFamily>,
    /// One signal per registered event; `family - 1` indexes this.
    signals: Vec<Box<dyn ErasedSignal>>,
}

impl EventBus {
    /// Creates a bus that accepts family ids `1..limit`.
    ///
    /// # Panics
    ///
    /// Panics if `limit < 2`.
    #[must_use]
    pub fn new(limit: u8) -> Self {
        Self {
            registry: TypeRegistry::new(limit),
            signals: Vec::with_capacity(usize::from(limit)),
        }
    }

    /// Registers `E`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeAlreadyRegistered`] on double registration.
    /// - [`EcsError::FamilyCapacityExceeded`] if the limit is reached.
    pub fn register<E: Event>(&mut self) -> EcsResult<EventFamily> {
        let family = self.registry.register::<E>()?;
        self.signals.push(Box::new(Signal::<E>::new()));
        Ok(family)
    }

    /// The family id of `E`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `E` is unknown.
    #[inline]
    pub fn family_of<E: Event>(&self) -> EcsResult<EventFamily> {
        self.registry.family_of::<E>()
    }

    /// Subscribes `receiver` to `E`; `callback` runs on every emit of `E`
    /// until the receiver unsubscribes or is dropped.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeNotRegistered`] if `E` is unknown.
    /// - [`EcsError::ReceiverAlreadySubscribed`] if `receiver` already holds
    ///   a live subscription to any event type.
    pub fn subscribe<E, F>(&self, receiver: &mut Receiver, callback: F) -> EcsResult<()>
    where
        E: Event,
        F: FnMut(&E) + Send + 'static,
    {
        let family = self.family_of::<E>()?;
        if let Some(existing) = receiver.subscribed_family() {
            return Err(EcsError::ReceiverAlreadySubscribed {
                family: existing.get(),
            });
        }

        let connection = self.signal::<E>()?.connect(callback);
        receiver.subscription = Some((family, connection));
        tracing::trace!(event = type_name::<E>(), "receiver subscribed");
        Ok(())
    }

    /// Removes the subscription of `receiver` to `E`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TypeNotRegistered`] if `E` is unknown.
    /// - [`EcsError::ReceiverNotSubscribed`] if `receiver` is not subscribed
    ///   to `E`.
    pub fn unsubscribe<E: Event>(&self, receiver: &mut Receiver) -> EcsResult<()> {
        let family = self.family_of::<E>()?;
        if receiver.subscribed_family() != Some(family) {
            return Err(EcsError::ReceiverNotSubscribed {
                type_name: type_name::<E>(),
            });
        }

        // Dropping the connection detaches the slot.
        receiver.subscription = None;
        tracing::trace!(event = type_name::<E>(), "receiver unsubscribed");
        Ok(())
    }

    /// Delivers `event` to every subscriber of `E`. Returns how many ran.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `E` is unknown.
    pub fn emit<E: Event>(&self, event: &E) -> EcsResult<usize> {
        Ok(self.signal::<E>()?.emit(event))
    }

    /// Number of receivers subscribed to `E`.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeNotRegistered`] if `E` is unknown.
    pub fn connected_receivers<E: Event>(&self) -> EcsResult<usize> {
        Ok(self.signal::<E>()?.len())
    }

    /// Number of receivers subscribed to any event.
    #[must_use]
    pub fn total_connected_receivers(&self) -> usize {
        self.signals.iter().map(|signal| signal.connected()).sum()
    }

    /// Number of registered event types.
    #[must_use]
    pub fn total_events(&self) -> usize {
        self.registry.len()
    }

    fn signal<E: Event>(&self) -> EcsResult<&Signal<E>> {
        let family = self.family_of::<E>()?;
        self.signals
            .get(family.index() - 1)
            .and_then(|signal| signal.as_any().downcast_ref::<Signal<E>>())
            .ok_or(EcsError::TypeNotRegistered {
                kind: FamilyKind::Event,
                type_name: type_name::<E>(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Ping {
        x: i32,
    }
    impl Event for Ping {}

    #[derive(Debug)]
    struct Pong;
    impl Event for Pong {}

    fn bus() -> EventBus {
        let mut bus = EventBus::new(32);
        bus.register::<Ping>().unwrap();
        bus.register::<Pong>().unwrap();
        bus
    }

    fn collector(bus: &EventBus, receiver: &mut Receiver) -> Arc<Mutex<Vec<Ping>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe::<Ping, _>(receiver, move |ping| sink.lock().push(*ping))
            .unwrap();
        seen
    }

    #[test]
    fn test_ping_delivered_once_then_not_after_unsubscribe() {
        let bus = bus();
        let mut receiver = Receiver::new();
        let seen = collector(&bus, &mut receiver);

        assert_eq!(bus.emit(&Ping { x: 5 }).unwrap(), 1);
        assert_eq!(*seen.lock(), vec![Ping { x: 5 }]);

        bus.unsubscribe::<Ping>(&mut receiver).unwrap();
        assert_eq!(bus.emit(&Ping { x: 6 }).unwrap(), 0);
        assert_eq!(*seen.lock(), vec![Ping { x: 5 }]);
    }

    #[test]
    fn test_n_subscribers_then_n_minus_one() {
        let bus = bus();
        let hits = Arc::new(Mutex::new(0usize));
        let mut receivers: Vec<Receiver> = (0..4).map(|_| Receiver::new()).collect();
        for receiver in &mut receivers {
            let hits = Arc::clone(&hits);
            bus.subscribe::<Ping, _>(receiver, move |_| *hits.lock() += 1)
                .unwrap();
        }

        assert_eq!(bus.emit(&Ping { x: 1 }).unwrap(), 4);
        bus.unsubscribe::<Ping>(&mut receivers[2]).unwrap();
        assert_eq!(bus.emit(&Ping { x: 2 }).unwrap(), 3);
        assert_eq!(*hits.lock(), 7);
        assert_eq!(bus.total_connected_receivers(), 3);
    }

    #[test]
    fn test_receiver_holds_one_subscription() {
        let bus = bus();
        let mut receiver = Receiver::new();
        let _seen = collector(&bus, &mut receiver);

        let err = bus.subscribe::<Pong, _>(&mut receiver, |_| {}).unwrap_err();
        assert_eq!(err, EcsError::ReceiverAlreadySubscribed { family: 1 });
        let err = bus.subscribe::<Ping, _>(&mut receiver, |_| {}).unwrap_err();
        assert!(matches!(err, EcsError::ReceiverAlreadySubscribed { .. }));
    }

    #[test]
    fn test_unsubscribe_requires_matching_subscription() {
        let bus = bus();
        let mut receiver = Receiver::new();
        assert!(matches!(
            bus.unsubscribe::<Ping>(&mut receiver),
            Err(EcsError::ReceiverNotSubscribed { .. })
        ));

        let _seen = collector(&bus, &mut receiver);
        assert!(matches!(
            bus.unsubscribe::<Pong>(&mut receiver),
            Err(EcsError::ReceiverNotSubscribed { .. })
        ));
        assert!(receiver.is_subscribed());
    }

    #[test]
    fn test_dropped_receiver_disconnects() {
        let bus = bus();
        {
            let mut receiver = Receiver::new();
            let _seen = collector(&bus, &mut receiver);
            assert_eq!(bus.connected_receivers::<Ping>().unwrap(), 1);
        }
        assert_eq!(bus.connected_receivers::<Ping>().unwrap(), 0);
        assert_eq!(bus.emit(&Ping { x: 0 }).unwrap(), 0);
    }

    #[test]
    fn test_receiver_outlives_bus() {
        let mut receiver = Receiver::new();
        {
            let bus = bus();
            let _seen = collector(&bus, &mut receiver);
        }
        assert!(!receiver.is_subscribed());
        assert_eq!(receiver.subscribed_family(), None);
    }

    #[test]
    fn test_unregistered_event_is_rejected() {
        struct Unknown;
        impl Event for Unknown {}

        let bus = bus();
        let mut receiver = Receiver::new();
        assert!(matches!(
            bus.emit(&Unknown),
            Err(EcsError::TypeNotRegistered { kind: FamilyKind::Event, .. })
        ));
        assert!(bus.subscribe::<Unknown, _>(&mut receiver, |_| {}).is_err());
        assert_eq!(bus.total_events(), 2);
    }

    #[test]
    fn test_resubscribe_after_unsubscribe() {
        let bus = bus();
        let mut receiver = Receiver::new();
        let _first = collector(&bus, &mut receiver);
        bus.unsubscribe::<Ping>(&mut receiver).unwrap();

        let pongs = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&pongs);
        bus.subscribe::<Pong, _>(&mut receiver, move |_| *sink.lock() += 1)
            .unwrap();
        bus.emit(&Pong).unwrap();
        assert_eq!(*pongs.lock(), 1);
        assert_eq!(receiver.subscribed_family().map(|f| f.get()), Some(2));
    }

    #[test]
    fn test_dropping_receiver_whose_callback_owns_a_receiver() {
        let bus = bus();
        let mut inner = Receiver::new();
        let seen = collector(&bus, &mut inner);

        let mut outer = Receiver::new();
        bus.subscribe::<Ping, _>(&mut outer, move |_| {
            assert!(inner.is_subscribed());
        })
        .unwrap();
        assert_eq!(bus.emit(&Ping { x: 1 }).unwrap(), 2);

        drop(outer);
        assert_eq!(bus.connected_receivers::<Ping>().unwrap(), 0);
        assert_eq!(bus.emit(&Ping { x: 2 }).unwrap(), 0);
        assert_eq!(*seen.lock(), vec![Ping { x: 1 }]);
    }
}
