//! Logging Tests
//!
//! A `tracing` subscriber is host code and may read the registry while it
//! handles an event. These tests install such a subscriber and check that:
//! - Type registration completes and its events reach the subscriber
//! - The capacity error is logged without holding the registration lock
//! - Member registration events are emitted after the lock is released
//!
//! # Running Tests
//! ```bash
//! cargo test --test logging_tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use rtti_engine::{
    MethodDescriptor, Reflect, Registry, RegistryError, RegistryLimits, RegistryOptions,
    TypeRegistration,
};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

const DEADLINE: Duration = Duration::from_secs(5);

/// Subscriber that queries the registry on every event
struct RegistryReader {
    registry: Arc<Registry>,
    events: Arc<AtomicUsize>,
}

impl Subscriber for RegistryReader {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, _event: &Event<'_>) {
        let _ = self.registry.type_count();
        let _ = self.registry.is_poisoned();
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Run `f` on a worker thread under a `RegistryReader`, failing instead of
/// hanging if it never returns. Yields the result and the event count.
fn with_reader<R, F>(registry: Arc<Registry>, f: F) -> (R, usize)
where
    R: Send + 'static,
    F: FnOnce(&Registry) -> R + Send + 'static,
{
    let events = Arc::new(AtomicUsize::new(0));
    let subscriber = RegistryReader {
        registry: Arc::clone(&registry),
        events: Arc::clone(&events),
    };
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = tracing::subscriber::with_default(subscriber, || f(&*registry));
        let _ = tx.send(result);
    });
    let result = rx
        .recv_timeout(DEADLINE)
        .expect("registration did not return under a reading subscriber");
    (result, events.load(Ordering::SeqCst))
}

#[derive(Clone, Default)]
struct Gauge {
    level: i64,
}

impl Reflect for Gauge {}

// ===== Type Registration Tests =====

#[test]
fn test_register_type_under_reading_subscriber() {
    let registry = Arc::new(Registry::new());

    let (result, events) = with_reader(Arc::clone(&registry), |registry| {
        registry.register_type(TypeRegistration::new("meters::Gauge"))
    });

    assert!(result.is_ok());
    assert!(events > 0);
    assert_eq!(registry.type_count(), 1);
}

#[test]
fn test_type_of_under_reading_subscriber() {
    let registry = Arc::new(Registry::new());

    let (result, _) = with_reader(Arc::clone(&registry), |registry| {
        registry.type_of::<Box<Gauge>>()
    });

    let boxed = result.unwrap();
    assert_eq!(registry.type_of::<Box<Gauge>>(), Ok(boxed));
    assert_eq!(registry.type_count(), 2);
}

#[test]
fn test_capacity_error_under_reading_subscriber() {
    let registry = Arc::new(Registry::with_options(RegistryOptions::with_limits(
        RegistryLimits::with_max_types(1),
    )));

    let (results, events) = with_reader(Arc::clone(&registry), |registry| {
        (
            registry.register_type(TypeRegistration::new("meters::Gauge")),
            registry.register_type(TypeRegistration::new("meters::Dial")),
        )
    });

    assert!(results.0.is_ok());
    assert_eq!(results.1, Err(RegistryError::CapacityExceeded { limit: 1 }));
    assert!(events >= 2);
    assert!(registry.is_poisoned());
}

// ===== Member Registration Tests =====

#[test]
fn test_register_method_under_reading_subscriber() {
    let registry = Arc::new(Registry::new());
    let gauge = registry.type_of::<Gauge>().unwrap();

    let (result, events) = with_reader(Arc::clone(&registry), move |registry| {
        let method = MethodDescriptor::from_ref0::<Gauge, i64, _>(registry, "level", |g| g.level)?;
        registry.register_method(gauge, method)
    });

    assert_eq!(result, Ok(true));
    assert!(events > 0);
    assert!(registry.find_method("level", gauge).is_some());
}
