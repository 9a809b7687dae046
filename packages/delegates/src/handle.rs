use std::cell::Cell;
use std::sync::atomic::{self, AtomicU64};

use crate::TargetKind;

/// Identifies one registration in a [`MulticastDelegate`][crate::MulticastDelegate].
///
/// Returned by the `add_*` methods and used only to remove the registration again via
/// [`MulticastDelegate::remove()`][crate::MulticastDelegate::remove]. A handle does not own or
/// reference the bound target, so it remains valid to present for removal even after the object
/// it was bound to has been destroyed.
///
/// Two handles compare equal only if they were returned by the same `add_*` call. A registry
/// never issues the same handle twice, even after the original registration has been removed.
///
/// # Example
///
/// ```rust
/// use delegates::{MulticastDelegate, TargetKind};
///
/// fn on_tick(_: u32) {}
///
/// let ticks = MulticastDelegate::<(u32,)>::new();
///
/// let first = ticks.add_function(on_tick);
/// let second = ticks.add_function(on_tick);
///
/// assert_ne!(first, second);
/// assert_eq!(first.kind(), TargetKind::Function);
///
/// assert!(ticks.remove(first));
/// assert!(!ticks.remove(first));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BindingHandle {
    kind: TargetKind,
    sequence: u64,
    registry: RegistryId,
}

impl BindingHandle {
    pub(crate) fn new(kind: TargetKind, sequence: u64, registry: RegistryId) -> Self {
        Self {
            kind,
            sequence,
            registry,
        }
    }

    /// The kind of target this handle was issued for.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Position of the registration in the sequence of registrations made by the issuing
    /// registry, starting from zero.
    #[must_use]
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn registry(&self) -> RegistryId {
        self.registry
    }
}

/// Distinguishes registries from each other, so a handle issued by one registry is never
/// mistaken for a registration in another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct RegistryId(u64);

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

impl RegistryId {
    pub(crate) fn next() -> Self {
        // Only uniqueness matters, there is no ordering relationship with other memory.
        Self(NEXT_REGISTRY_ID.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

/// Per-registry source of handle sequence numbers. Never rewinds.
#[derive(Debug, Default)]
pub(crate) struct SequenceCounter {
    next: Cell<u64>,
}

impl SequenceCounter {
    pub(crate) fn next(&self) -> u64 {
        let sequence = self.next.get();

        self.next.set(
            sequence
                .checked_add(1)
                .expect("registering 2^64 targets in one registry is not a realistic scenario"),
        );

        sequence
    }
}
