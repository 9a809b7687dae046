use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::ops::ControlFlow;
use std::ptr;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::{
    BindingHandle, Descriptor, ExpiredPolicy, MulticastDelegateBuilder, Outcome, RegistryId,
    SequenceCounter, Signature, Target,
};

/// Holds any number of callable targets of signature `R(A...)` and broadcasts calls to all
/// of them.
///
/// `A` is the tuple of argument types and `R` is the return type of every target. The lifetime
/// `'a` bounds everything a target may borrow: objects bound via
/// [`add_object()`][Self::add_object] and state captured by closures must outlive the registry.
///
/// Each `add_*` call creates an independent registration and returns a [`BindingHandle`] that
/// can later be used to [`remove()`][Self::remove] it. Adding the same function or method twice
/// creates two registrations, both of which are invoked on broadcast. Registrations can also be
/// removed by describing what was bound, e.g. via [`remove_function()`][Self::remove_function].
///
/// # Broadcasting
///
/// [`broadcast()`][Self::broadcast] invokes every registered target, in registration order,
/// each with its own clone of the arguments. Targets bound to an object through a weak
/// reference are skipped once that object has been destroyed.
///
/// All operations take `&self`, so targets may add, remove or broadcast on the registry that is
/// invoking them. A broadcast operates on the registrations that existed when it started:
///
/// * registrations added while it runs are not invoked by it;
/// * registrations removed while it runs are not invoked by it if it has not reached them yet;
/// * a closure that is already executing is skipped by a nested broadcast instead of being
///   re-entered. Functions and methods may be re-entered.
///
/// Panics raised by targets propagate to the caller of `broadcast()`, leaving the remaining
/// targets of that broadcast uninvoked. The registry itself remains usable.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use delegates::MulticastDelegate;
///
/// struct Counter {
///     total: Cell<u32>,
/// }
///
/// impl Counter {
///     fn add(&self, amount: u32) {
///         self.total.set(self.total.get() + amount);
///     }
/// }
///
/// let counter = Rc::new(Counter { total: Cell::new(0) });
/// let on_score = MulticastDelegate::<(u32,)>::new();
///
/// let handle = on_score.add_shared_object(&counter, Counter::add);
/// on_score.add_closure(|(amount,)| println!("scored {amount}"));
///
/// assert_eq!(on_score.broadcast((5,)), 2);
/// assert_eq!(counter.total.get(), 5);
///
/// on_score.remove(handle);
/// assert_eq!(on_score.broadcast((5,)), 1);
/// assert_eq!(counter.total.get(), 5);
/// ```
///
/// # Thread safety
///
/// This type is single-threaded. It is neither [`Send`] nor [`Sync`].
pub struct MulticastDelegate<'a, A: Signature<R>, R = ()> {
    id: RegistryId,
    sequence: SequenceCounter,

    /// Ordered by handle sequence number, as registrations are only ever appended.
    ///
    /// The borrow is never held while user code runs, which is what allows targets to operate
    /// on the registry re-entrantly.
    entries: RefCell<Vec<Rc<Entry<'a, A, R>>>>,

    expired_policy: ExpiredPolicy,
}

struct Entry<'a, A: Signature<R>, R> {
    handle: BindingHandle,
    target: Target<'a, A, R>,

    /// Set when the entry leaves the registry, so in-progress broadcasts holding it in their
    /// snapshot know to skip it.
    removed: Cell<bool>,
}

impl<'a, A: Signature<R> + 'a, R: 'a> MulticastDelegate<'a, A, R> {
    /// Creates an empty registry with the default configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::MulticastDelegate;
    ///
    /// let delegate = MulticastDelegate::<(String, u32)>::new();
    ///
    /// assert!(delegate.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`MulticastDelegate`].
    ///
    /// Use this when you want to customize the registry configuration beyond the defaults.
    pub fn builder() -> MulticastDelegateBuilder<A, R> {
        MulticastDelegateBuilder::new()
    }

    pub(crate) fn new_inner(expired_policy: ExpiredPolicy, capacity: usize) -> Self {
        Self {
            id: RegistryId::next(),
            sequence: SequenceCounter::default(),
            entries: RefCell::new(Vec::with_capacity(capacity)),
            expired_policy,
        }
    }

    /// Registers a free function.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::MulticastDelegate;
    ///
    /// fn log_resize(width: u32, height: u32) {
    ///     println!("resized to {width}x{height}");
    /// }
    ///
    /// let on_resize = MulticastDelegate::<(u32, u32)>::new();
    /// on_resize.add_function(log_resize);
    ///
    /// on_resize.broadcast((640, 480));
    /// ```
    pub fn add_function(&self, function: A::Function) -> BindingHandle {
        self.register(Target::function(function))
    }

    /// Registers a method of a borrowed object.
    ///
    /// The object is not owned by the registry. The borrow ensures it outlives the registry.
    /// Methods receive `&T`; use interior mutability if the method needs to modify the object.
    pub fn add_object<T: ?Sized>(&self, owner: &'a T, method: A::Method<T>) -> BindingHandle {
        self.register(Target::object(owner, method))
    }

    /// Registers a method of an object observed through a weak reference.
    ///
    /// The registry neither extends nor shortens the lifetime of the object. Once the object
    /// is destroyed, broadcasts skip the registration. What happens to the registration itself
    /// is governed by the [`ExpiredPolicy`] of the registry.
    pub fn add_safe_object<T: ?Sized + 'a>(
        &self,
        owner: Weak<T>,
        method: A::Method<T>,
    ) -> BindingHandle {
        self.register(Target::safe_object(owner, method))
    }

    /// Registers a method of a reference-counted object via a weak reference to it.
    ///
    /// Equivalent to [`add_safe_object()`][Self::add_safe_object] with `Rc::downgrade(owner)`.
    pub fn add_shared_object<T: ?Sized + 'a>(
        &self,
        owner: &Rc<T>,
        method: A::Method<T>,
    ) -> BindingHandle {
        self.add_safe_object(Rc::downgrade(owner), method)
    }

    /// Registers a closure.
    ///
    /// The closure receives the arguments as a single tuple and is owned by the registry,
    /// together with any state it captured. Closures can only be removed by handle.
    pub fn add_closure(&self, closure: impl FnMut(A) -> R + 'a) -> BindingHandle {
        self.register(Target::closure(closure))
    }

    fn register(&self, target: Target<'a, A, R>) -> BindingHandle {
        let handle = BindingHandle::new(target.kind(), self.sequence.next(), self.id);

        self.entries.borrow_mut().push(Rc::new(Entry {
            handle,
            target,
            removed: Cell::new(false),
        }));

        trace!(
            kind = ?handle.kind(),
            sequence = handle.sequence(),
            "registered delegate target"
        );

        handle
    }
}

impl<'a, A: Signature<R>, R> MulticastDelegate<'a, A, R> {
    /// Removes the registration identified by `handle`.
    ///
    /// Returns whether a registration was removed. Handles that were already removed or that
    /// were issued by a different registry remove nothing. The removed target is dropped
    /// without being invoked or otherwise inspected.
    pub fn remove(&self, handle: BindingHandle) -> bool {
        if handle.registry() != self.id {
            return false;
        }

        let removed = {
            let mut entries = self.entries.borrow_mut();

            entries
                .binary_search_by_key(&handle.sequence(), |entry| entry.handle.sequence())
                .ok()
                .filter(|&index| entries.get(index).is_some_and(|entry| entry.handle == handle))
                .map(|index| entries.remove(index))
        };

        // Dropping the entry may run arbitrary drop logic of captured state, so the
        // registry must not be borrowed at this point.
        self.retire(removed)
    }

    /// Removes the first registration (in registration order) of `function`.
    ///
    /// Returns whether a registration was removed.
    ///
    /// Matching compares addresses. Distinct zero-sized owners may share an address, and the
    /// compiler may merge functions with identical bodies into one. Such targets compare equal,
    /// so either may be the one removed.
    pub fn remove_function(&self, function: A::Function) -> bool {
        self.remove_matching(&Descriptor::Function {
            function: A::function_address(function),
        })
    }

    /// Removes the first registration (in registration order) made via
    /// [`add_object()`][Self::add_object] with this owner and method.
    ///
    /// The owner is matched by identity (address), not by value. Returns whether a
    /// registration was removed.
    ///
    /// Matching compares addresses. Distinct zero-sized owners may share an address, and the
    /// compiler may merge functions with identical bodies into one. Such targets compare equal,
    /// so either may be the one removed.
    pub fn remove_object<T: ?Sized>(&self, owner: &T, method: A::Method<T>) -> bool {
        self.remove_matching(&Descriptor::Object {
            owner: ptr::from_ref(owner).cast(),
            method: A::method_address::<T>(method),
        })
    }

    /// Removes the first registration (in registration order) made via
    /// [`add_safe_object()`][Self::add_safe_object] for the object `owner` refers to, with this
    /// method.
    ///
    /// If the object has already been destroyed, nothing can be matched and nothing is
    /// removed. Such registrations are skipped by broadcasts and can still be removed by handle.
    /// Returns whether a registration was removed.
    pub fn remove_safe_object<T: ?Sized>(&self, owner: &Weak<T>, method: A::Method<T>) -> bool {
        owner
            .upgrade()
            .is_some_and(|owner| self.remove_shared_object(&owner, method))
    }

    /// Removes the first registration (in registration order) made via
    /// [`add_safe_object()`][Self::add_safe_object] or
    /// [`add_shared_object()`][Self::add_shared_object] for this object and method.
    ///
    /// Returns whether a registration was removed.
    ///
    /// Matching compares addresses. Distinct zero-sized owners may share an address, and the
    /// compiler may merge functions with identical bodies into one. Such targets compare equal,
    /// so either may be the one removed.
    pub fn remove_shared_object<T: ?Sized>(&self, owner: &Rc<T>, method: A::Method<T>) -> bool {
        self.remove_matching(&Descriptor::SafeObject {
            owner: Rc::as_ptr(owner).cast(),
            method: A::method_address::<T>(method),
        })
    }

    fn remove_matching(&self, descriptor: &Descriptor) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();

            entries
                .iter()
                .position(|entry| entry.target.matches(descriptor))
                .map(|index| entries.remove(index))
        };

        self.retire(removed)
    }

    fn retire(&self, removed: Option<Rc<Entry<'a, A, R>>>) -> bool {
        let Some(entry) = removed else {
            return false;
        };

        entry.removed.set(true);

        trace!(
            registry = ?self.id,
            kind = ?entry.handle.kind(),
            sequence = entry.handle.sequence(),
            "removed delegate target"
        );

        true
    }

    /// Removes all registrations, dropping every owned target. Calling this on an empty
    /// registry does nothing.
    pub fn clear(&self) {
        let cleared = mem::take(&mut *self.entries.borrow_mut());

        for entry in &cleared {
            entry.removed.set(true);
        }

        if !cleared.is_empty() {
            trace!(count = cleared.len(), "cleared delegate targets");
        }
    }

    /// The number of registrations, including expired ones that have not been pruned.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether there are no registrations.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether the registration identified by `handle` is still present.
    #[must_use]
    #[inline]
    pub fn contains(&self, handle: BindingHandle) -> bool {
        handle.registry() == self.id
            && self
                .entries
                .borrow()
                .binary_search_by_key(&handle.sequence(), |entry| entry.handle.sequence())
                .is_ok()
    }

    /// The policy applied to registrations whose lifetime-checked owner has been destroyed.
    #[must_use]
    #[inline]
    pub fn expired_policy(&self) -> ExpiredPolicy {
        self.expired_policy
    }

    /// Invokes every live registered target with a clone of `args`.
    ///
    /// Returns the number of targets invoked. Targets whose owner has been destroyed are
    /// skipped without error and are not counted.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use delegates::MulticastDelegate;
    ///
    /// struct Window;
    ///
    /// impl Window {
    ///     fn on_close(&self, reason: &str) {
    ///         println!("closing: {reason}");
    ///     }
    /// }
    ///
    /// let window = Rc::new(Window);
    ///
    /// let on_close = MulticastDelegate::<(&str,)>::new();
    /// on_close.add_shared_object(&window, Window::on_close);
    ///
    /// assert_eq!(on_close.broadcast(("user request",)), 1);
    ///
    /// drop(window);
    ///
    /// assert_eq!(on_close.broadcast(("shutdown",)), 0);
    /// ```
    #[inline]
    pub fn broadcast(&self, args: A) -> usize
    where
        A: Clone,
    {
        let mut invoked: usize = 0;

        _ = self.dispatch(args, |_| {
            invoked = invoked
                .checked_add(1)
                .expect("cannot invoke more targets than fit in memory");
            ControlFlow::<Infallible>::Continue(())
        });

        invoked
    }

    /// Invokes every live registered target with a clone of `args` and collects their results,
    /// in the order the targets were invoked.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::MulticastDelegate;
    ///
    /// fn double(value: i32) -> i32 {
    ///     value * 2
    /// }
    ///
    /// fn square(value: i32) -> i32 {
    ///     value * value
    /// }
    ///
    /// let transforms = MulticastDelegate::<(i32,), i32>::new();
    /// transforms.add_function(double);
    /// transforms.add_function(square);
    ///
    /// assert_eq!(transforms.broadcast_collect((5,)), vec![10, 25]);
    /// ```
    pub fn broadcast_collect(&self, args: A) -> Vec<R>
    where
        A: Clone,
    {
        let mut results = Vec::new();

        _ = self.dispatch(args, |result| {
            results.push(result);
            ControlFlow::<Infallible>::Continue(())
        });

        results
    }

    /// Invokes targets from a snapshot of the registry until `on_result` breaks.
    fn dispatch<B>(&self, args: A, mut on_result: impl FnMut(R) -> ControlFlow<B>) -> ControlFlow<B>
    where
        A: Clone,
    {
        // Snapshot so that the registry is not borrowed while targets run. Entries removed during
        // the broadcast are only dropped once the snapshot is.
        let snapshot = self.entries.borrow().clone();

        let mut flow = ControlFlow::Continue(());

        for entry in &snapshot {
            if entry.removed.get() {
                continue;
            }

            match entry.target.invoke(args.clone()) {
                Outcome::Returned(result) => {
                    flow = on_result(result);

                    if flow.is_break() {
                        break;
                    }
                }
                Outcome::Expired => {
                    trace!(
                        sequence = entry.handle.sequence(),
                        "skipped delegate target whose owner has been destroyed"
                    );
                }
                Outcome::Busy => {
                    trace!(
                        sequence = entry.handle.sequence(),
                        "skipped delegate target that is already executing"
                    );
                }
            }
        }

        drop(snapshot);

        if self.expired_policy == ExpiredPolicy::Prune {
            self.prune_expired();
        }

        flow
    }

    // The early return only avoids reallocating, it cannot change the outcome.
    #[cfg_attr(test, mutants::skip)]
    fn prune_expired(&self) {
        let expired = {
            let mut entries = self.entries.borrow_mut();

            if !entries.iter().any(|entry| entry.target.is_expired()) {
                return;
            }

            let (expired, live): (Vec<_>, Vec<_>) = mem::take(&mut *entries)
                .into_iter()
                .partition(|entry| entry.target.is_expired());

            *entries = live;
            expired
        };

        for entry in &expired {
            entry.removed.set(true);
        }

        trace!(count = expired.len(), "pruned expired delegate targets");
    }
}

impl<'a, A, E> MulticastDelegate<'a, A, Result<(), E>>
where
    A: Signature<Result<(), E>> + 'a,
    E: 'a,
{
    /// Invokes every live registered target with a clone of `args`, stopping at the first
    /// target that returns an error.
    ///
    /// Returns the number of targets invoked if all of them succeeded.
    ///
    /// # Errors
    ///
    /// Returns the first error returned by a target. Targets after it in this broadcast are
    /// not invoked.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::MulticastDelegate;
    ///
    /// fn validate_positive(value: i32) -> Result<(), String> {
    ///     if value > 0 { Ok(()) } else { Err(format!("{value} is not positive")) }
    /// }
    ///
    /// fn validate_even(value: i32) -> Result<(), String> {
    ///     if value % 2 == 0 { Ok(()) } else { Err(format!("{value} is not even")) }
    /// }
    ///
    /// let validators = MulticastDelegate::<(i32,), Result<(), String>>::new();
    /// validators.add_function(validate_positive);
    /// validators.add_function(validate_even);
    ///
    /// assert_eq!(validators.try_broadcast((4,)), Ok(2));
    /// assert_eq!(validators.try_broadcast((-3,)), Err("-3 is not positive".to_string()));
    /// ```
    pub fn try_broadcast(&self, args: A) -> Result<usize, E>
    where
        A: Clone,
    {
        let mut invoked: usize = 0;

        let flow = self.dispatch(args, |result| {
            invoked = invoked
                .checked_add(1)
                .expect("cannot invoke more targets than fit in memory");

            match result {
                Ok(()) => ControlFlow::Continue(()),
                Err(error) => ControlFlow::Break(error),
            }
        });

        match flow {
            ControlFlow::Continue(()) => Ok(invoked),
            ControlFlow::Break(error) => Err(error),
        }
    }
}

impl<'a, A: Signature<R> + 'a, R: 'a> Default for MulticastDelegate<'a, A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Signature<R>, R> Debug for MulticastDelegate<'_, A, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MulticastDelegate")
            .field("id", &self.id)
            .field("sequence", &self.sequence)
            .field("len", &self.len())
            .field("expired_policy", &self.expired_policy)
            .finish()
    }
}
