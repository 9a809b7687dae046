use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::{InvokeError, Signature, Target, TargetKind};

/// Holds at most one callable target of signature `R(A...)` and invokes it on request.
///
/// `A` is the tuple of argument types and `R` is the return type. The lifetime `'a` bounds
/// everything a target may borrow: objects bound via [`bind_object()`][Self::bind_object] and
/// state captured by closures must outlive the delegate.
///
/// Binding a new target replaces and drops any previously bound one. Invoking a delegate that
/// has nothing bound is not an error - [`invoke()`][Self::invoke] returns `R::default()` without
/// side effects, and [`try_invoke()`][Self::try_invoke] reports [`InvokeError::Unbound`].
///
/// The delegate performs no work of its own beyond calling the bound target. Panics raised by
/// the target propagate to the caller of `invoke()`.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use delegates::Delegate;
///
/// struct Thermometer {
///     offset: i32,
/// }
///
/// impl Thermometer {
///     fn calibrated(&self, raw: i32) -> i32 {
///         raw + self.offset
///     }
/// }
///
/// let thermometer = Rc::new(Thermometer { offset: -2 });
///
/// let mut read = Delegate::<(i32,), i32>::new();
/// assert_eq!(read.invoke((20,)), 0);
///
/// read.bind_shared_object(&thermometer, Thermometer::calibrated);
/// assert_eq!(read.invoke((20,)), 18);
///
/// // The delegate does not keep the thermometer alive.
/// drop(thermometer);
/// assert_eq!(read.invoke((20,)), 0);
/// ```
///
/// # Thread safety
///
/// This type is single-threaded. It is neither [`Send`] nor [`Sync`].
pub struct Delegate<'a, A: Signature<R>, R = ()> {
    target: Option<Target<'a, A, R>>,
}

impl<'a, A: Signature<R> + 'a, R: 'a> Delegate<'a, A, R> {
    /// Creates a delegate with no target bound.
    #[must_use]
    pub fn new() -> Self {
        Self { target: None }
    }

    /// Creates a delegate bound to a free function.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::Delegate;
    ///
    /// fn negate(value: i64) -> i64 {
    ///     -value
    /// }
    ///
    /// let mut delegate = Delegate::<(i64,), i64>::with_function(negate);
    ///
    /// assert_eq!(delegate.invoke((7,)), -7);
    /// ```
    #[must_use]
    pub fn with_function(function: A::Function) -> Self {
        Self {
            target: Some(Target::function(function)),
        }
    }

    /// Creates a delegate bound to a method of a borrowed object.
    #[must_use]
    pub fn with_object<T: ?Sized>(owner: &'a T, method: A::Method<T>) -> Self {
        Self {
            target: Some(Target::object(owner, method)),
        }
    }

    /// Creates a delegate bound to a method of an object observed through a weak reference.
    #[must_use]
    pub fn with_safe_object<T: ?Sized + 'a>(owner: Weak<T>, method: A::Method<T>) -> Self {
        Self {
            target: Some(Target::safe_object(owner, method)),
        }
    }

    /// Creates a delegate bound to a method of a reference-counted object via a weak
    /// reference to it.
    #[must_use]
    pub fn with_shared_object<T: ?Sized + 'a>(owner: &Rc<T>, method: A::Method<T>) -> Self {
        Self::with_safe_object(Rc::downgrade(owner), method)
    }

    /// Creates a delegate bound to a closure.
    #[must_use]
    pub fn with_closure(closure: impl FnMut(A) -> R + 'a) -> Self {
        Self {
            target: Some(Target::closure(closure)),
        }
    }

    /// Binds a free function, replacing any previously bound target.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::Delegate;
    ///
    /// fn double(value: u64) -> u64 {
    ///     value * 2
    /// }
    ///
    /// let mut delegate = Delegate::<(u64,), u64>::new();
    /// delegate.bind_function(double);
    ///
    /// assert_eq!(delegate.invoke((21,)), 42);
    /// ```
    pub fn bind_function(&mut self, function: A::Function) {
        self.unbind();
        self.target = Some(Target::function(function));
    }

    /// Binds a method of a borrowed object, replacing any previously bound target.
    ///
    /// The object is not owned by the delegate. The borrow ensures it outlives the delegate.
    /// Methods receive `&T`; use interior mutability if the method needs to modify the object.
    pub fn bind_object<T: ?Sized>(&mut self, owner: &'a T, method: A::Method<T>) {
        self.unbind();
        self.target = Some(Target::object(owner, method));
    }

    /// Binds a method of an object observed through a weak reference, replacing any
    /// previously bound target.
    ///
    /// The delegate neither extends nor shortens the lifetime of the object. The weak reference
    /// is resolved immediately before every call. Once the object is destroyed, the target is
    /// expired and invoking the delegate behaves as if the method had not been called.
    pub fn bind_safe_object<T: ?Sized + 'a>(&mut self, owner: Weak<T>, method: A::Method<T>) {
        self.unbind();
        self.target = Some(Target::safe_object(owner, method));
    }

    /// Binds a method of a reference-counted object via a weak reference to it.
    ///
    /// Equivalent to [`bind_safe_object()`][Self::bind_safe_object] with
    /// `Rc::downgrade(owner)`.
    pub fn bind_shared_object<T: ?Sized + 'a>(&mut self, owner: &Rc<T>, method: A::Method<T>) {
        self.bind_safe_object(Rc::downgrade(owner), method);
    }

    /// Binds a closure, replacing any previously bound target.
    ///
    /// The closure receives the arguments as a single tuple and is owned by the delegate,
    /// together with any state it captured.
    ///
    /// # Example
    ///
    /// ```rust
    /// use delegates::Delegate;
    ///
    /// let mut calls = 0;
    ///
    /// let mut delegate = Delegate::<(i32, i32), i32>::new();
    /// delegate.bind_closure(move |(a, b)| {
    ///     calls += 1;
    ///     a * b + calls
    /// });
    ///
    /// assert_eq!(delegate.invoke((5, 6)), 31);
    /// assert_eq!(delegate.invoke((5, 6)), 32);
    /// ```
    pub fn bind_closure(&mut self, closure: impl FnMut(A) -> R + 'a) {
        self.unbind();
        self.target = Some(Target::closure(closure));
    }
}

impl<A: Signature<R>, R> Delegate<'_, A, R> {
    /// Drops the bound target, if any. Calling this on an unbound delegate does nothing.
    pub fn unbind(&mut self) {
        self.target = None;
    }

    /// Whether a target is bound.
    ///
    /// A bound lifetime-checked target counts as bound even if its object has been destroyed.
    #[must_use]
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    /// The kind of the bound target, if any.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> Option<TargetKind> {
        self.target.as_ref().map(Target::kind)
    }

    /// Calls the bound target with `args` and returns its result.
    ///
    /// If nothing is bound, or the target is bound to an object that has been destroyed,
    /// returns `R::default()` without calling anything.
    #[inline]
    pub fn invoke(&mut self, args: A) -> R
    where
        R: Default,
    {
        self.try_invoke(args).unwrap_or_default()
    }

    /// Calls the bound target with `args` and returns its result, or reports why no target
    /// could be called.
    ///
    /// Unlike [`invoke()`][Self::invoke], this does not require `R` to have a default value.
    ///
    /// # Errors
    ///
    /// * [`InvokeError::Unbound`] if nothing is bound.
    /// * [`InvokeError::Expired`] if the target is bound to an object that has been destroyed.
    #[inline]
    pub fn try_invoke(&mut self, args: A) -> Result<R, InvokeError> {
        let target = self.target.as_mut().ok_or(InvokeError::Unbound)?;

        target.invoke_mut(args).ok_or(InvokeError::Expired)
    }
}

impl<'a, A: Signature<R> + 'a, R: 'a> Default for Delegate<'a, A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Signature<R>, R> Debug for Delegate<'_, A, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::{Cell, RefCell};

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Delegate<'static, (u32,), u32>: Send, Sync);

    fn subtract(a: i32, b: i32) -> i32 {
        a - b
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    struct Adder {
        c: i32,
        calls: Cell<u32>,
    }

    impl Adder {
        fn new(c: i32) -> Self {
            Self {
                c,
                calls: Cell::new(0),
            }
        }

        fn add_all(&self, a: i32, b: i32) -> i32 {
            self.calls.set(self.calls.get() + 1);
            a + b + self.c
        }
    }

    trait Operation {
        fn apply(&self, a: i32, b: i32) -> i32;
    }

    struct Multiplier;

    impl Operation for Multiplier {
        fn apply(&self, a: i32, b: i32) -> i32 {
            a * b
        }
    }

    /// A value with no `Default`, to show that `try_invoke()` does not require one.
    #[derive(Debug, PartialEq)]
    struct Reading(i32);

    #[test]
    fn unbound_invoke_returns_default() {
        let mut delegate = Delegate::<(i32, i32), i32>::new();

        assert!(!delegate.is_bound());
        assert_eq!(delegate.kind(), None);
        assert_eq!(delegate.invoke((5, 6)), 0);
    }

    #[test]
    fn unbound_unit_invoke_is_noop() {
        let mut delegate = Delegate::<()>::default();

        delegate.invoke(());
    }

    #[test]
    fn unbound_try_invoke_is_unbound_error() {
        let mut delegate = Delegate::<(i32,), Reading>::new();

        assert_eq!(delegate.try_invoke((1,)), Err(InvokeError::Unbound));
    }

    #[test]
    fn function_binding() {
        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_function(subtract);

        assert!(delegate.is_bound());
        assert_eq!(delegate.kind(), Some(TargetKind::Function));
        assert_eq!(delegate.invoke((5, 6)), -1);
    }

    #[test]
    fn object_binding() {
        let adder = Adder::new(6);

        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_object(&adder, Adder::add_all);

        assert_eq!(delegate.kind(), Some(TargetKind::Object));
        assert_eq!(delegate.invoke((5, 6)), 17);
        assert_eq!(adder.calls.get(), 1);
    }

    #[test]
    fn object_binding_through_trait_impl() {
        let multiplier = Multiplier;

        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_object(&multiplier, <Multiplier as Operation>::apply);

        assert_eq!(delegate.invoke((5, 6)), 30);
    }

    #[test]
    fn safe_object_binding_while_alive() {
        let adder = Rc::new(Adder::new(6));

        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_safe_object(Rc::downgrade(&adder), Adder::add_all);

        assert_eq!(delegate.kind(), Some(TargetKind::SafeObject));
        assert_eq!(delegate.invoke((5, 6)), 17);
        assert_eq!(Rc::strong_count(&adder), 1);
    }

    #[test]
    fn safe_object_binding_after_destruction() {
        let adder = Rc::new(Adder::new(6));

        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_shared_object(&adder, Adder::add_all);

        drop(adder);

        assert!(delegate.is_bound());
        assert_eq!(delegate.invoke((5, 6)), 0);
        assert_eq!(delegate.try_invoke((5, 6)), Err(InvokeError::Expired));
    }

    #[test]
    fn closure_binding_owns_state() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut delegate = Delegate::<(&str,)>::new();
        delegate.bind_closure({
            let log = Rc::clone(&log);
            move |(message,)| log.borrow_mut().push(message.to_owned())
        });

        assert_eq!(Rc::strong_count(&log), 2);

        delegate.invoke(("first",));
        delegate.invoke(("second",));

        assert_eq!(*log.borrow(), vec!["first", "second"]);

        delegate.unbind();

        // The captured clone was dropped together with the closure.
        assert_eq!(Rc::strong_count(&log), 1);
    }

    #[test]
    fn try_invoke_without_default() {
        let mut delegate = Delegate::<(i32,), Reading>::new();
        delegate.bind_closure(|(raw,)| Reading(raw * 10));

        assert_eq!(delegate.try_invoke((4,)), Ok(Reading(40)));
    }

    #[test]
    fn rebinding_replaces_previous_target() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let mut delegate = Delegate::<(i32,)>::new();

        delegate.bind_closure({
            let first = Rc::clone(&first);
            move |(value,)| first.set(value)
        });
        delegate.bind_closure({
            let second = Rc::clone(&second);
            move |(value,)| second.set(value)
        });

        // The first closure was released on rebinding.
        assert_eq!(Rc::strong_count(&first), 1);

        delegate.invoke((7,));

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 7);
    }

    #[test]
    fn rebinding_across_kinds() {
        let adder = Adder::new(6);

        let mut delegate = Delegate::<(i32, i32), i32>::new();

        delegate.bind_function(add);
        assert_eq!(delegate.invoke((5, 6)), 11);

        delegate.bind_object(&adder, Adder::add_all);
        assert_eq!(delegate.invoke((5, 6)), 17);

        delegate.bind_function(subtract);
        assert_eq!(delegate.invoke((5, 6)), -1);
        assert_eq!(adder.calls.get(), 1);
    }

    #[test]
    fn unbind_is_idempotent() {
        let mut delegate = Delegate::<(i32, i32), i32>::new();
        delegate.bind_function(add);

        delegate.unbind();
        delegate.unbind();

        assert!(!delegate.is_bound());
        assert_eq!(delegate.invoke((5, 6)), 0);
    }

    #[test]
    fn constructors_bind_each_kind() {
        let adder = Adder::new(6);
        let shared = Rc::new(Adder::new(6));

        let mut function = Delegate::<(i32, i32), i32>::with_function(subtract);
        assert_eq!(function.kind(), Some(TargetKind::Function));
        assert_eq!(function.invoke((5, 6)), -1);

        let mut object = Delegate::<(i32, i32), i32>::with_object(&adder, Adder::add_all);
        assert_eq!(object.kind(), Some(TargetKind::Object));
        assert_eq!(object.invoke((5, 6)), 17);

        let mut safe =
            Delegate::<(i32, i32), i32>::with_safe_object(Rc::downgrade(&shared), Adder::add_all);
        assert_eq!(safe.kind(), Some(TargetKind::SafeObject));
        assert_eq!(safe.invoke((5, 6)), 17);

        let mut from_shared =
            Delegate::<(i32, i32), i32>::with_shared_object(&shared, Adder::add_all);
        assert_eq!(from_shared.kind(), Some(TargetKind::SafeObject));
        assert_eq!(from_shared.invoke((5, 6)), 17);
        assert_eq!(Rc::strong_count(&shared), 1);

        let mut closure = Delegate::<(i32, i32), i32>::with_closure(|(a, b)| a * b);
        assert_eq!(closure.kind(), Some(TargetKind::Closure));
        assert_eq!(closure.invoke((5, 6)), 30);

        drop(shared);
        assert_eq!(safe.try_invoke((5, 6)), Err(InvokeError::Expired));
        assert_eq!(from_shared.try_invoke((5, 6)), Err(InvokeError::Expired));
    }

    #[test]
    fn debug_describes_target() {
        let mut delegate = Delegate::<(i32, i32), i32>::new();
        assert!(format!("{delegate:?}").contains("None"));

        delegate.bind_function(add);
        assert!(format!("{delegate:?}").contains("Function"));
    }
}
