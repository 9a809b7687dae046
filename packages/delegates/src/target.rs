use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::ptr;
use std::rc::{Rc, Weak};

use crate::Signature;

/// The kind of callable a delegate target was bound from.
///
/// Every [`BindingHandle`][crate::BindingHandle] records the kind of the target it refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TargetKind {
    /// A free function pointer.
    Function,

    /// A method bound to a borrowed object. The borrow checker guarantees the object outlives
    /// the binding.
    Object,

    /// A method bound to an object observed through a [`Weak`] reference. If the object is
    /// destroyed, the target becomes expired and is skipped instead of invoked.
    SafeObject,

    /// An owned closure, together with any state it captured.
    Closure,
}

/// What the caller describes when asking a registry to remove a target by the way it was bound,
/// rather than by handle.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Descriptor {
    Function {
        function: *const (),
    },
    Object {
        owner: *const (),
        method: *const (),
    },
    // Only constructed from an owner that is still alive, as an expired weak reference has no
    // identity to match against.
    SafeObject {
        owner: *const (),
        method: *const (),
    },
}

/// A method together with the object it is called on, with the owner type erased.
pub(crate) trait BoundMethod<A, R> {
    /// Calls the method, or returns `None` if the owner no longer exists.
    fn call(&self, args: A) -> Option<R>;

    /// Address of the owner, or `None` if the owner no longer exists.
    fn owner_address(&self) -> Option<*const ()>;

    fn method_address(&self) -> *const ();

    fn is_expired(&self) -> bool;
}

struct ObjectMethod<'a, T: ?Sized, A: Signature<R>, R> {
    owner: &'a T,
    method: A::Method<T>,
}

impl<T: ?Sized, A: Signature<R>, R> BoundMethod<A, R> for ObjectMethod<'_, T, A, R> {
    fn call(&self, args: A) -> Option<R> {
        Some(A::call_method(self.owner, self.method, args))
    }

    fn owner_address(&self) -> Option<*const ()> {
        Some(ptr::from_ref(self.owner).cast::<()>())
    }

    fn method_address(&self) -> *const () {
        A::method_address::<T>(self.method)
    }

    fn is_expired(&self) -> bool {
        false
    }
}

struct SafeObjectMethod<T: ?Sized, A: Signature<R>, R> {
    owner: Weak<T>,
    method: A::Method<T>,
}

impl<T: ?Sized, A: Signature<R>, R> BoundMethod<A, R> for SafeObjectMethod<T, A, R> {
    fn call(&self, args: A) -> Option<R> {
        // The strong reference lives only for the duration of this call.
        let owner = self.owner.upgrade()?;
        Some(A::call_method(&*owner, self.method, args))
    }

    fn owner_address(&self) -> Option<*const ()> {
        self.owner
            .upgrade()
            .map(|owner| Rc::as_ptr(&owner).cast::<()>())
    }

    fn method_address(&self) -> *const () {
        A::method_address::<T>(self.method)
    }

    fn is_expired(&self) -> bool {
        self.owner.strong_count() == 0
    }
}

/// One bound callable, owned by a [`Delegate`][crate::Delegate] or a
/// [`MulticastDelegate`][crate::MulticastDelegate].
///
/// The active variant is fixed at construction and never changes.
pub(crate) enum Target<'a, A: Signature<R>, R> {
    Function(A::Function),
    Object(Box<dyn BoundMethod<A, R> + 'a>),
    SafeObject(Box<dyn BoundMethod<A, R> + 'a>),
    // A closure needs exclusive access while it runs, which a target shared with an in-progress
    // broadcast cannot otherwise provide.
    Closure(RefCell<Box<dyn FnMut(A) -> R + 'a>>),
}

/// Result of invoking a target through a shared reference.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Outcome<R> {
    Returned(R),

    /// The owner of a lifetime-checked target has been destroyed. Nothing was called.
    Expired,

    /// The target is a closure that is already executing further up the stack. Nothing was
    /// called.
    Busy,
}

impl<'a, A: Signature<R> + 'a, R: 'a> Target<'a, A, R> {
    pub(crate) fn function(function: A::Function) -> Self {
        Self::Function(function)
    }

    pub(crate) fn object<T: ?Sized>(owner: &'a T, method: A::Method<T>) -> Self {
        Self::Object(Box::new(ObjectMethod { owner, method }))
    }

    pub(crate) fn safe_object<T: ?Sized + 'a>(owner: Weak<T>, method: A::Method<T>) -> Self {
        Self::SafeObject(Box::new(SafeObjectMethod { owner, method }))
    }

    pub(crate) fn closure(closure: impl FnMut(A) -> R + 'a) -> Self {
        Self::Closure(RefCell::new(Box::new(closure)))
    }
}

impl<A: Signature<R>, R> Target<'_, A, R> {
    pub(crate) fn kind(&self) -> TargetKind {
        match self {
            Self::Function(_) => TargetKind::Function,
            Self::Object(_) => TargetKind::Object,
            Self::SafeObject(_) => TargetKind::SafeObject,
            Self::Closure(_) => TargetKind::Closure,
        }
    }

    /// Invokes the target with exclusive access, returning `None` without invoking anything if
    /// the target is bound to an object that no longer exists.
    pub(crate) fn invoke_mut(&mut self, args: A) -> Option<R> {
        match self {
            Self::Function(function) => Some(A::call_function(*function, args)),
            Self::Object(bound) | Self::SafeObject(bound) => bound.call(args),
            Self::Closure(closure) => Some((closure.get_mut())(args)),
        }
    }

    /// Invokes the target through a shared reference, which may be one of several held by
    /// nested broadcasts.
    ///
    /// Functions and methods may be re-entered freely. A closure that is already executing is
    /// reported as [`Outcome::Busy`] instead of being called again.
    pub(crate) fn invoke(&self, args: A) -> Outcome<R> {
        let result = match self {
            Self::Function(function) => Some(A::call_function(*function, args)),
            Self::Object(bound) | Self::SafeObject(bound) => bound.call(args),
            Self::Closure(closure) => {
                let Ok(mut closure) = closure.try_borrow_mut() else {
                    return Outcome::Busy;
                };

                Some((*closure)(args))
            }
        };

        result.map_or(Outcome::Expired, Outcome::Returned)
    }

    pub(crate) fn is_expired(&self) -> bool {
        match self {
            Self::Object(bound) | Self::SafeObject(bound) => bound.is_expired(),
            Self::Function(_) | Self::Closure(_) => false,
        }
    }

    /// Whether this target was bound from exactly what the descriptor describes.
    ///
    /// Owners and functions are compared by address. Distinct zero-sized owners may share an
    /// address and identical function bodies may be merged, in which case they match each other.
    /// Closures have no descriptor and never match.
    pub(crate) fn matches(&self, descriptor: &Descriptor) -> bool {
        match (self, descriptor) {
            (Self::Function(function), Descriptor::Function { function: wanted }) => {
                ptr::eq(A::function_address(*function), *wanted)
            }
            (Self::Object(bound), Descriptor::Object { owner, method })
            | (Self::SafeObject(bound), Descriptor::SafeObject { owner, method }) => {
                ptr::eq(bound.method_address(), *method)
                    && bound
                        .owner_address()
                        .is_some_and(|address| ptr::eq(address, *owner))
            }
            _ => false,
        }
    }
}

impl<A: Signature<R>, R> Debug for Target<'_, A, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind())
            .field("expired", &self.is_expired())
            .finish()
    }
}
