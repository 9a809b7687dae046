use std::any::type_name;
use std::marker::PhantomData;

use crate::{ExpiredPolicy, MulticastDelegate, Signature};

/// Builder for creating an instance of [`MulticastDelegate`].
///
/// You only need to use this builder if you want to customize the registry configuration.
/// The default configuration used by [`MulticastDelegate::new()`][1] is sufficient for most
/// use cases.
///
/// # Examples
///
/// ```
/// use delegates::{ExpiredPolicy, MulticastDelegate};
///
/// let delegate = MulticastDelegate::<(u32, u32)>::builder()
///     .expired_policy(ExpiredPolicy::Prune)
///     .capacity(16)
///     .build();
///
/// assert!(delegate.is_empty());
/// ```
///
/// [1]: MulticastDelegate::new
#[must_use]
pub struct MulticastDelegateBuilder<A, R = ()> {
    expired_policy: ExpiredPolicy,
    capacity: usize,

    _signature: PhantomData<fn(A) -> R>,
}

impl<A, R> std::fmt::Debug for MulticastDelegateBuilder<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MulticastDelegateBuilder")
            .field(
                "signature",
                &format_args!("{}({})", type_name::<R>(), type_name::<A>()),
            )
            .field("expired_policy", &self.expired_policy)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<A, R> MulticastDelegateBuilder<A, R> {
    pub(crate) fn new() -> Self {
        Self {
            expired_policy: ExpiredPolicy::default(),
            capacity: 0,
            _signature: PhantomData,
        }
    }

    /// Sets the [expired policy][ExpiredPolicy] for the registry. This governs what happens to
    /// registrations whose lifetime-checked owner has been destroyed.
    ///
    /// # Examples
    ///
    /// ```
    /// use delegates::{ExpiredPolicy, MulticastDelegate};
    ///
    /// let delegate = MulticastDelegate::<()>::builder()
    ///     .expired_policy(ExpiredPolicy::Retain)
    ///     .build();
    /// ```
    pub fn expired_policy(mut self, policy: ExpiredPolicy) -> Self {
        self.expired_policy = policy;
        self
    }

    /// Reserves storage for at least `capacity` registrations up front.
    ///
    /// The registry grows beyond this as needed.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the registry with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delegates::MulticastDelegate;
    ///
    /// let delegate = MulticastDelegate::<(String,)>::builder().build();
    /// ```
    #[must_use]
    pub fn build<'a>(self) -> MulticastDelegate<'a, A, R>
    where
        A: Signature<R> + 'a,
        R: 'a,
    {
        MulticastDelegate::new_inner(self.expired_policy, self.capacity)
    }
}
