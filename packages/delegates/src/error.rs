use thiserror::Error;

/// Reasons why [`Delegate::try_invoke()`][crate::Delegate::try_invoke] could not call a target.
///
/// Neither case is a fault: an unbound delegate and a destroyed lifetime-checked owner are
/// ordinary states. [`Delegate::invoke()`][crate::Delegate::invoke] treats both by returning the
/// default value of the return type instead.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum InvokeError {
    /// No target is bound to the delegate.
    #[error("no target is bound to the delegate")]
    Unbound,

    /// The target is a method bound through a weak reference and the object it was bound to
    /// has been destroyed.
    #[error("the object the delegate target was bound to has been destroyed")]
    Expired,
}
