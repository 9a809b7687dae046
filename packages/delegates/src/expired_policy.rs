/// Determines what a [`MulticastDelegate`][crate::MulticastDelegate] does with registrations
/// whose lifetime-checked owner has been destroyed.
///
/// Expired registrations are never invoked, regardless of the policy. The policy only governs
/// whether they keep occupying the registry.
///
/// # Examples
///
/// ```
/// use delegates::{ExpiredPolicy, MulticastDelegate};
///
/// let delegate = MulticastDelegate::<(u32,)>::builder()
///     .expired_policy(ExpiredPolicy::Prune)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ExpiredPolicy {
    /// Expired registrations stay in the registry until removed by handle or cleared.
    /// This is the default.
    ///
    /// This keeps [`len()`][crate::MulticastDelegate::len] stable between explicit
    /// registry operations.
    #[default]
    Retain,

    /// Expired registrations are dropped from the registry at the end of every broadcast.
    ///
    /// Handles of pruned registrations remain safe to present for removal, which then
    /// reports that nothing was removed.
    Prune,
}
