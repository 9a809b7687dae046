#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Typed delegates that bind a call signature to free functions, object methods and closures.
//!
//! A delegate lets the code that raises a notification call "whoever is interested" without
//! knowing who that is. This crate provides two flavors:
//!
//! - [`Delegate`] holds at most one target and returns the target's result to the caller.
//! - [`MulticastDelegate`] holds any number of targets and broadcasts each call to all of them,
//!   in registration order.
//!
//! Both are generic over a [`Signature`], expressed as a tuple of argument types plus a return
//! type. `Delegate<(i32, i32), i32>` accepts targets that take two `i32` and return an `i32`.
//!
//! # Target kinds
//!
//! | Kind | Bound via | Lifetime of the owner |
//! |------|-----------|-----------------------|
//! | [`TargetKind::Function`] | `fn` pointer | not applicable |
//! | [`TargetKind::Object`] | `&'a T` + method | must outlive the delegate |
//! | [`TargetKind::SafeObject`] | `Weak<T>` + method | skipped once destroyed |
//! | [`TargetKind::Closure`] | `FnMut(A) -> R` | owned by the delegate |
//!
//! Borrowed objects are checked at compile time. Weakly referenced objects are checked on every
//! call.
//!
//! Methods take `&self`. Objects that need to change state in response to a call use interior
//! mutability, the same as any other shared object.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use delegates::MulticastDelegate;
//!
//! fn difference(a: i32, b: i32) {
//!     println!("difference: {}", a - b);
//! }
//!
//! struct Recorder {
//!     sums: RefCell<Vec<i32>>,
//! }
//!
//! impl Recorder {
//!     fn record_sum(&self, a: i32, b: i32) {
//!         self.sums.borrow_mut().push(a + b);
//!     }
//! }
//!
//! let recorder = Rc::new(Recorder {
//!     sums: RefCell::new(Vec::new()),
//! });
//!
//! let on_pair = MulticastDelegate::<(i32, i32)>::new();
//! on_pair.add_function(difference);
//! on_pair.add_shared_object(&recorder, Recorder::record_sum);
//! on_pair.add_closure(|(a, b)| println!("product: {}", a * b));
//!
//! assert_eq!(on_pair.broadcast((5, 6)), 3);
//! assert_eq!(*recorder.sums.borrow(), vec![11]);
//!
//! // Destroying the recorder does not leave a dangling target behind.
//! drop(recorder);
//! assert_eq!(on_pair.broadcast((5, 6)), 2);
//! ```
//!
//! # Removing targets
//!
//! Every registration returns a [`BindingHandle`] that identifies it for removal. Functions and
//! object methods can also be removed by naming what was bound, e.g.
//! [`MulticastDelegate::remove_function()`]. Closures can only be removed by handle.
//!
//! # Thread safety
//!
//! Delegates are single-threaded. Neither [`Delegate`] nor [`MulticastDelegate`] is [`Send`]
//! or [`Sync`].

mod builder;
mod delegate;
mod error;
mod expired_policy;
mod handle;
mod multicast;
mod signature;
mod target;

pub use builder::*;
pub use delegate::*;
pub use error::*;
pub use expired_policy::*;
pub use handle::*;
pub use multicast::*;
pub use signature::*;
pub use target::*;
