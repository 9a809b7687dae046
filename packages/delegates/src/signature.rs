/// Describes the call signature of a delegate: `Self` is the tuple of argument types and `R` is
/// the return type.
///
/// A signature `R(A1, A2)` is expressed as the tuple `(A1, A2)` implementing `Signature<R>`.
/// The trait is implemented for tuples of zero to eight elements and cannot be implemented
/// outside this crate.
///
/// For each signature, the trait names the function pointer types that can be bound:
///
/// * [`Function`][Signature::Function] - a free function, e.g. `fn(A1, A2) -> R`.
/// * [`Method<T>`][Signature::Method] - a method of `T` taking `&self`, e.g.
///   `fn(&T, A1, A2) -> R`.
///
/// # Example
///
/// ```rust
/// use delegates::Delegate;
///
/// fn subtract(a: i32, b: i32) -> i32 {
///     a - b
/// }
///
/// // A delegate for the signature `i32(i32, i32)`.
/// let mut delegate = Delegate::<(i32, i32), i32>::new();
/// delegate.bind_function(subtract);
///
/// assert_eq!(delegate.invoke((5, 6)), -1);
/// ```
pub trait Signature<R>: Sized + Sealed {
    /// Free function pointer type matching the signature exactly.
    type Function: Copy;

    /// Method pointer type for a method of `T` that takes `&self` followed by the arguments.
    type Method<T: ?Sized>: Copy;

    /// Calls `function` with the arguments unpacked from the tuple.
    fn call_function(function: Self::Function, args: Self) -> R;

    /// Calls `method` on `owner` with the arguments unpacked from the tuple.
    fn call_method<T: ?Sized>(owner: &T, method: Self::Method<T>, args: Self) -> R;

    /// Address of the function, used to match a registered target against a descriptor.
    fn function_address(function: Self::Function) -> *const ();

    /// Address of the method, used to match a registered target against a descriptor.
    fn method_address<T: ?Sized>(method: Self::Method<T>) -> *const ();
}

trait Sealed {}

macro_rules! impl_signature {
    ($($arg:ident: $ty:ident),*) => {
        impl<$($ty,)*> Sealed for ($($ty,)*) {}

        impl<R, $($ty,)*> Signature<R> for ($($ty,)*) {
            type Function = fn($($ty),*) -> R;
            type Method<T: ?Sized> = fn(&T, $($ty),*) -> R;

            #[inline]
            fn call_function(function: Self::Function, ($($arg,)*): Self) -> R {
                function($($arg),*)
            }

            #[inline]
            fn call_method<T: ?Sized>(owner: &T, method: Self::Method<T>, ($($arg,)*): Self) -> R {
                method(owner, $($arg),*)
            }

            #[inline]
            fn function_address(function: Self::Function) -> *const () {
                function as *const ()
            }

            #[inline]
            fn method_address<T: ?Sized>(method: Self::Method<T>) -> *const () {
                method as *const ()
            }
        }
    };
}

impl_signature!();
impl_signature!(a1: A1);
impl_signature!(a1: A1, a2: A2);
impl_signature!(a1: A1, a2: A2, a3: A3);
impl_signature!(a1: A1, a2: A2, a3: A3, a4: A4);
impl_signature!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
impl_signature!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6);
impl_signature!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6, a7: A7);
impl_signature!(a1: A1, a2: A2, a3: A3, a4: A4, a5: A5, a6: A6, a7: A7, a8: A8);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::ptr;

    use super::*;

    fn answer() -> u32 {
        42
    }

    fn concat(a: &str, b: &str, c: char) -> String {
        format!("{a}{b}{c}")
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn mul(a: i32, b: i32) -> i32 {
        a * b
    }

    struct Offset {
        by: i32,
    }

    impl Offset {
        fn apply(&self, value: i32) -> i32 {
            value + self.by
        }

        fn apply_negated(&self, value: i32) -> i32 {
            -value + self.by
        }
    }

    #[test]
    fn zero_arguments() {
        assert_eq!(<() as Signature<u32>>::call_function(answer, ()), 42);
    }

    #[test]
    fn arguments_are_unpacked_in_order() {
        let result = <(&str, &str, char) as Signature<String>>::call_function(
            concat,
            ("ab", "cd", 'e'),
        );

        assert_eq!(result, "abcde");
    }

    #[test]
    fn method_receives_owner() {
        let offset = Offset { by: 10 };

        let result = <(i32,) as Signature<i32>>::call_method(&offset, Offset::apply, (5,));

        assert_eq!(result, 15);
    }

    #[test]
    fn function_addresses_distinguish_functions() {
        let add_address = <(i32, i32) as Signature<i32>>::function_address(add);
        let mul_address = <(i32, i32) as Signature<i32>>::function_address(mul);

        assert!(!ptr::eq(add_address, mul_address));
        assert!(ptr::eq(
            add_address,
            <(i32, i32) as Signature<i32>>::function_address(add)
        ));
    }

    #[test]
    fn method_addresses_distinguish_methods() {
        let apply = <(i32,) as Signature<i32>>::method_address::<Offset>(Offset::apply);
        let negated = <(i32,) as Signature<i32>>::method_address::<Offset>(Offset::apply_negated);

        assert!(!ptr::eq(apply, negated));
    }
}
