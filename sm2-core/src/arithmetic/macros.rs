//! Operator trait impls shared by the Montgomery-form types.

/// Implement `Add`, `Sub`, `Mul`, `Neg` and their `*Assign` variants by
/// delegating to the type's inherent `add`, `sub`, `mul` and `neg`.
macro_rules! impl_mont_ops {
    ($ty:ident) => {
        impl_mont_ops!(@binary $ty, Add, add, AddAssign, add_assign);
        impl_mont_ops!(@binary $ty, Sub, sub, SubAssign, sub_assign);
        impl_mont_ops!(@binary $ty, Mul, mul, MulAssign, mul_assign);

        impl core::ops::Neg for $ty {
            type Output = $ty;

            #[inline]
            fn neg(self) -> $ty {
                $ty::neg(&self)
            }
        }

        impl core::ops::Neg for &$ty {
            type Output = $ty;

            #[inline]
            fn neg(self) -> $ty {
                $ty::neg(self)
            }
        }
    };
    (@binary $ty:ident, $op:ident, $method:ident, $assign:ident, $assign_method:ident) => {
        impl core::ops::$op<$ty> for $ty {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: $ty) -> $ty {
                $ty::$method(&self, &rhs)
            }
        }

        impl core::ops::$op<&$ty> for $ty {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: &$ty) -> $ty {
                $ty::$method(&self, rhs)
            }
        }

        impl core::ops::$op<&$ty> for &$ty {
            type Output = $ty;

            #[inline]
            fn $method(self, rhs: &$ty) -> $ty {
                $ty::$method(self, rhs)
            }
        }

        impl core::ops::$assign<$ty> for $ty {
            #[inline]
            fn $assign_method(&mut self, rhs: $ty) {
                *self = $ty::$method(self, &rhs);
            }
        }

        impl core::ops::$assign<&$ty> for $ty {
            #[inline]
            fn $assign_method(&mut self, rhs: &$ty) {
                *self = $ty::$method(self, rhs);
            }
        }
    };
}
