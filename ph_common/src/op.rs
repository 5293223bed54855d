//! Tiny helper macro for deriving arithmetic operator impls on newtype wrappers.

#[macro_export]
macro_rules! op {
    (binary $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self($op::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            fn $method(&mut self, rhs: Self) {
                $op::$method(&mut self.0, rhs.0)
            }
        }
    };
    (unary $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self($op::$method(self.0))
            }
        }
    };
}
