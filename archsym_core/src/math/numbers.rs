//! Group orders grow far beyond `u128` (a few dozen points suffice), so
//! orders are kept in a wide fixed-precision integer. 1024 bits cover every
//! group on well over a hundred points, which is more than the rest of the
//! library can handle anyway.
use std::{
    fmt::{Debug, Display},
    iter::Product,
    ops::{Add, AddAssign, Div, Mul, MulAssign, Rem, Sub},
    str::FromStr,
};

use bnum::types::U1024;

/// An unsigned arbitrary-size group order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Order {
    value: U1024,
}

impl Order {
    pub fn zero() -> Order {
        Order { value: U1024::ZERO }
    }

    pub fn one() -> Order {
        Order { value: U1024::ONE }
    }

    /// Returns `true` if the value is zero and `false` otherwise
    pub fn is_zero(&self) -> bool {
        self.value == U1024::ZERO
    }

    /// Raise to the `exp`-th power.
    pub fn pow(&self, exp: usize) -> Order {
        let mut result = Order::one();
        for _ in 0..exp {
            result *= *self;
        }
        result
    }

    /// Lossy conversion for small orders, test assertions mostly.
    pub fn to_u64(&self) -> u64 {
        use bnum::cast::As;

        self.value.as_()
    }
}

impl Debug for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl FromStr for Order {
    type Err = bnum::errors::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Order {
            value: s.trim().parse()?,
        })
    }
}

macro_rules! from {
    ($($ty: ty),+) => {$(
        impl From<$ty> for Order {
            fn from(value: $ty) -> Self {
                Order {
                    value: U1024::from(value as u64),
                }
            }
        }
    )+};
}

from!(u8, u16, u32, u64, usize);

macro_rules! ops {
    ($(($trait: ident, $fn: ident)),+) => {$(
        impl $trait for Order {
            type Output = Order;

            fn $fn(self, rhs: Order) -> Order {
                Order {
                    value: self.value.$fn(rhs.value),
                }
            }
        }
    )+};
}

ops!((Add, add), (Sub, sub), (Mul, mul), (Div, div), (Rem, rem));

impl AddAssign for Order {
    fn add_assign(&mut self, rhs: Order) {
        *self = *self + rhs;
    }
}

impl MulAssign for Order {
    fn mul_assign(&mut self, rhs: Order) {
        *self = *self * rhs;
    }
}

impl Product for Order {
    fn product<I: Iterator<Item = Order>>(iter: I) -> Order {
        iter.fold(Order::one(), |acc, v| acc * v)
    }
}

#[cfg(test)]
mod tests {
    use super::Order;

    #[test]
    fn arithmetic() {
        let a = Order::from(6_u32);
        let b = Order::from(8_u32);

        assert_eq!((a * b).to_u64(), 48);
        assert_eq!((b / a).to_u64(), 1);
        assert_eq!((a + b).to_u64(), 14);
        assert!(Order::zero().is_zero());
        assert!(!Order::one().is_zero());
    }

    #[test]
    fn pow_and_product() {
        assert_eq!(Order::from(6_u32).pow(4).to_u64(), 1296);
        assert_eq!(
            [2_usize, 3, 4]
                .into_iter()
                .map(Order::from)
                .product::<Order>()
                .to_u64(),
            24
        );
    }

    #[test]
    fn parses_large_values() {
        let order: Order = "43252003274489856000".parse().unwrap();
        assert_eq!(format!("{order}"), "43252003274489856000");
    }
}
