//! Integer 2D geometry.
//!
//! A `Vec2` is used both as a size (width, height in character cells) and as
//! a position (column, row). Components are signed: layout can place things
//! above the viewport (scrolled content has negative rows) and resolved sizes
//! use `-1` as the "undefined" marker before they are settled.
//!
//! Arithmetic saturates. Sizes come from page attributes, and a page asking
//! for an absurd size gets a clipped layout, not an overflow.

use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A pair of integer cell coordinates or extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    /// `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Clamp both components to at least zero.
    #[inline]
    #[must_use]
    pub fn non_negative(self) -> Self {
        self.max(Self::ZERO)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vec2::new(3, 4);
        let b = Vec2::new(1, 6);
        assert_eq!(a + b, Vec2::new(4, 10));
        assert_eq!(a - b, Vec2::new(2, -2));

        let mut c = a;
        c += b;
        c -= Vec2::new(4, 0);
        assert_eq!(c, Vec2::new(0, 10));
    }

    #[test]
    fn arithmetic_saturates() {
        let big = Vec2::new(i32::MAX, i32::MIN);
        assert_eq!(big + Vec2::new(1, -1), big);
        assert_eq!(big - Vec2::new(-5, 5), big);
    }

    #[test]
    fn max_and_non_negative() {
        assert_eq!(Vec2::new(2, 9).max(Vec2::new(5, 1)), Vec2::new(5, 9));
        assert_eq!(Vec2::new(-3, 2).non_negative(), Vec2::new(0, 2));
        assert_eq!(Vec2::default(), Vec2::ZERO);
    }
}
