//! Fixed-point math utilities for deterministic simulation.
//!
//! All world-space geometry (grid layout, patrol path, ranges) uses
//! fixed-point arithmetic so that the same inputs resolve to the same
//! targets on every platform.

use fixed::types::{I32F32, I64F64};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Wide fixed-point type for squared distances.
///
/// The square of any [`Fixed`] value fits, so comparing a squared distance
/// against a squared range never overflows.
pub type WideFixed = I64F64;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole-number components.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`WideFixed::MAX`], which is larger than the square of
    /// any [`Fixed`] radius.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> WideFixed {
        let dx = WideFixed::from_num(self.x) - WideFixed::from_num(other.x);
        let dy = WideFixed::from_num(self.y) - WideFixed::from_num(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance.
    ///
    /// Axis-aligned pairs are measured exactly; everything else goes
    /// through [`fixed_sqrt`].
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dy = self.y.saturating_sub(other.y).saturating_abs();
        if dx == Fixed::ZERO {
            return dy;
        }
        if dy == Fixed::ZERO {
            return dx;
        }
        wide_sqrt(self.distance_squared(other))
    }

    /// Returns true when `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        if radius < Fixed::ZERO {
            return false;
        }
        let radius = WideFixed::from_num(radius);
        self.distance_squared(other) <= radius * radius
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Convert a wall-clock duration to fixed-point seconds (microsecond precision).
#[must_use]
pub fn duration_to_seconds(duration: std::time::Duration) -> Fixed {
    let whole = Fixed::saturating_from_num(duration.as_secs());
    whole + Fixed::from_num(duration.subsec_micros()) / Fixed::from_num(1_000_000)
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    wide_sqrt(WideFixed::from_num(value))
}

/// Square root of a wide value, saturating at [`Fixed::MAX`].
#[must_use]
pub fn wide_sqrt(value: WideFixed) -> Fixed {
    if value <= WideFixed::ZERO {
        return Fixed::ZERO;
    }
    let max = WideFixed::from_num(Fixed::MAX);
    if value >= max * max {
        return Fixed::MAX;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > WideFixed::from_num(1) {
        Fixed::saturating_from_num(value)
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let wide_mid = WideFixed::from_num(mid);
        let mid_sq = wide_mid * wide_mid;

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
