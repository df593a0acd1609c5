//! Fixed-point math utilities for the arena simulation.
//!
//! All simulation quantities that can be fractional (positions, speeds,
//! ranges, elixir, projectile progress) use fixed-point arithmetic so a
//! seeded battle replays bit-for-bit on any platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a whole fixed-point number in a `const` context.
#[must_use]
pub const fn fixed_int(value: i32) -> Fixed {
    Fixed::from_bits((value as i64) << 32)
}

/// Build the fixed-point ratio `numerator / denominator` in a `const` context.
///
/// The result is rounded to the nearest representable value, so repeated
/// accumulation of e.g. `1/20` reaches `1` after exactly 20 steps.
#[must_use]
pub const fn fixed_ratio(numerator: i32, denominator: i32) -> Fixed {
    let num = (numerator as i64) << 32;
    let den = denominator as i64;
    Fixed::from_bits((num + den / 2) / den)
}

/// Whole units of a non-negative quantity (e.g. spendable elixir), rounding down.
#[must_use]
pub fn floor_u32(value: Fixed) -> u32 {
    value.saturating_to_num::<u32>()
}

/// A point (or direction) on the arena plane.
///
/// The arena is laid out on the X/Z plane: X runs across the lanes,
/// Z runs from the player's king tower (negative) to the opponent's (positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Lateral coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Depth coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// A point in 3D space, used for projectile flight paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// Lateral coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Height above the arena floor.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Depth coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

impl Point3 {
    /// Create a new 3D point.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Lift a plane point to the given height.
    #[must_use]
    pub const fn from_plane(point: Point, height: Fixed) -> Self {
        Self {
            x: point.x,
            y: height,
            z: point.z,
        }
    }

    /// Linearly interpolate between two points.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
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

/// Serde support for human-edited data files.
///
/// Catalogs and configs are written by hand, so fractional values are
/// read and written as decimal numbers rather than raw bits.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("value {value} out of range")))
    }
}

impl Point {
    /// Create a new plane point.
    #[must_use]
    pub const fn new(x: Fixed, z: Fixed) -> Self {
        Self { x, z }
    }

    /// Create a point from whole-number coordinates.
    #[must_use]
    pub const fn from_ints(x: i32, z: i32) -> Self {
        Self {
            x: fixed_int(x),
            z: fixed_int(z),
        }
    }

    /// Create a point from decimal coordinates.
    ///
    /// Only for host-facing entry points (placement input, random draws);
    /// the simulation itself never produces floats.
    #[must_use]
    pub fn from_f64(x: f64, z: f64) -> Self {
        Self {
            x: Fixed::saturating_from_num(x),
            z: Fixed::saturating_from_num(z),
        }
    }

    /// Origin of the arena (center of the river).
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] instead of overflowing.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dz = self.z.saturating_sub(other.z);
        dx.saturating_mul(dx).saturating_add(dz.saturating_mul(dz))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Whether `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.z * other.z
    }

    /// Scale the vector by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self {
            x: self.x * factor,
            z: self.z * factor,
        }
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.z / len)
    }

    /// Clamp each coordinate into the given inclusive ranges.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            x: self.x.clamp(min.x, max.x),
            z: self.z.clamp(min.z, max.z),
        }
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            z: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance_squared() {
        let a = Point::from_ints(3, 0);
        let b = Point::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::from_ints(3, 0);
        let b = Point::from_ints(0, 4);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_huge_distances_saturate() {
        let a = Point::from_ints(-60_000, 0);
        let b = Point::from_ints(60_000, 60_000);
        assert_eq!(a.distance_squared(b), Fixed::MAX);
        assert!(a.within(b, fixed_int(60_000)));
        assert!(!a.within(b, fixed_int(3)));
    }

    #[test]
    fn test_within_is_inclusive() {
        let a = Point::from_ints(0, 0);
        let b = Point::from_ints(0, 3);
        assert!(a.within(b, Fixed::from_num(3)));
        assert!(!a.within(b, Fixed::from_num(2)));
    }

    #[test]
    fn test_const_helpers() {
        assert_eq!(fixed_int(-6), Fixed::from_num(-6));
        assert_eq!(fixed_ratio(3, 2), Fixed::from_num(1.5));
        assert_eq!(Point::from_ints(-6, 8), Point::new(Fixed::from_num(-6), Fixed::from_num(8)));
    }

    #[test]
    fn test_floor_u32() {
        assert_eq!(floor_u32(Fixed::from_num(1.9)), 1);
        assert_eq!(floor_u32(Fixed::from_num(2)), 2);
        assert_eq!(floor_u32(Fixed::from_num(-0.5)), 0);
    }

    #[test]
    fn test_ratio_accumulates_to_one() {
        let step = fixed_ratio(1, 20);
        let mut progress = Fixed::ZERO;
        for _ in 0..20 {
            progress += step;
        }
        assert!(progress >= Fixed::ONE);
    }

    #[test]
    fn test_point_normalize() {
        let v = Point::from_ints(3, 4);
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!(
            (len_sq - Fixed::ONE).abs() < epsilon,
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        // Direction preserved: x/z ratio matches 3/4
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.z * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Point::ZERO.normalize(), Point::ZERO);
    }

    #[test]
    fn test_clamp() {
        let min = Point::from_ints(-9, -15);
        let max = Point::from_ints(9, 15);
        assert_eq!(Point::from_ints(12, -20).clamp(min, max), Point::from_ints(9, -15));
    }

    #[test]
    fn test_point3_lerp() {
        let a = Point3::new(Fixed::ZERO, Fixed::from_num(2), Fixed::ZERO);
        let b = Point3::new(Fixed::from_num(10), Fixed::ZERO, Fixed::from_num(20));
        let mid = a.lerp(b, Fixed::from_num(0.5));
        assert_eq!(
            mid,
            Point3::new(Fixed::from_num(5), Fixed::ONE, Fixed::from_num(10))
        );
    }
}
