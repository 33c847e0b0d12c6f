// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Vector, quaternion and angle primitives
//!
//! World space uses x = east, y = north, z = up (meters). Depth below the
//! sea surface is therefore `-z`. Headings are nautical: degrees clockwise
//! from north.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 2D vector in the horizontal plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// East component
    pub x: f64,
    /// North component
    pub y: f64,
}

impl Vector2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vector2::new(0.0, 0.0)
    }

    /// Dot product
    pub fn dot(&self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Distance to another point
    pub fn distance(&self, other: Vector2) -> f64 {
        (other - *self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normal(&self) -> Vector2 {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Vector2::zero()
        }
    }

    /// Lift into 3D with the given height
    pub fn xy0(&self, z: f64) -> Vector3 {
        Vector3::new(self.x, self.y, z)
    }

    /// Check that both components are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// 3D vector with double-precision components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// East component
    pub x: f64,
    /// North component
    pub y: f64,
    /// Up component
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vector3::new(0.0, 0.0, 0.0)
    }

    /// Dot product
    pub fn dot(&self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared length
    pub fn square_length(&self) -> f64 {
        self.dot(*self)
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        self.square_length().sqrt()
    }

    /// Distance to another point
    pub fn distance(&self, other: Vector3) -> f64 {
        (other - *self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normal(&self) -> Vector3 {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Vector3::zero()
        }
    }

    /// Horizontal part of the vector
    pub fn xy(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Check that all components are finite (not NaN or infinite)
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Vector3) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Vector3) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// Nautical angle in degrees, normalized to `[0, 360)`
///
/// # Examples
///
/// ```
/// use naval_sim::math::Angle;
///
/// let a = Angle::new(-90.0);
/// assert_eq!(a.value(), 270.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    /// Create an angle from degrees, wrapping into `[0, 360)`
    pub fn new(degrees: f64) -> Self {
        let mut d = degrees % 360.0;
        if d < 0.0 {
            d += 360.0;
        }
        // -1e-17 % 360 + 360 rounds to exactly 360
        if d >= 360.0 {
            d = 0.0;
        }
        Angle(d)
    }

    /// Create an angle from radians
    pub fn from_rad(radians: f64) -> Self {
        Angle::new(radians.to_degrees())
    }

    /// Heading of a horizontal direction vector
    pub fn from_direction(dir: Vector2) -> Self {
        Angle::from_rad(dir.x.atan2(dir.y))
    }

    /// Value in degrees, `[0, 360)`
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Value in degrees, `(-180, 180]`
    pub fn value_pm180(&self) -> f64 {
        if self.0 > 180.0 {
            self.0 - 360.0
        } else {
            self.0
        }
    }

    /// Value in radians
    pub fn rad(&self) -> f64 {
        self.0.to_radians()
    }

    /// Sine of the angle
    pub fn sin(&self) -> f64 {
        self.rad().sin()
    }

    /// Cosine of the angle
    pub fn cos(&self) -> f64 {
        self.rad().cos()
    }

    /// Unit direction vector of this heading (north = +y, east = +x)
    pub fn direction(&self) -> Vector2 {
        Vector2::new(self.sin(), self.cos())
    }

    /// Signed difference `other - self` in degrees, `(-180, 180]`
    pub fn diff_to(&self, other: Angle) -> f64 {
        Angle::new(other.0 - self.0).value_pm180()
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle::new(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle::new(self.0 - rhs.0)
    }
}

/// Rotation quaternion `s + v`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar part
    pub s: f64,
    /// Vector part
    pub v: Vector3,
}

impl Quaternion {
    /// Create a quaternion from its parts
    pub const fn new(s: f64, v: Vector3) -> Self {
        Quaternion { s, v }
    }

    /// The identity rotation
    pub const fn neutral_rot() -> Self {
        Quaternion::new(1.0, Vector3::zero())
    }

    /// Rotation of `degrees` (counter-clockwise) around the axis `(x, y, z)`
    pub fn rot(degrees: f64, x: f64, y: f64, z: f64) -> Self {
        let axis = Vector3::new(x, y, z).normal();
        let half = degrees.to_radians() * 0.5;
        Quaternion::new(half.cos(), axis * half.sin())
    }

    /// Orientation of a surface body travelling along `heading`
    pub fn from_heading(heading: Angle) -> Self {
        Quaternion::rot(-heading.value(), 0.0, 0.0, 1.0)
    }

    /// Conjugate, which is the inverse for unit quaternions
    pub fn conj(&self) -> Self {
        Quaternion::new(self.s, -self.v)
    }

    /// Length of the quaternion
    pub fn length(&self) -> f64 {
        (self.s * self.s + self.v.square_length()).sqrt()
    }

    /// Re-normalize to unit length; returns identity for degenerate input
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Quaternion::new(self.s / len, self.v * (1.0 / len))
        } else {
            Quaternion::neutral_rot()
        }
    }

    /// Rotate a vector by this (unit) quaternion
    pub fn rotate(&self, p: Vector3) -> Vector3 {
        let t = self.v.cross(p) * 2.0;
        p + t * self.s + self.v.cross(t)
    }

    /// Heading of the rotated local forward (+y) axis
    pub fn heading(&self) -> Angle {
        Angle::from_direction(self.rotate(Vector3::new(0.0, 1.0, 0.0)).xy())
    }

    /// Check that all parts are finite
    pub fn is_valid(&self) -> bool {
        self.s.is_finite() && self.v.is_valid()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::neutral_rot()
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.s * rhs.s - self.v.dot(rhs.v),
            rhs.v * self.s + self.v * rhs.s + self.v.cross(rhs.v),
        )
    }
}

/// Sign of a value as -1, 0 or 1
pub fn signum0(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Uniform clamped B-spline over scalar control points, parameter in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    degree: usize,
    points: Vec<f64>,
    knots: Vec<f64>,
}

impl BSpline {
    /// Create a spline of `degree` through `points`
    ///
    /// # Panics
    ///
    /// Panics if there are not more control points than the degree.
    pub fn new(degree: usize, points: Vec<f64>) -> Self {
        assert!(points.len() > degree, "BSpline needs more than {} control points", degree);
        let n = points.len();
        let inner = n - degree;
        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat(0.0).take(degree));
        knots.extend((0..=inner).map(|i| i as f64 / inner as f64));
        knots.extend(std::iter::repeat(1.0).take(degree));
        BSpline { degree, points, knots }
    }

    /// Evaluate at `t`, clamped to `[0, 1]`
    pub fn value(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let p = self.degree;
        let n = self.points.len();
        // knot span with knots[k] <= t < knots[k + 1], last span for t == 1
        let mut k = p;
        while k < n - 1 && self.knots[k + 1] <= t {
            k += 1;
        }
        let mut d: Vec<f64> = (0..=p).map(|j| self.points[j + k - p]).collect();
        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = j + k - p;
                let denom = self.knots[i + p + 1 - r] - self.knots[i];
                let alpha = if denom > 0.0 { (t - self.knots[i]) / denom } else { 0.0 };
                d[j] = (1.0 - alpha) * d[j - 1] + alpha * d[j];
            }
        }
        d[p]
    }
}
