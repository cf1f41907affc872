//! Vector helpers shared by the pose assignment and limb drivers.
//!
//! Every function is pure. Degenerate input (zero-length vectors, coincident
//! points) maps to a defined sentinel instead of NaN.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub type Vec3 = Vector3<f64>;

/// Lengths at or below this are treated as zero.
pub const EPSILON: f64 = 1e-9;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Axis> {
        Axis::ALL.get(index).copied()
    }

    fn next(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Local axis that should point along a tracked direction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TrackAxis {
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl TrackAxis {
    fn split(self) -> (Axis, f64) {
        match self {
            TrackAxis::X => (Axis::X, 1.0),
            TrackAxis::Y => (Axis::Y, 1.0),
            TrackAxis::Z => (Axis::Z, 1.0),
            TrackAxis::NegX => (Axis::X, -1.0),
            TrackAxis::NegY => (Axis::Y, -1.0),
            TrackAxis::NegZ => (Axis::Z, -1.0),
        }
    }
}

/// XYZ euler angles in radians (X applied first).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Euler {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_quaternion(self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(self.x, self.y, self.z)
    }

    fn distance(&self, other: &Euler) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }
}

pub fn vector_distance(a: &Vec3, b: &Vec3) -> f64 {
    (b - a).norm()
}

pub fn to_vector(from: &Vec3, to: &Vec3) -> Vec3 {
    to - from
}

pub fn center_point(a: &Vec3, b: &Vec3) -> Vec3 {
    (a + b) * 0.5
}

/// Unit vector along `v`, or the zero vector when `v` has no length.
pub fn normalize(v: &Vec3) -> Vec3 {
    let len = v.norm();
    if len <= EPSILON {
        Vec3::zeros()
    } else {
        v / len
    }
}

/// Unsigned angle between two vectors; 0 if either is zero.
pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Rotation whose `track` axis points from `from` to `to`, with the `up` axis
/// kept as close as possible to the world `up` axis.
///
/// Coincident points yield the identity rotation. When the direction is
/// parallel to the world up axis, or `track` and `up` name the same axis, the
/// next axis in X→Y→Z order is used as the up reference.
pub fn rotate_towards(from: &Vec3, to: &Vec3, track: TrackAxis, up: Axis) -> UnitQuaternion<f64> {
    let dir = normalize(&to_vector(from, to));
    if dir == Vec3::zeros() {
        return UnitQuaternion::identity();
    }

    let (track_axis, sign) = track.split();
    let up = if up == track_axis { up.next() } else { up };
    let track_dir = dir * sign;

    let mut reference = up.unit();
    let mut up_dir = reference - track_dir * reference.dot(&track_dir);
    if up_dir.norm() <= EPSILON {
        reference = up.next().unit();
        up_dir = reference - track_dir * reference.dot(&track_dir);
        if up_dir.norm() <= EPSILON {
            reference = up.next().next().unit();
            up_dir = reference - track_dir * reference.dot(&track_dir);
        }
    }
    let up_dir = up_dir.normalize();

    let mut columns = [Vec3::zeros(); 3];
    columns[track_axis.index()] = track_dir;
    columns[up.index()] = up_dir;
    let third = 3 - track_axis.index() - up.index();
    // keep the basis right-handed: e_k = e_i x e_j for cyclic (i, j, k)
    columns[third] = if up == track_axis.next() {
        track_dir.cross(&up_dir)
    } else {
        up_dir.cross(&track_dir)
    };

    let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&columns));
    UnitQuaternion::from_rotation_matrix(&rotation)
}

/// Decompose a rotation into XYZ euler angles.
///
/// With `previous`, both XYZ solutions are shifted by whole turns towards it
/// and the closer one wins, so consecutive frames do not flip.
pub fn to_euler(rotation: &UnitQuaternion<f64>, previous: Option<Euler>) -> Euler {
    let (x, y, z) = rotation.euler_angles();
    let principal = Euler::new(x, y, z);
    let Some(prev) = previous else {
        return principal;
    };

    let alternate = Euler::new(x + PI, PI - y, z + PI);
    let a = compatible_euler(principal, &prev);
    let b = compatible_euler(alternate, &prev);
    if b.distance(&prev) < a.distance(&prev) {
        b
    } else {
        a
    }
}

fn compatible_euler(euler: Euler, reference: &Euler) -> Euler {
    let wrap = |angle: f64, target: f64| {
        let turns = ((angle - target) / (2.0 * PI)).round();
        angle - turns * 2.0 * PI
    };
    Euler::new(
        wrap(euler.x, reference.x),
        wrap(euler.y, reference.y),
        wrap(euler.z, reference.z),
    )
}

/// Add `π * offset[i]` to each angle.
pub fn offset_euler(euler: Euler, offset: [f64; 3]) -> Euler {
    Euler::new(
        euler.x + PI * offset[0],
        euler.y + PI * offset[1],
        euler.z + PI * offset[2],
    )
}

/// Homogeneous matrix with the given basis vectors as columns.
pub fn generate_matrix(tangent: &Vec3, normal: &Vec3, binormal: &Vec3) -> Matrix4<f64> {
    Matrix3::from_columns(&[*tangent, *normal, *binormal]).to_homogeneous()
}

/// Split an affine matrix into (location, rotation, scale).
///
/// Negative determinants flip the X scale. A collapsed axis yields the
/// identity rotation.
pub fn decompose_matrix(matrix: &Matrix4<f64>) -> (Vec3, UnitQuaternion<f64>, Vec3) {
    let column = |i: usize| Vec3::new(matrix[(0, i)], matrix[(1, i)], matrix[(2, i)]);
    let location = column(3);
    let basis = [column(0), column(1), column(2)];

    let mut scale = Vec3::new(basis[0].norm(), basis[1].norm(), basis[2].norm());
    if scale.iter().any(|s| *s <= EPSILON) {
        return (location, UnitQuaternion::identity(), scale);
    }

    let mut normalized = Matrix3::from_columns(&[
        basis[0] / scale.x,
        basis[1] / scale.y,
        basis[2] / scale.z,
    ]);
    if normalized.determinant() < 0.0 {
        scale.x = -scale.x;
        normalized.set_column(0, &(-basis[0] / basis[0].norm()));
    }

    let rotation = Rotation3::from_matrix(&normalized);
    (location, UnitQuaternion::from_rotation_matrix(&rotation), scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_zero_is_zero() {
        let v = normalize(&Vec3::zeros());
        assert_eq!(v, Vec3::zeros());
        assert!(v.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn distance_and_center() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.0, -0.3, 0.4);
        assert_relative_eq!(vector_distance(&a, &b), 0.5, epsilon = 1e-12);
        assert_eq!(center_point(&a, &b), Vec3::new(0.0, -0.15, 0.2));
    }

    #[test]
    fn angle_between_handles_zero() {
        assert_eq!(angle_between(&Vec3::zeros(), &Vec3::x()), 0.0);
        assert_relative_eq!(angle_between(&Vec3::x(), &Vec3::y()), PI / 2.0);
    }

    #[test]
    fn rotate_towards_same_point_is_identity() {
        let a = Vec3::new(0.2, 0.4, -1.0);
        let q = rotate_towards(&a, &a, TrackAxis::Y, Axis::Z);
        assert_eq!(q, UnitQuaternion::identity());
        assert!(q.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn rotate_towards_points_track_axis() {
        let from = Vec3::zeros();
        let to = Vec3::new(1.0, 1.0, 0.0);
        for track in [TrackAxis::X, TrackAxis::Y, TrackAxis::NegX] {
            let q = rotate_towards(&from, &to, track, Axis::Z);
            let (axis, sign) = track.split();
            let mapped = q * (axis.unit() * sign);
            assert_relative_eq!(mapped, normalize(&to), epsilon = 1e-9);
        }
    }

    #[test]
    fn rotate_towards_parallel_to_up_is_finite() {
        let q = rotate_towards(&Vec3::zeros(), &Vec3::z(), TrackAxis::Y, Axis::Z);
        assert_relative_eq!(q * Vec3::y(), Vec3::z(), epsilon = 1e-9);
        assert!(q.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn to_euler_follows_previous_frame() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 3.1);
        let principal = to_euler(&q, None);
        assert_relative_eq!(principal.z, 3.1, epsilon = 1e-9);

        // previous frame sat just past -π on z; stay on that side
        let prev = Euler::new(0.1, 0.2, -3.15);
        let e = to_euler(&q, Some(prev));
        assert_relative_eq!(e.z, 3.1 - 2.0 * PI, epsilon = 1e-9);
        let back = e.to_quaternion();
        assert_relative_eq!(back.angle_to(&q), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn matrix_round_trip() {
        let rot = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.5);
        let basis = rot.to_rotation_matrix();
        let m = basis.matrix();
        let tangent = m.column(0) * 2.0;
        let normal = m.column(1) * 1.0;
        let binormal = m.column(2) * 0.5;
        let mut matrix = generate_matrix(&tangent, &normal, &binormal);
        matrix[(0, 3)] = 1.0;

        let (loc, q, scale) = decompose_matrix(&matrix);
        assert_eq!(loc, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(scale, Vec3::new(2.0, 1.0, 0.5), epsilon = 1e-9);
        assert_relative_eq!(q.angle_to(&rot), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn decompose_collapsed_axis() {
        let m = generate_matrix(&Vec3::x(), &Vec3::zeros(), &Vec3::z());
        let (_, q, scale) = decompose_matrix(&m);
        assert_eq!(q, UnitQuaternion::identity());
        assert_eq!(scale.y, 0.0);
    }
}
