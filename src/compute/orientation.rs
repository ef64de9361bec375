//! Orientation, move and candidate types shared by the channel and strategies.

use std::f32::consts::PI;

use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Incremental rotation request: `x` turns about the Y axis, `y` about the X axis.
pub type Move = Vector2<f32>;

/// Forward axis of the unrotated mesh view.
#[inline]
pub fn default_forward() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, -1.0)
}

/// Rigid rotation of the evaluated mesh.
///
/// Always holds a finite unit quaternion. Degenerate inputs (zero length or
/// non-finite) collapse to the identity instead of propagating NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Orientation(UnitQuaternion<f32>);

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Orientation {
    pub fn identity() -> Self {
        Self(UnitQuaternion::identity())
    }

    /// Renormalize an arbitrary quaternion into an orientation.
    pub fn from_quaternion(q: Quaternion<f32>) -> Self {
        if !q.coords.iter().all(|c| c.is_finite()) {
            log::warn!("Non-finite quaternion, falling back to identity");
            return Self::identity();
        }
        match UnitQuaternion::try_new(q, f32::EPSILON) {
            Some(unit) => Self(unit),
            None => {
                log::warn!("Zero-length quaternion, falling back to identity");
                Self::identity()
            }
        }
    }

    /// Orientation looking at the origin from `position` on the sphere.
    ///
    /// Rotates the default forward axis onto `-position`.
    pub fn from_position(position: &Vector3<f32>) -> Self {
        let Some(pos) = position.try_normalize(f32::EPSILON) else {
            log::warn!("Degenerate position {position:?}, falling back to identity");
            return Self::identity();
        };
        let forward = -pos;
        let rotation = UnitQuaternion::rotation_between(&default_forward(), &forward)
            // Antiparallel: any half turn about an axis orthogonal to forward.
            .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI));
        Self::from_quaternion(rotation.into_inner())
    }

    pub fn quaternion(&self) -> &UnitQuaternion<f32> {
        &self.0
    }

    /// View direction after rotation.
    pub fn forward(&self) -> Vector3<f32> {
        self.0 * default_forward()
    }

    /// Point on the unit sphere this orientation looks from.
    pub fn position(&self) -> Vector3<f32> {
        -self.forward()
    }

    /// Apply an incremental move: `R_y(x) * R_x(y) * self`.
    pub fn apply_move(&self, delta: &Move) -> Self {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            log::warn!("Non-finite move {delta:?} ignored");
            return *self;
        }
        let step = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), delta.x)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), delta.y);
        Self::from_quaternion((step * self.0).into_inner())
    }

    /// Express a mesh-space vector in the build frame, where `position()`
    /// maps to `+Z` (away from the plate).
    #[inline]
    pub fn to_build_frame(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.0.inverse_transform_vector(v)
    }

    /// Rotation angle between two orientations, in radians.
    pub fn angle_to(&self, other: &Orientation) -> f32 {
        self.0.angle_to(&other.0)
    }
}

impl From<UnitQuaternion<f32>> for Orientation {
    fn from(q: UnitQuaternion<f32>) -> Self {
        Self::from_quaternion(q.into_inner())
    }
}

/// A scored orientation. Lower volume is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub volume: f32,
    pub orientation: Orientation,
}

/// The evaluator's answer to one request.
pub type EvaluationResult = Candidate;

impl Candidate {
    pub fn new(volume: f32, orientation: Orientation) -> Self {
        Self {
            volume,
            orientation,
        }
    }

    /// Strictly lower volume.
    #[inline]
    pub fn improves_on(&self, other: &Candidate) -> bool {
        self.volume < other.volume
    }

    /// The better of two candidates; ties keep `self`.
    #[inline]
    pub fn min_volume(self, other: Candidate) -> Candidate {
        if other.improves_on(&self) { other } else { self }
    }
}

/// Fold a candidate into an optional running best.
#[inline]
pub fn keep_best(best: Option<Candidate>, candidate: Candidate) -> Option<Candidate> {
    Some(match best {
        Some(best) => best.min_volume(candidate),
        None => candidate,
    })
}
