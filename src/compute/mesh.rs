//! Reference support-volume evaluator over an indexed triangle mesh.
//!
//! The mesh is rotated into the build frame and rests on the plate at its
//! lowest point. Every downward-facing triangle needs support down to the
//! plate: projected area times the height of its centroid above the plate.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::schema::{ConfigError, MeshSpec};

use super::evaluator::VolumeEvaluator;
use super::orientation::Orientation;

/// Triangles whose normal z is above this count as vertical or upward.
const OVERHANG_EPSILON: f32 = 1e-6;

/// Indexed triangle mesh with counter-clockwise (outward) winding.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Vector3<f32>>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Build from a validated mesh description.
    pub fn from_spec(spec: &MeshSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(match spec {
            MeshSpec::Cuboid { size } => Self::cuboid(Vector3::new(size[0], size[1], size[2])),
            MeshSpec::Inline {
                vertices,
                triangles,
            } => Self {
                vertices: vertices
                    .iter()
                    .map(|v| Vector3::new(v[0], v[1], v[2]))
                    .collect(),
                triangles: triangles.clone(),
            },
        })
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(size: Vector3<f32>) -> Self {
        let h = size * 0.5;
        let vertices = (0..8)
            .map(|i| {
                Vector3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        // Two triangles per face, in -z, +z, -y, +y, -x, +x order.
        let triangles = vec![
            [0, 2, 1],
            [1, 2, 3],
            [4, 5, 6],
            [5, 7, 6],
            [0, 1, 4],
            [1, 5, 4],
            [2, 6, 3],
            [3, 6, 7],
            [0, 4, 2],
            [2, 4, 6],
            [1, 3, 5],
            [3, 7, 5],
        ];
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Support volume with the mesh held at `orientation`.
    pub fn support_volume(&self, orientation: &Orientation) -> f32 {
        let rotated: Vec<Vector3<f32>> = self
            .vertices
            .par_iter()
            .map(|v| orientation.to_build_frame(v))
            .collect();

        let plate = rotated
            .par_iter()
            .map(|v| v.z)
            .reduce(|| f32::INFINITY, f32::min);
        if !plate.is_finite() {
            return 0.0;
        }

        self.triangles
            .par_iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (
                    rotated[a as usize],
                    rotated[b as usize],
                    rotated[c as usize],
                );
                let cross = (b - a).cross(&(c - a));
                if cross.z >= -OVERHANG_EPSILON {
                    return 0.0;
                }
                let projected_area = -cross.z * 0.5;
                let height = (a.z + b.z + c.z) / 3.0 - plate;
                projected_area * height
            })
            .sum()
    }
}

/// [`VolumeEvaluator`] scoring orientations by [`TriangleMesh::support_volume`].
#[derive(Debug, Clone)]
pub struct SupportVolumeEvaluator {
    mesh: TriangleMesh,
}

impl SupportVolumeEvaluator {
    pub fn new(mesh: TriangleMesh) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }
}

impl VolumeEvaluator for SupportVolumeEvaluator {
    fn evaluate(&mut self, orientation: &Orientation) -> f32 {
        self.mesh.support_volume(orientation)
    }
}
