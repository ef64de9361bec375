//! Fibonacci sphere sampling.
//!
//! Golden-angle spiral producing `2n + 1` near-uniformly spaced unit
//! directions: for `i` in `-n..=n`, `z = 2i / (2n + 1)` and the azimuth
//! advances by the golden angle each step.

use std::f32::consts::TAU;

use nalgebra::Vector3;

/// `2π / φ` with `φ = (1 + √5) / 2`.
#[inline]
pub fn golden_angle() -> f32 {
    let golden_ratio = (1.0 + 5.0f32.sqrt()) * 0.5;
    TAU / golden_ratio
}

/// Restartable description of a Fibonacci sphere with `2n + 1` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciSphere {
    n: usize,
}

impl FibonacciSphere {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Total number of points, `2n + 1`.
    pub fn len(&self) -> usize {
        2 * self.n + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// First point of the spiral, at the south end.
    pub fn first(&self) -> Vector3<f32> {
        self.point(-(self.n as i64))
    }

    /// Direction for spiral index `i` in `-n..=n`.
    pub fn point(&self, i: i64) -> Vector3<f32> {
        let count = self.len() as f32;
        let z = (2.0 * i as f32) / count;
        let phi = z.asin();
        let r = phi.cos();
        let theta = golden_angle() * i as f32;
        Vector3::new(r * theta.cos(), r * theta.sin(), z)
    }

    /// Fresh lazy pass over all points.
    pub fn iter(&self) -> FibonacciPoints {
        FibonacciPoints {
            sphere: *self,
            next: -(self.n as i64),
        }
    }

    /// Feed every point to `callback` until it returns `false`.
    ///
    /// Returns `true` if the whole sphere was visited.
    pub fn for_each_until<F>(&self, mut callback: F) -> bool
    where
        F: FnMut(Vector3<f32>) -> bool,
    {
        self.iter().all(|p| callback(p))
    }
}

impl IntoIterator for FibonacciSphere {
    type Item = Vector3<f32>;
    type IntoIter = FibonacciPoints;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`FibonacciSphere`].
#[derive(Debug, Clone)]
pub struct FibonacciPoints {
    sphere: FibonacciSphere,
    next: i64,
}

impl Iterator for FibonacciPoints {
    type Item = Vector3<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.sphere.n as i64 {
            return None;
        }
        let point = self.sphere.point(self.next);
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.sphere.n as i64 - self.next + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FibonacciPoints {}
