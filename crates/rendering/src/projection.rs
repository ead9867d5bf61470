//! 3D -> 2D helpers for the wireframe effects.
//!
//! Rotation order is Y, then X, then Z (each about the object's own origin). Projection divides
//! by `focal + z`, so points with `z > 0` recede and shrink toward the anchor.

use bevy::math::{Vec2, Vec3};

/// Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orientation {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Advance by per-axis speeds scaled by `frames`.
    pub fn advance(&mut self, speed: Orientation, frames: f32) {
        self.x += speed.x * frames;
        self.y += speed.y * frames;
        self.z += speed.z * frames;
    }
}

pub fn rotate(v: Vec3, o: Orientation) -> Vec3 {
    let (sy, cy) = o.y.sin_cos();
    let x = v.x * cy - v.z * sy;
    let z = v.x * sy + v.z * cy;

    let (sx, cx) = o.x.sin_cos();
    let y = v.y * cx - z * sx;
    let z = v.y * sx + z * cx;

    let (sz, cz) = o.z.sin_cos();
    Vec3::new(x * cz - y * sz, x * sz + y * cz, z)
}

/// `xy * focal / (focal + z)`; points at or behind the eye collapse to the anchor.
pub fn perspective(v: Vec3, focal: f32) -> Vec2 {
    let denom = focal + v.z;
    if denom <= f32::EPSILON {
        return Vec2::ZERO;
    }
    v.truncate() * (focal / denom)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wireframe {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<(usize, usize)>,
    /// Draw `vertices` as one closed outline instead of edge pairs.
    pub closed_outline: bool,
}

impl Wireframe {
    pub fn cube() -> Self {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let edges = vec![
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        Self { vertices, edges, closed_outline: false }
    }

    /// Octahedron stretched along Y.
    pub fn diamond() -> Self {
        let vertices = vec![
            Vec3::new(0.0, -1.2, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.2, 0.0),
        ];
        let edges = vec![
            (0, 1), (0, 2), (0, 3), (0, 4),
            (5, 1), (5, 2), (5, 3), (5, 4),
            (1, 2), (2, 3), (3, 4), (4, 1),
        ];
        Self { vertices, edges, closed_outline: false }
    }

    pub fn ring(segments: usize) -> Self {
        let n = segments.max(3);
        let vertices = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Vec3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        Self { vertices, edges: Vec::new(), closed_outline: true }
    }

    pub fn triangle() -> Self {
        let vertices = vec![
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.87, 0.5, 0.0),
            Vec3::new(-0.87, 0.5, 0.0),
        ];
        Self { vertices, edges: Vec::new(), closed_outline: true }
    }

    /// Scale, rotate and project every vertex; result is in surface coordinates around `anchor`.
    pub fn project(&self, scale: f32, orientation: Orientation, focal: f32, anchor: Vec2) -> Vec<Vec2> {
        self.vertices
            .iter()
            .map(|v| anchor + perspective(rotate(*v * scale, orientation), focal))
            .collect()
    }
}
