//! Logical to device pixel mapping for canvas backing buffers.

use bevy::math::{UVec2, Vec2};

/// Largest backing-buffer edge we allocate (device px).
pub const MAX_SURFACE_DIM: u32 = 8192;

/// Logical -> device mapping for a canvas. Computed from the container size and pixel density,
/// then applied to a surface in a separate step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    pub logical_size: Vec2,
    pub pixel_ratio: f32,
    /// Backing buffer size in device px.
    pub physical: UVec2,
}

impl SurfaceTransform {
    pub fn compute(container: Vec2, pixel_ratio: f32) -> Self {
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let logical = container.max(Vec2::ZERO);
        let device = (logical * ratio).floor();
        let physical = UVec2::new(
            (device.x as u32).min(MAX_SURFACE_DIM),
            (device.y as u32).min(MAX_SURFACE_DIM),
        );
        Self {
            logical_size: logical,
            pixel_ratio: ratio,
            physical,
        }
    }

    pub fn to_device(&self, p: Vec2) -> Vec2 {
        p * self.pixel_ratio
    }

    pub fn is_empty(&self) -> bool {
        self.physical.x == 0 || self.physical.y == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_pixel_ratio() {
        let t = SurfaceTransform::compute(Vec2::new(300.5, 200.0), 2.0);
        assert_eq!(t.physical, UVec2::new(601, 400));
        assert_eq!(t.to_device(Vec2::new(1.0, 2.0)), Vec2::new(2.0, 4.0));
    }

    #[test]
    fn invalid_ratio_falls_back_to_one() {
        let t = SurfaceTransform::compute(Vec2::new(10.0, 10.0), 0.0);
        assert_eq!(t.pixel_ratio, 1.0);
        let t = SurfaceTransform::compute(Vec2::new(10.0, 10.0), f32::NAN);
        assert_eq!(t.pixel_ratio, 1.0);
    }

    #[test]
    fn empty_and_oversized() {
        assert!(SurfaceTransform::compute(Vec2::new(0.0, 50.0), 1.0).is_empty());
        assert!(SurfaceTransform::compute(Vec2::new(-5.0, 50.0), 1.0).is_empty());
        let big = SurfaceTransform::compute(Vec2::new(100_000.0, 10.0), 1.0);
        assert_eq!(big.physical.x, MAX_SURFACE_DIM);
    }
}
