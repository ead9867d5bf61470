//! Privacy cube: a data sphere slides into a wireframe cube that turns to close around it.
//! Everything is a pure function of scroll progress.

use std::f32::consts::PI;

use bevy::prelude::*;
use noora_config::PrivacyCubeConfig;
use noora_core::FrameTick;
use noora_rendering::{with_alpha, DrawList, Orientation, Palette, Shape, Wireframe};

use crate::{CanvasEffect, FrameInput};

pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[derive(Component, Debug, Clone)]
pub struct PrivacyCube {
    cfg: PrivacyCubeConfig,
    bounds: Vec2,
    progress: f32,
    cube: Wireframe,
}

impl PrivacyCube {
    pub fn new(cfg: PrivacyCubeConfig) -> Self {
        Self {
            cfg,
            bounds: Vec2::ZERO,
            progress: 0.0,
            cube: Wireframe::cube(),
        }
    }

    pub fn cube_size(&self) -> f32 {
        self.bounds.min_element() * self.cfg.size_frac
    }

    pub fn orientation(&self) -> Orientation {
        let p = self.progress;
        Orientation::new(0.3 + 0.2 * p, 0.6 * PI * p, 0.0)
    }

    pub fn sphere_center(&self) -> Vec2 {
        let c = self.bounds * 0.5;
        let start = c.x - self.cube_size() * 2.5;
        let t = (ease_in_out_quad(self.progress) * 1.2).min(1.0);
        Vec2::new(start + (c.x - start) * t, c.y)
    }

    pub fn sphere_alpha(&self) -> f32 {
        if self.progress > 0.8 {
            // 1 - (p - 0.8) * 5, written so p = 1 lands on exactly zero
            ((1.0 - self.progress) * 5.0).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl CanvasEffect for PrivacyCube {
    fn resize(&mut self, size: Vec2) {
        self.bounds = size;
    }

    fn update(&mut self, _tick: &FrameTick, input: &FrameInput) {
        self.progress = input.progress.clamp(0.0, 1.0);
    }

    fn draw(&self, list: &mut DrawList) {
        if !self.cfg.enabled {
            return;
        }
        let p = self.progress;
        let center = self.bounds * 0.5;
        let size = self.cube_size();
        let points = self
            .cube
            .project(size, self.orientation(), self.cfg.focal_length, center);

        if p > 0.5 {
            list.push_opaque(Shape::FillPolygon {
                points: points[..4].to_vec(),
                color: with_alpha(Palette::EMERALD, (p - 0.5) * 0.15),
            });
        }
        list.push_opaque(Shape::Segments {
            points,
            edges: self.cube.edges.clone(),
            width: 1.0,
            color: with_alpha(Palette::EMERALD, 0.15 + p * 0.2),
        });

        let sphere = self.sphere_center();
        let radius = size * 0.25;
        let a = self.sphere_alpha();
        if a <= 0.0 {
            return;
        }
        list.push_opaque(Shape::Glow {
            center: sphere,
            radius,
            inner: with_alpha(Palette::TEAL, 0.6 * a),
            outer: with_alpha(Palette::DEEP_TEAL, 0.05 * a),
        });
        list.push_opaque(Shape::Glow {
            center: sphere,
            radius: radius * 2.5,
            inner: with_alpha(Palette::TEAL, 0.1 * a),
            outer: Palette::TRANSPARENT,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_at(progress: f32) -> PrivacyCube {
        let mut c = PrivacyCube::new(PrivacyCubeConfig::default());
        c.resize(Vec2::new(600.0, 400.0));
        c.update(
            &FrameTick::nominal(1),
            &FrameInput {
                progress,
                ..Default::default()
            },
        );
        c
    }

    #[test]
    fn easing_endpoints_and_symmetry() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert!((ease_in_out_quad(0.25) + ease_in_out_quad(0.75) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sphere_travels_into_cube() {
        let start = cube_at(0.0);
        let size = start.cube_size();
        assert_eq!(size, 400.0 * 0.18);
        assert!((start.sphere_center().x - (300.0 - size * 2.5)).abs() < 1e-4);
        // 1.2x easing reaches the centre before the end of the scroll
        assert_eq!(cube_at(0.9).sphere_center(), Vec2::new(300.0, 200.0));
    }

    #[test]
    fn sphere_fades_after_eighty_percent() {
        assert_eq!(cube_at(0.5).sphere_alpha(), 1.0);
        assert!((cube_at(0.9).sphere_alpha() - 0.5).abs() < 1e-5);
        assert_eq!(cube_at(1.0).sphere_alpha(), 0.0);
        let mut list = DrawList::new();
        cube_at(1.0).draw(&mut list);
        assert!(!list.iter().any(|d| matches!(d.shape, Shape::Glow { .. })));
    }

    #[test]
    fn face_fill_only_in_second_half() {
        let has_fill = |p| {
            let mut list = DrawList::new();
            cube_at(p).draw(&mut list);
            let found = list.iter().any(|d| matches!(d.shape, Shape::FillPolygon { .. }));
            found
        };
        assert!(!has_fill(0.5));
        assert!(has_fill(0.6));
    }

    #[test]
    fn rotation_follows_progress() {
        let o = cube_at(1.0).orientation();
        assert!((o.y - 0.6 * PI).abs() < 1e-6);
        assert!((o.x - 0.5).abs() < 1e-6);
        assert_eq!(cube_at(0.0).orientation(), Orientation::new(0.3, 0.0, 0.0));
    }
}
