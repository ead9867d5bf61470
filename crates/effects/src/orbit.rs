//! Collaborative orbit: avatars circling a centre, pulled inward as the section scrolls in.

use std::f32::consts::TAU;

use bevy::prelude::*;
use noora_config::OrbitConfig;
use noora_core::FrameTick;
use noora_rendering::{with_alpha, DrawList, Palette, Shape};

use crate::{CanvasEffect, FrameInput};

const AVATAR_COLORS: [Srgba; 6] = [
    Palette::EMERALD,
    Palette::TEAL,
    Palette::MINT,
    Palette::PINE,
    Palette::GREEN,
    Palette::EMERALD,
];
const ELLIPSE_SEGMENTS: usize = 64;

/// Orbit radius for `progress`: `max` at 0, `min` at 1, linear between.
pub fn radius_at(progress: f32, min_dimension: f32, cfg: &OrbitConfig) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    let max = cfg.max_radius_frac * min_dimension;
    let min = cfg.min_radius_frac * min_dimension;
    max * (1.0 - p) + min * p
}

/// Closed polyline approximating a (possibly rotated) ellipse.
pub fn ellipse_points(center: Vec2, radii: Vec2, rotation: f32, segments: usize) -> Vec<Vec2> {
    let n = segments.max(8);
    let (s, c) = rotation.sin_cos();
    (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * TAU;
            let local = Vec2::new(a.cos() * radii.x, a.sin() * radii.y);
            center + Vec2::new(local.x * c - local.y * s, local.x * s + local.y * c)
        })
        .collect()
}

#[derive(Component, Debug, Clone)]
pub struct CollaborativeOrbit {
    cfg: OrbitConfig,
    bounds: Vec2,
    time: f32,
    progress: f32,
}

impl CollaborativeOrbit {
    pub fn new(cfg: OrbitConfig) -> Self {
        Self {
            cfg,
            bounds: Vec2::ZERO,
            time: 0.0,
            progress: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn radius(&self) -> f32 {
        radius_at(self.progress, self.bounds.min_element(), &self.cfg)
    }

    pub fn avatar_size(&self) -> f32 {
        14.0 + 4.0 * self.progress
    }

    pub fn avatar_positions(&self) -> Vec<Vec2> {
        let n = self.cfg.labels.len();
        let center = self.bounds * 0.5;
        let r = self.radius();
        let speed = 1.0 + 0.5 * self.progress;
        (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * TAU + self.time * speed;
                center + Vec2::new(a.cos() * r, a.sin() * r * self.cfg.ellipse_ratio)
            })
            .collect()
    }
}

impl CanvasEffect for CollaborativeOrbit {
    fn resize(&mut self, size: Vec2) {
        self.bounds = size;
    }

    fn update(&mut self, _tick: &FrameTick, input: &FrameInput) {
        self.time += self.cfg.time_step;
        self.progress = input.progress.clamp(0.0, 1.0);
    }

    fn draw(&self, list: &mut DrawList) {
        if !self.cfg.enabled {
            return;
        }
        let p = self.progress;
        let center = self.bounds * 0.5;
        let r = self.radius();
        let ratio = self.cfg.ellipse_ratio;

        list.push_opaque(Shape::Path {
            points: ellipse_points(center, Vec2::new(r, r * ratio), 0.0, ELLIPSE_SEGMENTS),
            closed: true,
            width: 0.5,
            color: with_alpha(Palette::WHITE, 0.03 + p * 0.03),
        });
        list.push_opaque(Shape::Path {
            points: ellipse_points(center, Vec2::new(r * 0.6, r * 0.3), 0.3, ELLIPSE_SEGMENTS),
            closed: true,
            width: 0.5,
            color: with_alpha(Palette::EMERALD, 0.02 + p * 0.04),
        });
        list.push_opaque(Shape::Glow {
            center,
            radius: r * 0.3,
            inner: with_alpha(Palette::EMERALD, 0.05 + p * 0.08),
            outer: Palette::TRANSPARENT,
        });

        let size = self.avatar_size();
        let positions = self.avatar_positions();
        for (i, pos) in positions.iter().enumerate() {
            let color = AVATAR_COLORS[i % AVATAR_COLORS.len()];
            list.push_opaque(Shape::Glow {
                center: *pos,
                radius: size * 2.0,
                inner: with_alpha(color, 0.08),
                outer: Palette::TRANSPARENT,
            });
            list.push_opaque(Shape::FillCircle {
                center: *pos,
                radius: size,
                color: with_alpha(color, 0.8),
            });
            list.push_opaque(Shape::StrokeCircle {
                center: *pos,
                radius: size + 2.0,
                width: 1.0,
                color: with_alpha(color, 0.25),
            });
        }

        if p > self.cfg.link_threshold && positions.len() > 1 {
            let color = with_alpha(Palette::EMERALD, (p - self.cfg.link_threshold) * 0.15);
            for (i, a) in positions.iter().enumerate() {
                let b = positions[(i + 1) % positions.len()];
                list.push_opaque(Shape::Line {
                    from: *a,
                    to: b,
                    width: 0.5,
                    color,
                });
            }
        }
    }
}
