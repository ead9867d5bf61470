//! Faint wireframe shapes tumbling in the deep background, swaying with the pointer.

use std::f32::consts::TAU;

use bevy::prelude::*;
use noora_config::VoidObjectsConfig;
use noora_core::FrameTick;
use noora_rendering::{with_alpha, DrawList, Orientation, Palette, Shape, Wireframe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::particle_field::sample;
use crate::{CanvasEffect, FrameInput};

const STROKE_WIDTH: f32 = 0.5;
const RING_SEGMENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidKind {
    Cube,
    Diamond,
    Ring,
    Triangle,
}

impl VoidKind {
    pub const ALL: [VoidKind; 4] = [VoidKind::Cube, VoidKind::Diamond, VoidKind::Ring, VoidKind::Triangle];

    /// Vertex scale relative to the shape's on-screen size.
    fn extent(self) -> f32 {
        match self {
            VoidKind::Diamond => 0.4,
            _ => 0.5,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoidShape {
    pub anchor: Vec2,
    /// Parallax depth in `[0.3, 1]`; scales size and pointer sway.
    pub depth: f32,
    pub size: f32,
    pub orientation: Orientation,
    pub spin: Orientation,
    pub kind: VoidKind,
    pub opacity: f32,
}

/// Uniform in `[-max, max]`.
fn symmetric(rng: &mut StdRng, max: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * 2.0 * max
}

#[derive(Component, Debug, Clone)]
pub struct VoidObjects {
    cfg: VoidObjectsConfig,
    bounds: Vec2,
    shapes: Vec<VoidShape>,
    wireframes: [Wireframe; 4],
    pointer: Vec2,
    rng: StdRng,
}

impl VoidObjects {
    pub const SEED_DOMAIN: u64 = 0x701D_0B1E;

    pub fn new(cfg: VoidObjectsConfig, seed: u64) -> Self {
        Self {
            cfg,
            bounds: Vec2::ZERO,
            shapes: Vec::new(),
            wireframes: [
                Wireframe::cube(),
                Wireframe::diamond(),
                Wireframe::ring(RING_SEGMENTS),
                Wireframe::triangle(),
            ],
            pointer: Vec2::splat(0.5),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn shapes(&self) -> &[VoidShape] {
        &self.shapes
    }

    fn populate(&mut self) {
        let cfg = &self.cfg;
        let rng = &mut self.rng;
        let mut shapes = Vec::with_capacity(cfg.count);
        for i in 0..cfg.count {
            let spin_o = Orientation::new(
                symmetric(rng, cfg.spin_xy),
                symmetric(rng, cfg.spin_xy),
                symmetric(rng, cfg.spin_z),
            );
            shapes.push(VoidShape {
                anchor: Vec2::new(rng.gen::<f32>() * self.bounds.x, rng.gen::<f32>() * self.bounds.y),
                depth: cfg.depth_range.clamp(sample(rng, &cfg.depth_range)),
                size: cfg.size_range.clamp(sample(rng, &cfg.size_range)),
                orientation: Orientation::new(
                    rng.gen::<f32>() * TAU,
                    rng.gen::<f32>() * TAU,
                    rng.gen::<f32>() * TAU,
                ),
                spin: spin_o,
                kind: VoidKind::ALL[i % VoidKind::ALL.len()],
                opacity: cfg.opacity_range.clamp(sample(rng, &cfg.opacity_range)),
            });
        }
        self.shapes = shapes;
    }

    /// Screen position of a shape's centre including pointer sway.
    pub fn swayed_anchor(&self, shape: &VoidShape) -> Vec2 {
        let sway = Vec2::new(self.cfg.sway_x, self.cfg.sway_y);
        shape.anchor + (self.pointer - Vec2::splat(0.5)) * sway * shape.depth
    }
}

impl CanvasEffect for VoidObjects {
    fn resize(&mut self, size: Vec2) {
        self.bounds = size;
        // Shapes are placed once, on the first real size; later resizes keep them.
        if self.shapes.is_empty() && self.cfg.enabled && size.x > 0.0 && size.y > 0.0 {
            self.populate();
        }
    }

    fn update(&mut self, _tick: &FrameTick, input: &FrameInput) {
        self.pointer = input.pointer;
        for s in &mut self.shapes {
            s.orientation.advance(s.spin, 1.0);
        }
    }

    fn draw(&self, list: &mut DrawList) {
        for s in &self.shapes {
            let frame = &self.wireframes[s.kind.index()];
            let scale = s.size * s.depth * s.kind.extent();
            let points = frame.project(scale, s.orientation, self.cfg.focal_length, self.swayed_anchor(s));
            let color = with_alpha(Palette::WHITE, s.opacity * 8.0);
            let shape = if frame.closed_outline {
                Shape::Path {
                    points,
                    closed: true,
                    width: STROKE_WIDTH,
                    color,
                }
            } else {
                Shape::Segments {
                    points,
                    edges: frame.edges.clone(),
                    width: STROKE_WIDTH,
                    color,
                }
            };
            list.push(s.opacity, shape);
        }
    }
}
