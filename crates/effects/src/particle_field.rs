//! Drifting background particles.
//!
//! One probabilistic spawn attempt per frame (rejected at the cap). Each particle drifts at a
//! constant velocity, fades in, holds, fades out and is dropped once its age passes its lifetime.
//! Randomness comes from a private `StdRng`, so a seed fully determines the sequence.

use bevy::prelude::*;
use noora_config::{ParticleFieldConfig, SpawnRange};
use noora_core::FrameTick;
use noora_rendering::{DrawList, Palette, Shape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{CanvasEffect, FrameInput};

/// Lifecycle stage of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticlePhase {
    Spawned,
    FadingIn,
    Stable,
    FadingOut,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub opacity: f32,
    /// Frames lived.
    pub age: f32,
    pub max_age: f32,
}

impl Particle {
    pub fn life_fraction(&self) -> f32 {
        if self.max_age <= 0.0 {
            1.0
        } else {
            self.age / self.max_age
        }
    }

    pub fn phase(&self, cfg: &ParticleFieldConfig) -> ParticlePhase {
        if self.age > self.max_age {
            return ParticlePhase::Removed;
        }
        if self.age <= 0.0 {
            return ParticlePhase::Spawned;
        }
        let t = self.life_fraction();
        if t < cfg.fade_in {
            ParticlePhase::FadingIn
        } else if t > 1.0 - cfg.fade_out {
            ParticlePhase::FadingOut
        } else {
            ParticlePhase::Stable
        }
    }
}

/// Opacity multiplier in `[0,1]` for a particle at `t` of its life.
pub fn opacity_envelope(t: f32, fade_in: f32, fade_out: f32) -> f32 {
    let v = if fade_in > 0.0 && t < fade_in {
        t / fade_in
    } else if fade_out > 0.0 && t > 1.0 - fade_out {
        (1.0 - t) / fade_out
    } else {
        1.0
    };
    v.clamp(0.0, 1.0)
}

/// Uniform sample from a config range.
pub(crate) fn sample(rng: &mut StdRng, range: &SpawnRange<f32>) -> f32 {
    range.min + (range.max - range.min) * rng.gen::<f32>()
}

#[derive(Component, Debug, Clone)]
pub struct ParticleField {
    cfg: ParticleFieldConfig,
    bounds: Vec2,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleField {
    pub const SEED_DOMAIN: u64 = 0x9A7F_1E1D;

    pub fn new(cfg: ParticleFieldConfig, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(cfg.max_particles),
            cfg,
            bounds: Vec2::ZERO,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &ParticleFieldConfig {
        &self.cfg
    }

    pub fn active_entities(&self) -> &[Particle] {
        &self.particles
    }

    /// Try to add one particle; false when the cap is reached.
    pub fn spawn(&mut self) -> bool {
        if self.particles.len() >= self.cfg.max_particles {
            return false;
        }
        let rng = &mut self.rng;
        let max_age = sample(rng, &self.cfg.life_frames).max(1.0);
        let position = Vec2::new(rng.gen::<f32>() * self.bounds.x, rng.gen::<f32>() * self.bounds.y);
        let drift = self.cfg.drift_speed;
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * drift,
            (rng.gen::<f32>() - 0.5) * drift - self.cfg.upward_bias,
        );
        let size = self.cfg.size_range.clamp(sample(rng, &self.cfg.size_range));
        self.particles.push(Particle {
            position,
            velocity,
            size,
            opacity: 0.0,
            age: 0.0,
            max_age,
        });
        true
    }
}

impl CanvasEffect for ParticleField {
    fn resize(&mut self, size: Vec2) {
        // Live particles keep their absolute coordinates.
        self.bounds = size;
    }

    fn update(&mut self, _tick: &FrameTick, _input: &FrameInput) {
        if self.cfg.enabled && self.rng.gen::<f32>() < self.cfg.spawn_chance {
            self.spawn();
        }
        let (fade_in, fade_out, peak) = (self.cfg.fade_in, self.cfg.fade_out, self.cfg.peak_opacity);
        for p in &mut self.particles {
            p.age += 1.0;
            p.position += p.velocity;
            let envelope = opacity_envelope(p.life_fraction(), fade_in, fade_out);
            p.opacity = (envelope * peak).clamp(0.0, peak.max(0.0));
        }
        self.particles.retain(|p| p.age <= p.max_age);
    }

    fn draw(&self, list: &mut DrawList) {
        for p in &self.particles {
            list.push(
                p.opacity,
                Shape::FillCircle {
                    center: p.position,
                    radius: p.size,
                    color: Palette::EMERALD,
                },
            );
            list.push(
                p.opacity * 0.15,
                Shape::FillCircle {
                    center: p.position,
                    radius: p.size * self.cfg.halo_scale,
                    color: Palette::EMERALD,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seed: u64) -> ParticleField {
        let mut f = ParticleField::new(ParticleFieldConfig::default(), seed);
        f.resize(Vec2::new(1280.0, 720.0));
        f
    }

    fn run(f: &mut ParticleField, frames: u64) {
        let input = FrameInput::default();
        for i in 1..=frames {
            f.update(&FrameTick::nominal(i), &input);
        }
    }

    #[test]
    fn spawn_is_rejected_at_cap() {
        let mut f = field(1);
        let cap = f.config().max_particles;
        for _ in 0..cap {
            assert!(f.spawn());
        }
        assert!(!f.spawn());
        assert_eq!(f.active_entities().len(), cap);
    }

    #[test]
    fn population_never_exceeds_cap() {
        let cfg = ParticleFieldConfig {
            max_particles: 7,
            spawn_chance: 1.0,
            ..Default::default()
        };
        let mut f = ParticleField::new(cfg, 3);
        f.resize(Vec2::new(100.0, 100.0));
        let input = FrameInput::default();
        for i in 1..=3000 {
            f.update(&FrameTick::nominal(i), &input);
            // Random extra attempts on top of the per-frame one.
            for _ in 0..(i % 4) {
                f.spawn();
            }
            assert!(f.active_entities().len() <= 7);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let sizes = |seed| {
            let mut f = field(seed);
            run(&mut f, 600);
            f.active_entities()
                .iter()
                .map(|p| (p.size.to_bits(), p.max_age.to_bits()))
                .collect::<Vec<_>>()
        };
        let a = sizes(42);
        assert!(!a.is_empty());
        assert_eq!(a, sizes(42));
        assert_ne!(a, sizes(43));
    }

    #[test]
    fn envelope_shape() {
        assert_eq!(opacity_envelope(0.0, 0.1, 0.2), 0.0);
        assert!((opacity_envelope(0.05, 0.1, 0.2) - 0.5).abs() < 1e-6);
        assert_eq!(opacity_envelope(0.5, 0.1, 0.2), 1.0);
        assert!((opacity_envelope(0.9, 0.1, 0.2) - 0.5).abs() < 1e-5);
        assert_eq!(opacity_envelope(1.2, 0.1, 0.2), 0.0);
    }

    #[test]
    fn particles_follow_lifecycle_and_expire() {
        let cfg = ParticleFieldConfig {
            spawn_chance: 0.0,
            life_frames: SpawnRange::new(100.0, 100.0),
            ..Default::default()
        };
        let mut f = ParticleField::new(cfg.clone(), 9);
        f.resize(Vec2::new(50.0, 50.0));
        assert!(f.spawn());
        assert_eq!(f.active_entities()[0].phase(&cfg), ParticlePhase::Spawned);
        run(&mut f, 5);
        assert_eq!(f.active_entities()[0].phase(&cfg), ParticlePhase::FadingIn);
        run(&mut f, 45);
        let p = &f.active_entities()[0];
        assert_eq!(p.phase(&cfg), ParticlePhase::Stable);
        assert!((p.opacity - cfg.peak_opacity).abs() < 1e-6);
        run(&mut f, 40);
        assert_eq!(f.active_entities()[0].phase(&cfg), ParticlePhase::FadingOut);
        run(&mut f, 11);
        assert!(f.active_entities().is_empty());
    }

    #[test]
    fn sizes_stay_in_range_and_drift_upward_on_average() {
        let mut f = field(5);
        for _ in 0..60 {
            f.spawn();
        }
        let r = &f.config().size_range;
        assert!(f.active_entities().iter().all(|p| p.size >= r.min && p.size <= r.max));
        let mean_vy: f32 = f.active_entities().iter().map(|p| p.velocity.y).sum::<f32>() / 60.0;
        assert!(mean_vy < 0.0, "upward bias should dominate: {mean_vy}");
    }

    #[test]
    fn draw_emits_dot_and_halo() {
        let mut f = field(2);
        f.spawn();
        run(&mut f, 1);
        let mut list = DrawList::new();
        f.draw(&mut list);
        assert_eq!(list.len(), f.active_entities().len() * 2);
    }
}
