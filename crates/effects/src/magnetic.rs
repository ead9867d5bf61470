//! Magnetic follower: an element drifts toward the pointer while it hovers nearby.
//!
//! The pull is computed in viewport space (px, y down) into [`TransformParams`]; a single
//! [`apply_transform_params`] step writes the eased offset onto the element's `Transform`.

use bevy::prelude::*;
use noora_config::MagneticConfig;
use noora_core::{FrameCredit, PointerState, NOMINAL_FPS};

/// Offset to apply to an element, viewport px (y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformParams {
    pub translate: Vec2,
}

/// Target offset for a pointer at `pointer` relative to an element centred at `center`.
pub fn magnetic_pull(pointer: Vec2, center: Vec2, cfg: &MagneticConfig) -> TransformParams {
    let delta = pointer - center;
    let dist = delta.length();
    if cfg.threshold <= 0.0 || dist >= cfg.threshold {
        return TransformParams::default();
    }
    let falloff = 1.0 - dist / cfg.threshold;
    TransformParams {
        translate: delta * falloff * cfg.strength,
    }
}

#[derive(Component, Debug, Clone)]
pub struct MagneticFollower {
    cfg: MagneticConfig,
    /// Element centre in viewport px.
    pub center: Vec2,
    /// World translation with no pull applied.
    pub rest: Vec3,
    target: TransformParams,
    current: TransformParams,
    credit: FrameCredit,
}

impl MagneticFollower {
    pub fn new(cfg: MagneticConfig, center: Vec2, rest: Vec3) -> Self {
        Self {
            cfg,
            center,
            rest,
            target: TransformParams::default(),
            current: TransformParams::default(),
            credit: FrameCredit::default(),
        }
    }

    pub fn target(&self) -> TransformParams {
        self.target
    }

    pub fn current(&self) -> TransformParams {
        self.current
    }

    pub fn aim(&mut self, pointer: Option<Vec2>) {
        self.target = match pointer {
            Some(p) if self.cfg.enabled => magnetic_pull(p, self.center, &self.cfg),
            _ => TransformParams::default(),
        };
    }

    /// One easing frame toward the target.
    pub fn ease(&mut self) {
        let t = self.cfg.ease.clamp(0.0, 1.0);
        self.current.translate += (self.target.translate - self.current.translate) * t;
    }
}

pub fn update_magnetic_followers(
    time: Res<Time>,
    pointer: Res<PointerState>,
    mut q: Query<&mut MagneticFollower>,
) {
    let frames = time.delta_secs() * NOMINAL_FPS;
    for mut f in &mut q {
        f.aim(pointer.position());
        let steps = f.credit.accumulate(frames);
        for _ in 0..steps {
            f.ease();
        }
    }
}

pub fn apply_transform_params(mut q: Query<(&MagneticFollower, &mut Transform)>) {
    for (f, mut t) in &mut q {
        let offset = f.current.translate;
        // Viewport y grows downward, world y upward.
        let next = f.rest + Vec3::new(offset.x, -offset.y, 0.0);
        if t.translation != next {
            t.translation = next;
        }
    }
}
