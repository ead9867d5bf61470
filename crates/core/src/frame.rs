//! Per-canvas frame clock.
//!
//! Each canvas entity owns an [`AnimationLoop`]; `drive_animation_loops` ticks every running loop
//! once per display frame and effect systems read the resulting [`FrameTick`]. Stopping a loop (or
//! despawning its canvas) ends all further ticks for that canvas.

use bevy::prelude::*;

/// Effects are tuned in "frames" at this nominal refresh rate.
pub const NOMINAL_FPS: f32 = 60.0;
/// Largest delta (seconds) accepted in one tick; longer stalls are treated as this long.
pub const MAX_FRAME_DELTA: f32 = 0.1;
/// Upper bound on discrete simulation steps produced by one tick.
pub const MAX_STEPS_PER_TICK: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTick {
    /// Seconds since the previous tick of the same loop.
    pub delta: f32,
    /// Seconds since the loop was (re)started.
    pub elapsed: f32,
    pub frame: u64,
}

impl FrameTick {
    /// Tick at exactly one nominal frame; used by headless stepping and tests.
    pub fn nominal(frame: u64) -> Self {
        Self {
            delta: 1.0 / NOMINAL_FPS,
            elapsed: frame as f32 / NOMINAL_FPS,
            frame,
        }
    }

    /// Delta expressed in nominal frames.
    pub fn frames(&self) -> f32 {
        self.delta * NOMINAL_FPS
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed * 1000.0
    }
}

/// Cancellation handle returned by [`AnimationLoop::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle(u32);

#[derive(Component, Debug, Clone, Default)]
pub struct AnimationLoop {
    generation: u32,
    running: bool,
    elapsed: f32,
    frame: u64,
    last: Option<FrameTick>,
}

impl AnimationLoop {
    /// A loop that is already started.
    pub fn running() -> Self {
        let mut l = Self::default();
        l.start();
        l
    }

    /// Begin producing ticks. Starting a running loop returns its current handle.
    pub fn start(&mut self) -> LoopHandle {
        if !self.running {
            self.generation = self.generation.wrapping_add(1);
            self.running = true;
            self.elapsed = 0.0;
            self.frame = 0;
            self.last = None;
        }
        LoopHandle(self.generation)
    }

    /// Cancel future ticks. Returns false for a stale handle (loop restarted since) or if already
    /// stopped.
    pub fn stop(&mut self, handle: LoopHandle) -> bool {
        if !self.running || handle.0 != self.generation {
            return false;
        }
        self.running = false;
        self.last = None;
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by `delta` seconds; `None` while stopped.
    pub fn tick(&mut self, delta: f32) -> Option<FrameTick> {
        if !self.running {
            return None;
        }
        let delta = if delta.is_finite() {
            delta.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        self.elapsed += delta;
        self.frame += 1;
        let tick = FrameTick {
            delta,
            elapsed: self.elapsed,
            frame: self.frame,
        };
        self.last = Some(tick);
        Some(tick)
    }

    /// Tick produced this frame, if the loop is running.
    pub fn last_tick(&self) -> Option<FrameTick> {
        self.last
    }
}

/// Fractional step accumulator: converts variable frame deltas into whole nominal-frame steps.
///
/// Credit is rounded to the nearest step, so a display running near the nominal rate gets exactly
/// one step per frame despite jitter. The remainder (within half a step either way) carries over,
/// so slow frames still catch up and fast displays skip every other frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameCredit {
    pub credit: f32,
}

impl FrameCredit {
    /// Add `frames` of credit and withdraw the steps it rounds to (bounded by
    /// [`MAX_STEPS_PER_TICK`]; any excess is dropped rather than replayed later).
    pub fn accumulate(&mut self, frames: f32) -> u32 {
        if frames.is_finite() && frames > 0.0 {
            self.credit += frames;
        }
        let whole = self.credit.round().max(0.0);
        self.credit -= whole;
        (whole as u32).min(MAX_STEPS_PER_TICK)
    }
}

pub fn drive_animation_loops(time: Res<Time>, mut loops: Query<&mut AnimationLoop>) {
    let delta = time.delta_secs();
    for mut l in &mut loops {
        l.tick(delta);
    }
}
