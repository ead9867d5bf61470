// Core crate: host surface contract, frame clock, scroll & pointer samplers, ordering sets.
// Everything per-canvas lives on the canvas entity; shared input scalars are resources written by
// event readers and read by the next frame's `FrameSet::Sample`.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorMoved, WindowResized};

pub mod frame;
pub mod pointer;
pub mod scroll;

pub use frame::{
    drive_animation_loops, AnimationLoop, FrameCredit, FrameTick, LoopHandle, NOMINAL_FPS,
};
pub use pointer::{normalize_pointer, PointerState};
pub use scroll::{progress_between, RegionView, ScrollAnchor, ScrollSampler, TrackedRegion};

/// Deterministic RNG seed resource (set once at startup / tests for reproducible spawning).
#[derive(Resource, Debug, Copy, Clone, Default)]
pub struct RngSeed(pub u64);

impl RngSeed {
    /// Domain-separated seed so each effect gets its own stream.
    pub fn derive(&self, domain: u64) -> u64 {
        self.0.wrapping_add(domain)
    }
}

// Wrapper Bevy resource for the pure-data CanvasConfig (keeps noora_config free of bevy dependency).
#[derive(Resource, Debug, Clone, Default)]
pub struct CanvasConfigRes(pub noora_config::CanvasConfig);

/// Host environment: viewport size (logical px), document scroll and pixel density.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct HostViewport {
    pub size: Vec2,
    pub scroll_y: f32,
    /// Total document height; scrolling is clamped to `scroll_extent - size.y`.
    pub scroll_extent: f32,
    pub pixel_ratio: f32,
}

impl Default for HostViewport {
    fn default() -> Self {
        Self {
            size: Vec2::new(1280.0, 720.0),
            scroll_y: 0.0,
            scroll_extent: 720.0,
            pixel_ratio: 1.0,
        }
    }
}

impl HostViewport {
    pub fn max_scroll(&self) -> f32 {
        (self.scroll_extent - self.size.y).max(0.0)
    }

    pub fn scroll_to(&mut self, y: f32) {
        self.scroll_y = y.clamp(0.0, self.max_scroll());
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_to(self.scroll_y + dy);
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size.max(Vec2::ZERO);
        // Keep the current position valid for the new viewport height.
        self.scroll_to(self.scroll_y);
    }
}

/// How a canvas derives its logical size from the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasFit {
    /// Full viewport (fixed background layers).
    Viewport,
    /// Viewport width, fixed height (in-flow sections).
    ViewportWidth { height: f32 },
    Fixed,
}

/// Host drawing surface contract for one canvas.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub logical_size: Vec2,
    pub pixel_ratio: f32,
    /// False until the host surface is mounted (or after it is lost).
    pub available: bool,
    pub fit: CanvasFit,
}

impl Canvas {
    pub fn new(logical_size: Vec2, fit: CanvasFit) -> Self {
        Self {
            logical_size,
            pixel_ratio: 1.0,
            available: true,
            fit,
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.available
            && self.logical_size.x >= 1.0
            && self.logical_size.y >= 1.0
            && self.pixel_ratio > 0.0
    }

    /// Size this canvas should have for `viewport`.
    pub fn fitted_size(&self, viewport: &HostViewport) -> Vec2 {
        match self.fit {
            CanvasFit::Viewport => viewport.size,
            CanvasFit::ViewportWidth { height } => Vec2::new(viewport.size.x, height),
            CanvasFit::Fixed => self.logical_size,
        }
    }
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct ScrollSettings {
    /// Scroll distance per wheel line.
    pub wheel_step: f32,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self { wheel_step: 40.0 }
    }
}

// Per-frame ordering: sample inputs -> simulate -> draw into buffers -> present to the host.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum FrameSet {
    Sample,
    Simulate,
    Render,
    Present,
}

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        // Idempotent; lets the plugin run headless without WindowPlugin / InputPlugin.
        app.add_event::<CursorMoved>()
            .add_event::<WindowResized>()
            .add_event::<MouseWheel>()
            .init_resource::<HostViewport>()
            .init_resource::<PointerState>()
            .init_resource::<RngSeed>()
            .init_resource::<ScrollSettings>()
            .configure_sets(
                Update,
                (
                    FrameSet::Sample,
                    FrameSet::Simulate,
                    FrameSet::Render,
                    FrameSet::Present,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    (track_viewport_resize, track_wheel_scroll, pointer::track_pointer).chain(),
                    fit_canvases_to_viewport,
                    drive_animation_loops,
                    scroll::sample_scroll_progress,
                )
                    .chain()
                    .in_set(FrameSet::Sample),
            );
    }
}

fn track_viewport_resize(
    mut resized: EventReader<WindowResized>,
    mut viewport: ResMut<HostViewport>,
) {
    if let Some(last) = resized.read().last() {
        viewport.resize(Vec2::new(last.width, last.height));
        debug!(width = last.width, height = last.height, "Viewport resized");
    }
}

fn track_wheel_scroll(
    mut wheel: EventReader<MouseWheel>,
    settings: Res<ScrollSettings>,
    mut viewport: ResMut<HostViewport>,
) {
    let mut dy = 0.0;
    for ev in wheel.read() {
        dy -= match ev.unit {
            MouseScrollUnit::Line => ev.y * settings.wheel_step,
            MouseScrollUnit::Pixel => ev.y,
        };
    }
    if dy != 0.0 {
        viewport.scroll_by(dy);
    }
}

/// Resize canvases whose fit depends on the viewport; pixel ratio always follows the host.
pub fn fit_canvases_to_viewport(viewport: Res<HostViewport>, mut q: Query<&mut Canvas>) {
    for mut canvas in &mut q {
        let size = canvas.fitted_size(&viewport);
        // Compare before writing so change detection only fires on real resizes.
        if canvas.logical_size != size || canvas.pixel_ratio != viewport.pixel_ratio {
            canvas.logical_size = size;
            canvas.pixel_ratio = viewport.pixel_ratio;
        }
    }
}
