// Cross-crate scenarios: config -> page layout -> effects -> surfaces, plus the lead flow.
// Everything runs headless on MinimalPlugins with a fixed 60 Hz clock.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use noora_config::CanvasConfig;
use noora_core::{CanvasConfigRes, CorePlugin, HostViewport, RngSeed};

pub const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

/// Headless page app for `cfg`, stepping one nominal frame per update.
pub fn build_page_app(cfg: CanvasConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));
    app.insert_resource(HostViewport {
        size: VIEWPORT,
        scroll_extent: cfg.page.height,
        ..Default::default()
    });
    app.insert_resource(RngSeed(cfg.seed));
    app.insert_resource(CanvasConfigRes(cfg));
    app.add_plugins((
        CorePlugin,
        noora_rendering::RenderingPlugin,
        noora_effects::EffectsPlugin,
        noora_app::PagePlugin,
    ));
    app
}

/// Config with every effect switched off; tests enable what they look at.
pub fn bare_config() -> CanvasConfig {
    let mut cfg = CanvasConfig::default();
    cfg.particles.enabled = false;
    cfg.void_objects.enabled = false;
    cfg.assembly.enabled = false;
    cfg.orbit.enabled = false;
    cfg.privacy_cube.enabled = false;
    cfg
}

pub fn run_frames(app: &mut App, frames: u32) {
    for _ in 0..frames {
        app.update();
    }
}
