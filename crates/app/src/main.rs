/*!
Noora landing canvases as a standalone app.

* Layered RON config (`assets/config/noora.ron` + `noora.local.ron`) or a single `--config` file.
* Windowed by default; `--headless` steps the software surfaces at a fixed 60 Hz for `--frames`.
* `--lead` pushes one email through the lead intake at startup.
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use noora_app::{ConfigReport, ExitAfter, PagePlugin};
use noora_config::CanvasConfig;
use noora_core::{CanvasConfigRes, CorePlugin, HostViewport, RngSeed, ScrollSettings};
use noora_effects::EffectsPlugin;
use noora_lead::{LeadPlugin, SubmitLead};
use noora_rendering::RenderingPlugin;

const DEFAULT_HEADLESS_FRAMES: u32 = 600;

#[derive(Parser, Debug)]
#[command(name = "noora", version, about = "Procedural landing-page canvas effects")]
struct Cli {
    /// Single config file (skips the layered lookup)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,
    /// Run without a window
    #[arg(long)]
    headless: bool,
    /// Exit after this many frames
    #[arg(long)]
    frames: Option<u32>,
    /// Initial document scroll offset (px)
    #[arg(long)]
    scroll: Option<f32>,
    /// Submit this email through the lead form at startup
    #[arg(long)]
    lead: Option<String>,
}

fn load_config(cli: &Cli) -> Result<(CanvasConfig, ConfigReport)> {
    if let Some(path) = &cli.config {
        let cfg = CanvasConfig::load_from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config {}", path.display()))?;
        let report = ConfigReport::for_config(&cfg, vec![path.display().to_string()], Vec::new());
        return Ok((cfg, report));
    }
    let (cfg, used, errors) = CanvasConfig::load_layered([
        Path::new("assets/config/noora.ron"),
        Path::new("assets/config/noora.local.ron"),
    ]);
    let report = ConfigReport::for_config(&cfg, used, errors);
    Ok((cfg, report))
}

#[derive(Resource)]
struct StartupLead(String);

fn submit_startup_lead(lead: Option<Res<StartupLead>>, mut submit: EventWriter<SubmitLead>) {
    if let Some(lead) = lead {
        submit.write(SubmitLead {
            email: lead.0.clone(),
        });
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

#[cfg(feature = "golden")]
fn log_frame_hashes(app: &mut App) {
    let world = app.world_mut();
    let mut q = world.query::<(&Name, &noora_rendering::FrameBuffer)>();
    for (name, fb) in q.iter(world) {
        info!(canvas = %name, hash = %fb.surface.frame_hash(), "Frame hash");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut cfg, report) = load_config(&cli)?;
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }

    let mut viewport = HostViewport {
        size: Vec2::new(cfg.window.width, cfg.window.height),
        scroll_extent: cfg.page.height,
        ..Default::default()
    };
    if let Some(y) = cli.scroll {
        viewport.scroll_to(y);
    }

    let mut app = App::new();
    if cli.headless {
        app.add_plugins((MinimalPlugins, LogPlugin::default()))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
                1.0 / 60.0,
            )));
    } else {
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: cfg.window.title.clone(),
                resolution: (cfg.window.width, cfg.window.height).into(),
                resizable: true,
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_systems(Startup, spawn_camera);
    }

    app.insert_resource(viewport)
        .insert_resource(RngSeed(cfg.seed))
        .insert_resource(ScrollSettings {
            wheel_step: cfg.page.wheel_step,
        })
        .insert_resource(report)
        .insert_resource(ExitAfter {
            frames: cli.frames,
            seconds: (cfg.window.auto_close > 0.0).then_some(cfg.window.auto_close),
        })
        .insert_resource(CanvasConfigRes(cfg.clone()))
        .add_plugins((CorePlugin, RenderingPlugin, EffectsPlugin, PagePlugin))
        .add_plugins(LeadPlugin {
            config: cfg.lead.clone(),
        })
        .add_systems(Startup, submit_startup_lead);
    if let Some(email) = cli.lead {
        app.insert_resource(StartupLead(email));
    }

    if !cli.headless {
        return match app.run() {
            AppExit::Success => Ok(()),
            AppExit::Error(code) => anyhow::bail!("app exited with code {code}"),
        };
    }

    // Headless: step deterministically instead of handing control to the schedule runner.
    let frames = cli.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES);
    app.finish();
    app.cleanup();
    for _ in 0..frames {
        app.update();
        if app.should_exit().is_some() {
            break;
        }
    }
    #[cfg(feature = "golden")]
    log_frame_hashes(&mut app);
    info!(frames, "Headless run complete");
    Ok(())
}
