//! Page layout for the landing canvases.
//!
//! Background layers are pinned to the viewport; the hero assembly, orbit and privacy cube live in
//! document sections and follow the scroll position. Layout is expressed in document px (y down)
//! and converted to world space once per frame.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use noora_config::{CanvasConfig, SectionConfig};
use noora_core::{
    Canvas, CanvasConfigRes, CanvasFit, FrameSet, HostViewport, RngSeed, ScrollSampler,
    TrackedRegion,
};
use noora_effects::{
    effect_canvas, CollaborativeOrbit, ExplodedAssembly, MagneticFollower, ParticleField,
    PrivacyCube, VoidObjects,
};
use noora_lead::LeadOutcome;
use noora_rendering::{new_canvas_image, CanvasImage, Palette, SurfaceTransform};

pub const CTA_SIZE: Vec2 = Vec2::new(180.0, 48.0);

/// Document-space block an entity is centred on (horizontally centred in the viewport).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PageSection {
    pub top: f32,
    pub height: f32,
}

impl From<SectionConfig> for PageSection {
    fn from(s: SectionConfig) -> Self {
        Self {
            top: s.top,
            height: s.height,
        }
    }
}

impl PageSection {
    /// Centre in viewport px (y down) at the current scroll.
    pub fn viewport_center(&self, viewport: &HostViewport) -> Vec2 {
        Vec2::new(
            viewport.size.x * 0.5,
            self.top + self.height * 0.5 - viewport.scroll_y,
        )
    }
}

/// Viewport px (y down, origin top-left) to world units (y up, origin centre).
pub fn viewport_to_world(point: Vec2, viewport: &HostViewport) -> Vec2 {
    Vec2::new(
        point.x - viewport.size.x * 0.5,
        viewport.size.y * 0.5 - point.y,
    )
}

/// The hero call-to-action button that leans toward the pointer.
#[derive(Component, Debug)]
pub struct CallToAction;

/// Stop the app after a frame count or wall-clock duration (whichever comes first).
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ExitAfter {
    pub frames: Option<u32>,
    pub seconds: Option<f32>,
}

/// Config problems gathered before logging was up; reported on the first frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct ConfigReport {
    pub used: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigReport {
    pub fn for_config(cfg: &CanvasConfig, used: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            used,
            errors,
            warnings: cfg.validate(),
        }
    }
}

fn log_config_report(report: Res<ConfigReport>, cfg: Res<CanvasConfigRes>) {
    for e in &report.errors {
        warn!("CONFIG LOAD ISSUE: {e}");
    }
    for w in &report.warnings {
        warn!("CONFIG WARNING: {w}");
    }
    if report.used.is_empty() {
        info!("No config layers found; using defaults");
    } else {
        info!(used = ?report.used, "Config layers loaded");
    }
    let cfg = &cfg.0;
    info!(
        seed = cfg.seed,
        particles = cfg.particles.enabled,
        void_objects = cfg.void_objects.enabled,
        assembly = cfg.assembly.enabled,
        orbit = cfg.orbit.enabled,
        privacy_cube = cfg.privacy_cube.enabled,
        "Effect summary"
    );
}

/// Give the canvas a presentable sprite when image assets exist (windowed runs).
fn present(
    entity: &mut EntityCommands,
    canvas: &Canvas,
    images: &mut Option<ResMut<Assets<Image>>>,
) {
    let Some(images) = images.as_mut() else {
        return;
    };
    let t = SurfaceTransform::compute(canvas.logical_size, canvas.pixel_ratio);
    let handle = images.add(new_canvas_image(t.physical));
    entity.insert((
        Sprite {
            image: handle.clone(),
            custom_size: Some(canvas.logical_size),
            ..default()
        },
        CanvasImage(handle),
    ));
}

pub fn spawn_page(
    mut commands: Commands,
    cfg: Res<CanvasConfigRes>,
    seed: Res<RngSeed>,
    viewport: Res<HostViewport>,
    mut images: Option<ResMut<Assets<Image>>>,
) {
    let cfg = &cfg.0;
    let canvas = |fit: CanvasFit| {
        let mut c = Canvas::new(Vec2::ONE, fit);
        c.logical_size = c.fitted_size(&viewport);
        c.pixel_ratio = viewport.pixel_ratio;
        c
    };

    if cfg.particles.enabled {
        let c = canvas(CanvasFit::Viewport);
        let mut e = commands.spawn((
            Name::new("particle_field"),
            effect_canvas(c),
            ParticleField::new(
                cfg.particles.clone(),
                seed.derive(ParticleField::SEED_DOMAIN),
            ),
            Transform::from_xyz(0.0, 0.0, 0.0),
        ));
        present(&mut e, &c, &mut images);
    }
    if cfg.void_objects.enabled {
        let c = canvas(CanvasFit::Viewport);
        let mut e = commands.spawn((
            Name::new("void_objects"),
            effect_canvas(c),
            VoidObjects::new(
                cfg.void_objects.clone(),
                seed.derive(VoidObjects::SEED_DOMAIN),
            ),
            Transform::from_xyz(0.0, 0.0, 0.1),
        ));
        present(&mut e, &c, &mut images);
    }

    let page = &cfg.page;
    let tracked = |section: SectionConfig| {
        ScrollSampler::new(TrackedRegion::new(section.top, section.height, &cfg.scroll))
    };
    if cfg.assembly.enabled {
        let c = canvas(CanvasFit::ViewportWidth {
            height: page.hero.height,
        });
        let mut e = commands.spawn((
            Name::new("exploded_assembly"),
            effect_canvas(c),
            tracked(page.hero),
            PageSection::from(page.hero),
            ExplodedAssembly::new(cfg.assembly.clone(), seed.derive(ExplodedAssembly::SEED_DOMAIN)),
            Transform::from_xyz(0.0, 0.0, 1.0),
        ));
        present(&mut e, &c, &mut images);
    }
    if cfg.orbit.enabled {
        let c = canvas(CanvasFit::ViewportWidth {
            height: page.orbit.height,
        });
        let mut e = commands.spawn((
            Name::new("collaborative_orbit"),
            effect_canvas(c),
            tracked(page.orbit),
            PageSection::from(page.orbit),
            CollaborativeOrbit::new(cfg.orbit.clone()),
            Transform::from_xyz(0.0, 0.0, 1.0),
        ));
        present(&mut e, &c, &mut images);
    }
    if cfg.privacy_cube.enabled {
        let c = canvas(CanvasFit::ViewportWidth {
            height: page.privacy.height,
        });
        let mut e = commands.spawn((
            Name::new("privacy_cube"),
            effect_canvas(c),
            tracked(page.privacy),
            PageSection::from(page.privacy),
            PrivacyCube::new(cfg.privacy_cube.clone()),
            Transform::from_xyz(0.0, 0.0, 1.0),
        ));
        present(&mut e, &c, &mut images);
    }

    // Button in the lower quarter of the hero.
    let cta = PageSection {
        top: page.hero.top + page.hero.height * 0.75 - CTA_SIZE.y * 0.5,
        height: CTA_SIZE.y,
    };
    let rest = viewport_to_world(cta.viewport_center(&viewport), &viewport).extend(2.0);
    let mut e = commands.spawn((
        Name::new("cta"),
        CallToAction,
        cta,
        MagneticFollower::new(cfg.magnetic.clone(), cta.viewport_center(&viewport), rest),
        Transform::from_translation(rest),
    ));
    if images.is_some() {
        e.insert(Sprite::from_color(Palette::EMERALD, CTA_SIZE));
    }
    debug!(sections = ?(page.hero, page.orbit, page.privacy), "Page laid out");
}

/// Keep section entities where the scroll puts them. Magnetic followers get a new rest pose and
/// centre; their transform is written by the follower systems.
pub fn place_page_sections(
    viewport: Res<HostViewport>,
    mut q: Query<(&PageSection, &mut Transform, Option<&mut MagneticFollower>)>,
) {
    for (section, mut transform, follower) in &mut q {
        let center = section.viewport_center(&viewport);
        let world = viewport_to_world(center, &viewport);
        match follower {
            Some(mut f) => {
                let rest = world.extend(f.rest.z);
                if f.rest != rest || f.center != center {
                    f.rest = rest;
                    f.center = center;
                }
            }
            None => {
                let next = world.extend(transform.translation.z);
                if transform.translation != next {
                    transform.translation = next;
                }
            }
        }
    }
}

pub fn size_canvas_sprites(mut q: Query<(&Canvas, &mut Sprite), Changed<Canvas>>) {
    for (canvas, mut sprite) in &mut q {
        sprite.custom_size = Some(canvas.logical_size);
    }
}

/// Mirror the primary window's logical size and scale factor into the viewport resource.
pub fn sync_primary_window(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut viewport: ResMut<HostViewport>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = Vec2::new(window.resolution.width(), window.resolution.height());
    let ratio = window.scale_factor();
    if viewport.size != size {
        viewport.resize(size);
    }
    if viewport.pixel_ratio != ratio {
        viewport.pixel_ratio = ratio;
    }
}

pub fn report_lead_outcomes(mut outcomes: EventReader<LeadOutcome>) {
    for o in outcomes.read() {
        match &o.result {
            Ok(message) => info!(email = %o.email, %message, "Lead accepted"),
            Err(error) => warn!(email = %o.email, %error, "Lead not accepted"),
        }
    }
}

pub fn exit_when_done(
    limit: Res<ExitAfter>,
    time: Res<Time>,
    mut frames: Local<u32>,
    mut exit: EventWriter<AppExit>,
) {
    *frames += 1;
    let by_frames = limit.frames.is_some_and(|n| *frames >= n);
    let by_time = limit.seconds.is_some_and(|s| time.elapsed_secs() >= s);
    if by_frames || by_time {
        info!(frames = *frames, elapsed = time.elapsed_secs(), "Exit condition reached");
        exit.write(AppExit::Success);
    }
}

/// Lays out the page and keeps it in sync with the host. Expects `CanvasConfigRes` to be inserted
/// and the core, rendering and effects plugins to be added.
pub struct PagePlugin;

impl Plugin for PagePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExitAfter>()
            .init_resource::<ConfigReport>()
            .add_event::<LeadOutcome>()
            .add_systems(Startup, (log_config_report, spawn_page))
            .add_systems(
                Update,
                (sync_primary_window, place_page_sections)
                    .chain()
                    .before(FrameSet::Sample),
            )
            .add_systems(Update, size_canvas_sprites.after(FrameSet::Sample))
            .add_systems(
                Update,
                (report_lead_outcomes, exit_when_done).after(FrameSet::Present),
            );
    }
}
