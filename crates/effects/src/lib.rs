// Effects crate: the per-canvas particle/shape systems and the generic stepping glue.
//
// Every effect is a component on its canvas entity and owns its entities and RNG. The shared
// `step_effect::<E>` system converts the canvas loop's tick into whole nominal frames, feeds the
// effect its scroll/pointer input, and rebuilds the canvas draw list.

use bevy::ecs::component::Mutable;
use bevy::prelude::*;
use noora_core::{
    AnimationLoop, Canvas, FrameCredit, FrameSet, FrameTick, PointerState, RegionView,
    ScrollSampler,
};
use noora_rendering::{DrawList, FrameBuffer};

pub mod assembly;
pub mod magnetic;
pub mod orbit;
pub mod particle_field;
pub mod privacy_cube;
pub mod void_objects;

pub use assembly::{hex_targets, ExplodedAssembly, NodeKind, SpringNode};
pub use magnetic::{apply_transform_params, magnetic_pull, MagneticFollower, TransformParams};
pub use orbit::{radius_at, CollaborativeOrbit};
pub use particle_field::{opacity_envelope, Particle, ParticleField, ParticlePhase};
pub use privacy_cube::{ease_in_out_quad, PrivacyCube};
pub use void_objects::{VoidKind, VoidObjects, VoidShape};

/// Per-frame inputs read by an effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Scroll progress through the canvas's tracked region (0 when untracked).
    pub progress: f32,
    /// Normalized pointer, `[0,1]²`.
    pub pointer: Vec2,
    /// Tracked region position relative to the viewport; `None` for untracked canvases.
    pub view: Option<RegionView>,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            progress: 0.0,
            pointer: Vec2::splat(0.5),
            view: None,
        }
    }
}

pub trait CanvasEffect: Component<Mutability = Mutable> {
    /// Adopt new logical surface bounds.
    fn resize(&mut self, size: Vec2);
    /// Advance one nominal frame.
    fn update(&mut self, tick: &FrameTick, input: &FrameInput);
    /// Emit this frame's visuals.
    fn draw(&self, list: &mut DrawList);
}

/// Per-canvas stepping state shared by all effect kinds.
#[derive(Component, Debug, Clone, Default)]
pub struct EffectClock {
    credit: FrameCredit,
    size: Vec2,
    steps: u64,
}

impl EffectClock {
    /// Nominal frames simulated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Components every effect canvas carries besides the effect itself.
pub fn effect_canvas(canvas: Canvas) -> (Canvas, AnimationLoop, EffectClock, FrameBuffer) {
    let buffer = FrameBuffer::new(&canvas);
    (canvas, AnimationLoop::running(), EffectClock::default(), buffer)
}

pub fn step_effect<E: CanvasEffect>(
    pointer: Res<PointerState>,
    mut q: Query<(
        &Canvas,
        &AnimationLoop,
        Option<&ScrollSampler>,
        &mut EffectClock,
        &mut E,
        &mut FrameBuffer,
    )>,
) {
    for (canvas, anim, sampler, mut clock, mut effect, mut fb) in &mut q {
        // Unavailable surface or stopped loop: stay silent.
        if !canvas.is_drawable() {
            continue;
        }
        let Some(tick) = anim.last_tick() else {
            continue;
        };
        if clock.size != canvas.logical_size {
            clock.size = canvas.logical_size;
            effect.resize(canvas.logical_size);
        }
        let input = FrameInput {
            progress: sampler.map_or(0.0, |s| s.progress()),
            pointer: pointer.normalized(),
            view: sampler.map(|s| s.view()),
        };
        let steps = clock.credit.accumulate(tick.frames());
        if steps == 0 && clock.steps > 0 {
            continue;
        }
        for _ in 0..steps.max(1) {
            clock.steps += 1;
            effect.update(&FrameTick::nominal(clock.steps), &input);
        }
        effect.draw(fb.begin());
    }
}

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                step_effect::<ParticleField>,
                step_effect::<VoidObjects>,
                step_effect::<ExplodedAssembly>,
                step_effect::<CollaborativeOrbit>,
                step_effect::<PrivacyCube>,
                (magnetic::update_magnetic_followers, apply_transform_params).chain(),
            )
                .in_set(FrameSet::Simulate),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use noora_config::{OrbitConfig, ParticleFieldConfig, ScrollRegionConfig};
    use noora_core::{CanvasFit, CorePlugin, HostViewport, TrackedRegion};
    use noora_rendering::RenderingPlugin;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));
        app.add_plugins((CorePlugin, RenderingPlugin, EffectsPlugin));
        app
    }

    fn field_canvas(app: &mut App, canvas: Canvas) -> Entity {
        let cfg = ParticleFieldConfig {
            spawn_chance: 1.0,
            ..Default::default()
        };
        app.world_mut()
            .spawn((effect_canvas(canvas), ParticleField::new(cfg, 1)))
            .id()
    }

    #[test]
    fn running_canvas_simulates_and_draws() {
        let mut app = app();
        let e = field_canvas(&mut app, Canvas::new(Vec2::new(200.0, 100.0), CanvasFit::Fixed));
        for _ in 0..10 {
            app.update();
        }
        let world = app.world();
        let clock = world.get::<EffectClock>(e).unwrap();
        assert!(clock.steps() >= 9, "steps: {}", clock.steps());
        let field = world.get::<ParticleField>(e).unwrap();
        assert!(!field.active_entities().is_empty());
        let fb = world.get::<FrameBuffer>(e).unwrap();
        assert_eq!(fb.list.len(), field.active_entities().len() * 2);
    }

    #[test]
    fn jittered_frames_step_and_draw_every_frame() {
        let mut app = app();
        let e = field_canvas(&mut app, Canvas::new(Vec2::new(200.0, 100.0), CanvasFit::Fixed));
        app.update();
        let start = app.world().get::<EffectClock>(e).unwrap().steps();
        let deltas = [0.0166, 0.0167, 0.0165, 0.0168, 0.0166, 0.0169, 0.0164, 0.0167];
        for (i, d) in deltas.iter().cycle().take(40).enumerate() {
            app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(*d)));
            app.update();
            let steps = app.world().get::<EffectClock>(e).unwrap().steps();
            assert_eq!(steps, start + i as u64 + 1, "frame {i} with delta {d}");
        }
    }

    #[test]
    fn unavailable_canvas_is_a_no_op() {
        let mut app = app();
        let mut canvas = Canvas::new(Vec2::new(200.0, 100.0), CanvasFit::Fixed);
        canvas.available = false;
        let e = field_canvas(&mut app, canvas);
        for _ in 0..10 {
            app.update();
        }
        assert_eq!(app.world().get::<EffectClock>(e).unwrap().steps(), 0);
        assert!(app.world().get::<ParticleField>(e).unwrap().active_entities().is_empty());
    }

    #[test]
    fn stopped_loop_freezes_effect() {
        let mut app = app();
        let e = field_canvas(&mut app, Canvas::new(Vec2::new(200.0, 100.0), CanvasFit::Fixed));
        app.update();
        app.update();
        let mut anim = app.world_mut().get_mut::<AnimationLoop>(e).unwrap();
        let handle = anim.start();
        assert!(anim.stop(handle));
        let before = app.world().get::<EffectClock>(e).unwrap().steps();
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().get::<EffectClock>(e).unwrap().steps(), before);
    }

    #[test]
    fn despawned_canvas_leaves_nothing_behind() {
        let mut app = app();
        let e = field_canvas(&mut app, Canvas::new(Vec2::new(200.0, 100.0), CanvasFit::Fixed));
        app.update();
        app.world_mut().despawn(e);
        app.update();
        let world = app.world_mut();
        let mut fields = world.query::<&ParticleField>();
        assert_eq!(fields.iter(world).count(), 0);
        let mut buffers = world.query::<&FrameBuffer>();
        assert_eq!(buffers.iter(world).count(), 0);
    }

    #[test]
    fn scroll_progress_reaches_orbit() {
        let mut app = app();
        app.insert_resource(HostViewport {
            size: Vec2::new(800.0, 1000.0),
            scroll_extent: 5000.0,
            scroll_y: 1700.0,
            ..Default::default()
        });
        let region = TrackedRegion::new(2000.0, 400.0, &ScrollRegionConfig::default());
        let e = app
            .world_mut()
            .spawn((
                effect_canvas(Canvas::new(Vec2::ONE, CanvasFit::ViewportWidth { height: 400.0 })),
                ScrollSampler::new(region),
                CollaborativeOrbit::new(OrbitConfig::default()),
            ))
            .id();
        app.update();
        app.update();
        let orbit = app.world().get::<CollaborativeOrbit>(e).unwrap();
        assert_eq!(orbit.progress(), 1.0);
        assert_eq!(orbit.radius(), 0.1 * 400.0);
    }
}
