// Pure configuration data for the canvas effects (no Bevy dependency).
// Everything here is plain serde data; the app wraps it in a resource.

use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    /// Automatically close the app after this many seconds. 0.0 (or omitted) = run indefinitely.
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Noora".into(),
            auto_close: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnRange<T> {
    pub min: T,
    pub max: T,
}
impl<T: Default> Default for SpawnRange<T> {
    fn default() -> Self {
        Self {
            min: Default::default(),
            max: Default::default(),
        }
    }
}

impl SpawnRange<f32> {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `v` into the range (tolerates inverted bounds).
    pub fn clamp(&self, v: f32) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        v.clamp(lo, hi)
    }
}

/// One end of a scroll-tracked region: the point where `element` (fraction of the element's
/// height, 0 = top) meets `viewport` (fraction of the viewport height, 0 = top).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScrollAnchorConfig {
    pub element: f32,
    pub viewport: f32,
}
impl Default for ScrollAnchorConfig {
    fn default() -> Self {
        Self {
            element: 0.0,
            viewport: 0.8,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScrollRegionConfig {
    pub start: ScrollAnchorConfig,
    pub end: ScrollAnchorConfig,
}
impl Default for ScrollRegionConfig {
    fn default() -> Self {
        Self {
            // "top 80%" -> "center center"
            start: ScrollAnchorConfig {
                element: 0.0,
                viewport: 0.8,
            },
            end: ScrollAnchorConfig {
                element: 0.5,
                viewport: 0.5,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ParticleFieldConfig {
    pub enabled: bool,
    /// Hard cap on concurrently live particles.
    pub max_particles: usize,
    /// Probability of a spawn attempt per frame.
    pub spawn_chance: f32,
    /// Lifetime in nominal (60 fps) frames.
    pub life_frames: SpawnRange<f32>,
    /// Max absolute drift per frame on each axis (centered on zero).
    pub drift_speed: f32,
    /// Constant upward bias subtracted from the vertical drift.
    pub upward_bias: f32,
    pub size_range: SpawnRange<f32>,
    pub peak_opacity: f32,
    /// Fraction of lifetime spent fading in.
    pub fade_in: f32,
    /// Fraction of lifetime spent fading out.
    pub fade_out: f32,
    /// Halo radius as a multiple of particle size.
    pub halo_scale: f32,
}
impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_particles: 60,
            spawn_chance: 0.15,
            life_frames: SpawnRange::new(400.0, 1000.0),
            drift_speed: 0.15,
            upward_bias: 0.05,
            size_range: SpawnRange::new(0.5, 2.0),
            peak_opacity: 0.12,
            fade_in: 0.1,
            fade_out: 0.2,
            halo_scale: 4.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct VoidObjectsConfig {
    pub enabled: bool,
    pub count: usize,
    pub size_range: SpawnRange<f32>,
    /// Parallax depth; scales size and pointer sway.
    pub depth_range: SpawnRange<f32>,
    /// Max absolute spin per frame around X and Y (radians).
    pub spin_xy: f32,
    /// Max absolute spin per frame around Z (radians).
    pub spin_z: f32,
    pub opacity_range: SpawnRange<f32>,
    pub sway_x: f32,
    pub sway_y: f32,
    pub focal_length: f32,
}
impl Default for VoidObjectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 12,
            size_range: SpawnRange::new(20.0, 70.0),
            depth_range: SpawnRange::new(0.3, 1.0),
            spin_xy: 0.00075,
            spin_z: 0.001,
            opacity_range: SpawnRange::new(0.015, 0.04),
            sway_x: 30.0,
            sway_y: 20.0,
            focal_length: 300.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssemblyConfig {
    pub enabled: bool,
    pub count: usize,
    pub spring_range: SpawnRange<f32>,
    /// Per-frame velocity retention; must stay inside (0, 1) for the spring to converge.
    pub damping_range: SpawnRange<f32>,
    pub stagger_ms: f32,
    pub scatter_range: SpawnRange<f32>,
    pub size_range: SpawnRange<f32>,
    pub settle_distance: f32,
    pub settle_speed: f32,
    /// Region starts assembling once its top is within `activation_band` viewport heights.
    pub activation_band: f32,
    pub link_distance: f32,
    pub fade_in_ms: f32,
    pub pulse_period_ms: f32,
}
impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 35,
            spring_range: SpawnRange::new(0.025, 0.06),
            damping_range: SpawnRange::new(0.82, 0.90),
            stagger_ms: 25.0,
            scatter_range: SpawnRange::new(200.0, 450.0),
            size_range: SpawnRange::new(3.0, 11.0),
            settle_distance: 0.5,
            settle_speed: 0.1,
            activation_band: 1.2,
            link_distance: 60.0,
            fade_in_ms: 400.0,
            pulse_period_ms: 1500.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OrbitConfig {
    pub enabled: bool,
    pub labels: Vec<String>,
    pub max_radius_frac: f32,
    pub min_radius_frac: f32,
    /// Orbit clock advance per frame.
    pub time_step: f32,
    /// Vertical squash of the orbit ellipse.
    pub ellipse_ratio: f32,
    /// Progress after which neighbour links become visible.
    pub link_threshold: f32,
}
impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            labels: ["ML", "CR", "AP", "DK", "SR", "LV"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_radius_frac: 0.35,
            min_radius_frac: 0.1,
            time_step: 0.005,
            ellipse_ratio: 0.5,
            link_threshold: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PrivacyCubeConfig {
    pub enabled: bool,
    pub focal_length: f32,
    /// Cube half-extent as a fraction of min(width, height).
    pub size_frac: f32,
}
impl Default for PrivacyCubeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            focal_length: 300.0,
            size_frac: 0.18,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MagneticConfig {
    pub enabled: bool,
    /// Pointer distance (px) inside which the element is attracted.
    pub threshold: f32,
    pub strength: f32,
    /// Fraction of the remaining offset covered per frame.
    pub ease: f32,
}
impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 120.0,
            strength: 0.35,
            ease: 0.15,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SectionConfig {
    /// Document offset of the section top (px).
    pub top: f32,
    pub height: f32,
}
impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            top: 0.0,
            height: 400.0,
        }
    }
}

/// Vertical page layout used by the app to place scroll-tracked canvases.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub height: f32,
    pub hero: SectionConfig,
    pub orbit: SectionConfig,
    pub privacy: SectionConfig,
    /// Scroll distance per mouse-wheel line.
    pub wheel_step: f32,
}
impl Default for PageConfig {
    fn default() -> Self {
        Self {
            height: 3600.0,
            hero: SectionConfig {
                top: 0.0,
                height: 900.0,
            },
            orbit: SectionConfig {
                top: 1500.0,
                height: 400.0,
            },
            privacy: SectionConfig {
                top: 2500.0,
                height: 400.0,
            },
            wheel_step: 40.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LeadConfig {
    /// Form-intake endpoint receiving `{"email": ...}` as JSON.
    pub endpoint: String,
    pub timeout_secs: f32,
}
impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787/lead".into(),
            timeout_secs: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub window: WindowConfig,
    /// Base seed for every effect RNG (each effect derives its own stream).
    pub seed: u64,
    pub scroll: ScrollRegionConfig,
    pub particles: ParticleFieldConfig,
    pub void_objects: VoidObjectsConfig,
    pub assembly: AssemblyConfig,
    pub orbit: OrbitConfig,
    pub privacy_cube: PrivacyCubeConfig,
    pub magnetic: MagneticConfig,
    pub page: PageConfig,
    pub lead: LeadConfig,
}
impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            window: Default::default(),
            seed: 12345,
            scroll: Default::default(),
            particles: Default::default(),
            void_objects: Default::default(),
            assembly: Default::default(),
            orbit: Default::default(),
            privacy_cube: Default::default(),
            magnetic: Default::default(),
            page: Default::default(),
            lead: Default::default(),
        }
    }
}

impl CanvasConfig {
    /// Load from a single RON file (errors contain human-readable context).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        Self::from_ron_str(&data)
    }

    pub fn from_ron_str(data: &str) -> Result<Self, String> {
        ron::from_str(data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Load file; on failure returns default config plus error string.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Deep-merge RON layers in order (later wins) and deserialize the result.
    ///
    /// Absent layers are skipped quietly; unreadable or malformed ones are reported and skipped.
    /// Returns `(config, layers_used, problems)`.
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        let mut merged: Option<ron::Value> = None;
        let mut used = Vec::new();
        let mut problems = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let layer = match read_layer(path) {
                Ok(Some(layer)) => layer,
                Ok(None) => continue,
                Err(e) => {
                    problems.push(e);
                    continue;
                }
            };
            match merged.as_mut() {
                Some(base) => merge_value(base, layer),
                None => merged = Some(layer),
            }
            used.push(path.display().to_string());
        }

        let cfg = match merged.map(|v| v.into_rust::<CanvasConfig>()) {
            None => CanvasConfig::default(),
            Some(Ok(cfg)) => cfg,
            Some(Err(e)) => {
                problems.push(format!("merged layers do not form a config ({e}); using defaults"));
                CanvasConfig::default()
            }
        };
        (cfg, used, problems)
    }

    /// Produce validation warnings (non-fatal) for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.window.auto_close < 0.0 {
            w.push(format!(
                "window.autoClose {} negative -> treated as disabled (should be >= 0)",
                self.window.auto_close
            ));
        }

        fn check_range_f32(w: &mut Vec<String>, label: &str, r: &SpawnRange<f32>) {
            if r.min > r.max {
                w.push(format!("{label} min ({}) greater than max ({})", r.min, r.max));
            }
        }
        fn check_unit(w: &mut Vec<String>, label: &str, v: f32) {
            if !(0.0..=1.0).contains(&v) {
                w.push(format!("{label} {v} outside 0..1"));
            }
        }

        check_unit(&mut w, "scroll.start.element", self.scroll.start.element);
        check_unit(&mut w, "scroll.start.viewport", self.scroll.start.viewport);
        check_unit(&mut w, "scroll.end.element", self.scroll.end.element);
        check_unit(&mut w, "scroll.end.viewport", self.scroll.end.viewport);

        let p = &self.particles;
        if p.enabled {
            if p.max_particles == 0 {
                w.push("particles.max_particles is 0; nothing will spawn".into());
            }
            if p.max_particles > 10_000 {
                w.push(format!(
                    "particles.max_particles {} very high; frame budget at risk",
                    p.max_particles
                ));
            }
            check_unit(&mut w, "particles.spawn_chance", p.spawn_chance);
            check_unit(&mut w, "particles.peak_opacity", p.peak_opacity);
            check_range_f32(&mut w, "particles.life_frames", &p.life_frames);
            check_range_f32(&mut w, "particles.size_range", &p.size_range);
            if p.life_frames.min <= 0.0 {
                w.push("particles.life_frames.min must be > 0".into());
            }
            if p.fade_in + p.fade_out > 1.0 {
                w.push(format!(
                    "particles.fade_in + fade_out = {} exceeds 1; envelope never holds",
                    p.fade_in + p.fade_out
                ));
            }
        }

        let v = &self.void_objects;
        if v.enabled {
            check_range_f32(&mut w, "void_objects.size_range", &v.size_range);
            check_range_f32(&mut w, "void_objects.depth_range", &v.depth_range);
            check_range_f32(&mut w, "void_objects.opacity_range", &v.opacity_range);
            if v.focal_length <= 0.0 {
                w.push("void_objects.focal_length must be > 0".into());
            }
        }

        let a = &self.assembly;
        if a.enabled {
            check_range_f32(&mut w, "assembly.spring_range", &a.spring_range);
            check_range_f32(&mut w, "assembly.damping_range", &a.damping_range);
            check_range_f32(&mut w, "assembly.scatter_range", &a.scatter_range);
            check_range_f32(&mut w, "assembly.size_range", &a.size_range);
            if a.spring_range.min <= 0.0 {
                w.push("assembly.spring_range.min must be > 0".into());
            }
            if a.damping_range.min <= 0.0 || a.damping_range.max >= 1.0 {
                w.push(format!(
                    "assembly.damping_range {}..{} must lie inside (0, 1) to converge",
                    a.damping_range.min, a.damping_range.max
                ));
            }
            if a.settle_distance <= 0.0 || a.settle_speed <= 0.0 {
                w.push("assembly settle thresholds must be > 0".into());
            }
        }

        let o = &self.orbit;
        if o.enabled {
            if o.labels.is_empty() {
                w.push("orbit.labels is empty; nothing will orbit".into());
            }
            if o.min_radius_frac > o.max_radius_frac {
                w.push(format!(
                    "orbit.min_radius_frac ({}) greater than max_radius_frac ({})",
                    o.min_radius_frac, o.max_radius_frac
                ));
            }
        }

        if self.privacy_cube.enabled && self.privacy_cube.focal_length <= 0.0 {
            w.push("privacy_cube.focal_length must be > 0".into());
        }

        let m = &self.magnetic;
        if m.enabled {
            if m.threshold <= 0.0 {
                w.push("magnetic.threshold must be > 0".into());
            }
            check_unit(&mut w, "magnetic.ease", m.ease);
        }

        if self.page.height < self.window.height {
            w.push(format!(
                "page.height {} shorter than window; nothing to scroll",
                self.page.height
            ));
        }

        if self.lead.endpoint.trim().is_empty() {
            w.push("lead.endpoint empty; submissions will fail".into());
        }
        if self.lead.timeout_secs <= 0.0 {
            w.push("lead.timeout_secs must be > 0".into());
        }
        w
    }
}

fn read_layer(path: &Path) -> Result<Option<ron::Value>, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("{}: read error: {e}", path.display())),
    };
    ron::from_str(&text)
        .map(Some)
        .map_err(|e| format!("{}: parse error: {e}", path.display()))
}

/// Maps merge key by key; anything else is replaced by the overlay.
fn merge_value(base: &mut ron::Value, overlay: ron::Value) {
    match (base, overlay) {
        (ron::Value::Map(base), ron::Value::Map(overlay)) => {
            for (key, value) in overlay {
                let value = match base.remove(&key) {
                    Some(mut existing) => {
                        merge_value(&mut existing, value);
                        existing
                    }
                    None => value,
                };
                base.insert(key, value);
            }
        }
        (slot, value) => *slot = value,
    }
}
