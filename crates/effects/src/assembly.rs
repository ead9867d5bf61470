//! Exploded assembly: scattered nodes spring onto a hex-ring structure.
//!
//! Nodes start 200-450 px out from the canvas centre and are released one by one (staggered
//! delay). Each released node integrates `v += k (target - x); v *= damping; x += v` once per
//! frame. Once enough nodes have settled, faint links between structurally adjacent nodes fade in.
//!
//! Nothing is created until the tracked region first enters the expanded viewport band. A resize
//! discards every node and waits for the band again; the layout is rebuilt around the new centre.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy::prelude::*;
use noora_config::AssemblyConfig;
use noora_core::FrameTick;
use noora_rendering::{color_for_index, with_alpha, DrawList, Palette, Shape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::particle_field::sample;
use crate::{CanvasEffect, FrameInput};

/// Ring populations (centre first) and their radii.
const RING_COUNTS: [usize; 4] = [1, 6, 12, 18];
const RING_RADII: [f32; 4] = [0.0, 40.0, 80.0, 120.0];
/// Radius band used for targets beyond the last ring.
const FILL_RADIUS: (f32, f32) = (50.0, 150.0);
/// Base alpha per accent slot.
const NODE_ALPHAS: [f32; 5] = [0.5, 0.4, 0.3, 0.15, 0.35];
const LINK_ALPHA_MAX: f32 = 0.06;
const LINK_ALPHA_MIN: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Circle,
    Square,
    Line,
    Dot,
    Pulse,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Circle,
        NodeKind::Square,
        NodeKind::Line,
        NodeKind::Dot,
        NodeKind::Pulse,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpringNode {
    pub position: Vec2,
    pub velocity: Vec2,
    pub target: Vec2,
    pub size: f32,
    pub kind: NodeKind,
    pub color: Srgba,
    pub spring: f32,
    pub damping: f32,
    pub delay_ms: f32,
    /// One-way: never cleared once set.
    pub settled: bool,
}

impl SpringNode {
    /// One spring step; marks the node settled once close and slow enough.
    pub fn step(&mut self, settle_distance: f32, settle_speed: f32) {
        let d = self.target - self.position;
        self.velocity += d * self.spring;
        self.velocity *= self.damping;
        self.position += self.velocity;
        if d.x.abs() < settle_distance
            && d.y.abs() < settle_distance
            && self.velocity.x.abs() < settle_speed
            && self.velocity.y.abs() < settle_speed
        {
            self.settled = true;
        }
    }
}

/// Hex-ring target layout around `center`: rings of 1/6/12/18, random fill beyond.
pub fn hex_targets(center: Vec2, count: usize, rng: &mut StdRng) -> Vec<Vec2> {
    let mut targets = Vec::with_capacity(count);
    'rings: for (n, r) in RING_COUNTS.iter().zip(RING_RADII) {
        for i in 0..*n {
            if targets.len() >= count {
                break 'rings;
            }
            let a = i as f32 / *n as f32 * TAU - FRAC_PI_2;
            targets.push(center + Vec2::new(a.cos(), a.sin()) * r);
        }
    }
    while targets.len() < count {
        let a = rng.gen::<f32>() * TAU;
        let r = FILL_RADIUS.0 + rng.gen::<f32>() * (FILL_RADIUS.1 - FILL_RADIUS.0);
        targets.push(center + Vec2::new(a.cos(), a.sin()) * r);
    }
    targets
}

#[derive(Component, Debug, Clone)]
pub struct ExplodedAssembly {
    cfg: AssemblyConfig,
    bounds: Vec2,
    nodes: Vec<SpringNode>,
    initialized: bool,
    elapsed_ms: f32,
    rng: StdRng,
}

impl ExplodedAssembly {
    pub const SEED_DOMAIN: u64 = 0xA55E_3B1F;

    pub fn new(cfg: AssemblyConfig, seed: u64) -> Self {
        Self {
            cfg,
            bounds: Vec2::ZERO,
            nodes: Vec::new(),
            initialized: false,
            elapsed_ms: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn nodes(&self) -> &[SpringNode] {
        &self.nodes
    }

    pub fn settled_fraction(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let settled = self.nodes.iter().filter(|n| n.settled).count();
        (settled as f32 / self.nodes.len() as f32).min(1.0)
    }

    /// Alpha of the structure links.
    pub fn link_alpha(&self) -> f32 {
        self.settled_fraction() * LINK_ALPHA_MAX
    }

    fn initialize(&mut self) {
        let center = self.bounds * 0.5;
        let count = self.cfg.count;
        let targets = hex_targets(center, count, &mut self.rng);
        let cfg = &self.cfg;
        let rng = &mut self.rng;
        self.nodes = targets
            .into_iter()
            .enumerate()
            .map(|(i, target)| {
                let a = rng.gen::<f32>() * TAU;
                let dist = sample(rng, &cfg.scatter_range);
                let start = center + Vec2::new(a.cos(), a.sin()) * dist;
                let slot = i % NodeKind::ALL.len();
                SpringNode {
                    position: start,
                    velocity: Vec2::ZERO,
                    target,
                    size: cfg.size_range.clamp(sample(rng, &cfg.size_range)),
                    kind: NodeKind::ALL[slot],
                    color: with_alpha(color_for_index(slot), NODE_ALPHAS[slot]),
                    spring: cfg.spring_range.clamp(sample(rng, &cfg.spring_range)),
                    damping: cfg.damping_range.clamp(sample(rng, &cfg.damping_range)),
                    delay_ms: i as f32 * cfg.stagger_ms,
                    settled: false,
                }
            })
            .collect();
        self.initialized = true;
        self.elapsed_ms = 0.0;
        debug!(nodes = count, "Assembly initialized");
    }

    fn released(&self, node: &SpringNode) -> bool {
        self.elapsed_ms >= node.delay_ms
    }

    fn draw_node(&self, node: &SpringNode, list: &mut DrawList) {
        let since = self.elapsed_ms - node.delay_ms;
        let alpha = if self.cfg.fade_in_ms > 0.0 {
            (since / self.cfg.fade_in_ms).min(1.0)
        } else {
            1.0
        };
        let (p, s, color) = (node.position, node.size, node.color);
        match node.kind {
            NodeKind::Circle => list.push(alpha, Shape::FillCircle { center: p, radius: s, color }),
            NodeKind::Square => list.push(
                alpha,
                Shape::FillRect {
                    min: p - Vec2::splat(s * 0.5),
                    size: Vec2::splat(s),
                    color,
                },
            ),
            NodeKind::Line => list.push(
                alpha,
                Shape::Line {
                    from: p - Vec2::new(s, 0.0),
                    to: p + Vec2::new(s, 0.0),
                    width: 1.0,
                    color,
                },
            ),
            NodeKind::Dot => {
                list.push(alpha, Shape::FillCircle { center: p, radius: 2.0, color });
                list.push(
                    alpha,
                    Shape::Glow {
                        center: p,
                        radius: s * 2.0,
                        inner: color,
                        outer: Palette::TRANSPARENT,
                    },
                );
            }
            NodeKind::Pulse => {
                let phase = if self.cfg.pulse_period_ms > 0.0 {
                    (since / self.cfg.pulse_period_ms).rem_euclid(1.0)
                } else {
                    0.0
                };
                list.push(
                    alpha,
                    Shape::StrokeCircle {
                        center: p,
                        radius: s * (1.0 + phase),
                        width: 0.8,
                        color: with_alpha(color, 0.4 * (1.0 - phase)),
                    },
                );
            }
        }
    }
}

impl CanvasEffect for ExplodedAssembly {
    fn resize(&mut self, size: Vec2) {
        if self.bounds == size {
            return;
        }
        self.bounds = size;
        if self.initialized {
            self.nodes.clear();
            self.initialized = false;
            debug!("Assembly reset after resize");
        }
    }

    fn update(&mut self, tick: &FrameTick, input: &FrameInput) {
        if !self.cfg.enabled {
            return;
        }
        if !self.initialized {
            let visible = input
                .view
                .is_none_or(|v| v.in_band(self.cfg.activation_band));
            if !visible || self.bounds.x <= 0.0 || self.bounds.y <= 0.0 {
                return;
            }
            self.initialize();
        }
        self.elapsed_ms += tick.delta * 1000.0;
        let (dist, speed) = (self.cfg.settle_distance, self.cfg.settle_speed);
        let now = self.elapsed_ms;
        for node in &mut self.nodes {
            if now >= node.delay_ms {
                node.step(dist, speed);
            }
        }
    }

    fn draw(&self, list: &mut DrawList) {
        if !self.initialized {
            return;
        }
        let link_alpha = self.link_alpha();
        if link_alpha > LINK_ALPHA_MIN {
            let color = with_alpha(Palette::EMERALD, link_alpha);
            for (i, a) in self.nodes.iter().enumerate() {
                for b in &self.nodes[i + 1..] {
                    if a.target.distance(b.target) < self.cfg.link_distance {
                        list.push_opaque(Shape::Line {
                            from: a.position,
                            to: b.position,
                            width: 0.5,
                            color,
                        });
                    }
                }
            }
        }
        for node in self.nodes.iter().filter(|n| self.released(n)) {
            self.draw_node(node, list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noora_core::RegionView;

    fn assembly() -> ExplodedAssembly {
        let mut a = ExplodedAssembly::new(AssemblyConfig::default(), 77);
        a.resize(Vec2::new(800.0, 600.0));
        a
    }

    fn run(a: &mut ExplodedAssembly, frames: u64, input: &FrameInput) {
        for i in 1..=frames {
            a.update(&FrameTick::nominal(i), input);
        }
    }

    #[test]
    fn targets_follow_hex_rings() {
        let mut rng = StdRng::seed_from_u64(0);
        let c = Vec2::new(100.0, 100.0);
        let t = hex_targets(c, 35, &mut rng);
        assert_eq!(t.len(), 35);
        assert_eq!(t[0], c);
        // first ring starts straight up
        assert!((t[1] - (c + Vec2::new(0.0, -40.0))).length() < 1e-4);
        assert!(t[1..7].iter().all(|p| (p.distance(c) - 40.0).abs() < 1e-3));
        assert!(t[7..19].iter().all(|p| (p.distance(c) - 80.0).abs() < 1e-3));
        assert!(t[19..].iter().all(|p| (p.distance(c) - 120.0).abs() < 1e-3));

        let more = hex_targets(c, 45, &mut rng);
        assert!(more[37..].iter().all(|p| {
            let d = p.distance(c);
            (50.0..=150.0).contains(&d)
        }));
    }

    #[test]
    fn settles_for_any_damping_in_unit_interval() {
        for k in [0.025, 0.06] {
            for d in [0.05, 0.5, 0.82, 0.9, 0.99] {
                let mut n = SpringNode {
                    position: Vec2::new(450.0, -200.0),
                    velocity: Vec2::ZERO,
                    target: Vec2::ZERO,
                    size: 4.0,
                    kind: NodeKind::Circle,
                    color: Palette::WHITE,
                    spring: k,
                    damping: d,
                    delay_ms: 0.0,
                    settled: false,
                };
                for _ in 0..20_000 {
                    n.step(0.5, 0.1);
                    if n.settled {
                        break;
                    }
                }
                assert!(n.settled, "k={k} d={d} did not settle: {:?}", n.position);
            }
        }
    }

    #[test]
    fn settled_is_one_way() {
        let mut n = SpringNode {
            position: Vec2::new(0.1, 0.1),
            velocity: Vec2::ZERO,
            target: Vec2::ZERO,
            size: 4.0,
            kind: NodeKind::Dot,
            color: Palette::WHITE,
            spring: 0.05,
            damping: 0.85,
            delay_ms: 0.0,
            settled: false,
        };
        n.step(0.5, 0.1);
        assert!(n.settled);
        n.target = Vec2::new(500.0, 0.0);
        n.step(0.5, 0.1);
        assert!(n.settled);
    }

    #[test]
    fn waits_for_viewport_band() {
        let mut a = assembly();
        let far = FrameInput {
            view: Some(RegionView {
                top: 2000.0,
                bottom: 2600.0,
                viewport_height: 1000.0,
            }),
            ..Default::default()
        };
        run(&mut a, 10, &far);
        assert!(!a.is_initialized());
        let near = FrameInput {
            view: Some(RegionView {
                top: 1100.0,
                bottom: 1700.0,
                viewport_height: 1000.0,
            }),
            ..Default::default()
        };
        run(&mut a, 1, &near);
        assert!(a.is_initialized());
        assert_eq!(a.nodes().len(), 35);
    }

    #[test]
    fn nodes_are_released_in_stagger_order() {
        let mut a = assembly();
        let input = FrameInput::default();
        run(&mut a, 1, &input);
        let moved: Vec<bool> = a.nodes().iter().map(|n| n.velocity != Vec2::ZERO).collect();
        // one frame = 16.7 ms: delays 0 ms released, 25 ms not yet
        assert!(moved[0]);
        assert!(!moved[1]);
        run(&mut a, 120, &input);
        assert!(a.nodes().iter().all(|n| n.velocity != Vec2::ZERO || n.settled));
    }

    #[test]
    fn whole_structure_settles_and_links_appear() {
        let mut a = assembly();
        let input = FrameInput::default();
        let mut list = DrawList::new();
        a.draw(&mut list);
        assert!(list.is_empty(), "nothing drawn before init");
        run(&mut a, 1500, &input);
        assert_eq!(a.settled_fraction(), 1.0);
        assert!((a.link_alpha() - LINK_ALPHA_MAX).abs() < 1e-6);
        a.draw(&mut list);
        let links = list
            .iter()
            .filter(|d| matches!(d.shape, Shape::Line { width, .. } if width == 0.5))
            .count();
        assert!(links > 0);
        let centre = Vec2::new(400.0, 300.0);
        assert!((a.nodes()[0].position - centre).length() < 1.0);
    }

    #[test]
    fn resize_discards_nodes_until_band_again() {
        let mut a = assembly();
        run(&mut a, 5, &FrameInput::default());
        assert!(a.is_initialized());
        a.resize(Vec2::new(1024.0, 600.0));
        assert!(!a.is_initialized());
        assert!(a.nodes().is_empty());
        run(&mut a, 1, &FrameInput::default());
        assert_eq!(a.nodes()[0].target, Vec2::new(512.0, 300.0));
    }
}
