//! Scroll-progress sampling.
//!
//! A [`TrackedRegion`] describes an element on the page plus two anchors ("element top meets 80%
//! of the viewport", "element centre meets viewport centre"). Progress through the region is the
//! normalized scroll position between the two anchor crossings.

use bevy::prelude::*;
use noora_config::{ScrollAnchorConfig, ScrollRegionConfig};

use crate::HostViewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    /// Fraction of the element height (0 = top, 1 = bottom).
    pub element: f32,
    /// Fraction of the viewport height (0 = top, 1 = bottom).
    pub viewport: f32,
}

impl From<ScrollAnchorConfig> for ScrollAnchor {
    fn from(c: ScrollAnchorConfig) -> Self {
        Self {
            element: c.element,
            viewport: c.viewport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedRegion {
    /// Document offset of the element top.
    pub element_top: f32,
    pub element_height: f32,
    pub start: ScrollAnchor,
    pub end: ScrollAnchor,
}

impl TrackedRegion {
    pub fn new(element_top: f32, element_height: f32, anchors: &ScrollRegionConfig) -> Self {
        Self {
            element_top,
            element_height: element_height.max(0.0),
            start: anchors.start.into(),
            end: anchors.end.into(),
        }
    }

    /// Scroll positions at which the start and end anchors are crossed.
    pub fn boundaries(&self, viewport_height: f32) -> (f32, f32) {
        let crossing = |a: ScrollAnchor| {
            self.element_top + a.element * self.element_height - a.viewport * viewport_height
        };
        (crossing(self.start), crossing(self.end))
    }

    pub fn progress(&self, scroll_y: f32, viewport_height: f32) -> f32 {
        let (start, end) = self.boundaries(viewport_height);
        progress_between(scroll_y, start, end)
    }

    /// Element top/bottom relative to the viewport top.
    pub fn view(&self, scroll_y: f32, viewport_height: f32) -> RegionView {
        let top = self.element_top - scroll_y;
        RegionView {
            top,
            bottom: top + self.element_height,
            viewport_height,
        }
    }
}

/// `clamp((pos - start) / (end - start), 0, 1)`; a degenerate region is a step at `end`.
pub fn progress_between(pos: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if pos >= end { 1.0 } else { 0.0 };
    }
    if pos <= start {
        0.0
    } else if pos >= end {
        1.0
    } else {
        ((pos - start) / (end - start)).clamp(0.0, 1.0)
    }
}

/// Visibility of the tracked element in the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionView {
    pub top: f32,
    pub bottom: f32,
    pub viewport_height: f32,
}

impl RegionView {
    /// True once the element overlaps the viewport extended downward to `band` viewport heights.
    pub fn in_band(&self, band: f32) -> bool {
        self.top <= self.viewport_height * band && self.bottom >= 0.0
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct ScrollSampler {
    pub region: TrackedRegion,
    progress: f32,
    view: RegionView,
}

impl ScrollSampler {
    pub fn new(region: TrackedRegion) -> Self {
        Self {
            region,
            progress: 0.0,
            view: RegionView::default(),
        }
    }

    pub fn sample(&mut self, viewport: &HostViewport) -> f32 {
        let vh = viewport.size.y;
        self.progress = self.region.progress(viewport.scroll_y, vh);
        self.view = self.region.view(viewport.scroll_y, vh);
        self.progress
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn view(&self) -> RegionView {
        self.view
    }
}

pub fn sample_scroll_progress(viewport: Res<HostViewport>, mut q: Query<&mut ScrollSampler>) {
    for mut sampler in &mut q {
        sampler.sample(&viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> TrackedRegion {
        TrackedRegion::new(2000.0, 400.0, &ScrollRegionConfig::default())
    }

    #[test]
    fn boundaries_follow_anchor_math() {
        // start: top (2000) meets 80% of 1000 -> 1200; end: centre (2200) meets 500 -> 1700
        let (s, e) = region().boundaries(1000.0);
        assert_eq!(s, 1200.0);
        assert_eq!(e, 1700.0);
    }

    #[test]
    fn exact_zero_before_and_one_after() {
        let r = region();
        assert_eq!(r.progress(0.0, 1000.0), 0.0);
        assert_eq!(r.progress(1200.0, 1000.0), 0.0);
        assert_eq!(r.progress(1700.0, 1000.0), 1.0);
        assert_eq!(r.progress(5000.0, 1000.0), 1.0);
        assert!((r.progress(1450.0, 1000.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn monotonic_while_scrolling_forward() {
        let r = region();
        let mut prev = 0.0;
        let mut y = 1000.0;
        while y < 2000.0 {
            let p = r.progress(y, 1000.0);
            assert!(p >= prev, "progress decreased at {y}: {p} < {prev}");
            assert!((0.0..=1.0).contains(&p));
            prev = p;
            y += 0.37;
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn degenerate_region_is_a_step() {
        assert_eq!(progress_between(9.0, 10.0, 10.0), 0.0);
        assert_eq!(progress_between(10.0, 10.0, 10.0), 1.0);
        assert_eq!(progress_between(11.0, 10.0, 5.0), 1.0);
    }

    #[test]
    fn resize_shifts_boundaries() {
        let r = region();
        let small = r.progress(1500.0, 600.0);
        let large = r.progress(1500.0, 1000.0);
        assert_ne!(small, large);
    }

    #[test]
    fn band_check_uses_expanded_viewport() {
        let r = region();
        // element top 2000 - 700 = 1300 from viewport top; 1000 * 1.2 = 1200 -> not yet
        assert!(!r.view(700.0, 1000.0).in_band(1.2));
        assert!(r.view(800.0, 1000.0).in_band(1.2));
        // scrolled past: bottom above viewport
        assert!(!r.view(2500.0, 1000.0).in_band(1.2));
    }

    #[test]
    fn sampler_system_updates_progress() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(HostViewport {
            size: Vec2::new(800.0, 1000.0),
            scroll_y: 1700.0,
            ..Default::default()
        });
        app.add_systems(Update, sample_scroll_progress);
        let e = app.world_mut().spawn(ScrollSampler::new(region())).id();
        app.update();
        let s = app.world().get::<ScrollSampler>(e).unwrap();
        assert_eq!(s.progress(), 1.0);
        assert_eq!(s.view().top, 300.0);
    }
}
