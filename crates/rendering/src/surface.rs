//! Drawing-surface abstraction and the single per-frame render step.
//!
//! Effects never touch a surface directly: they fill a [`DrawList`] with [`Drawable`]s and
//! [`render`] replays it. Every drawable runs inside its own save/restore pair so its alpha never
//! leaks into the next one.

use bevy::color::Srgba;
use bevy::math::Vec2;

/// Visual kinds an effect can emit. Coordinates are logical surface px, y down.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Srgba,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        width: f32,
        color: Srgba,
    },
    FillRect {
        min: Vec2,
        size: Vec2,
        color: Srgba,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Srgba,
    },
    /// Radial gradient disc from `inner` at the centre to `outer` at `radius`.
    Glow {
        center: Vec2,
        radius: f32,
        inner: Srgba,
        outer: Srgba,
    },
    Path {
        points: Vec<Vec2>,
        closed: bool,
        width: f32,
        color: Srgba,
    },
    /// Wireframe: one line per index pair into `points`.
    Segments {
        points: Vec<Vec2>,
        edges: Vec<(usize, usize)>,
        width: f32,
        color: Srgba,
    },
    FillPolygon {
        points: Vec<Vec2>,
        color: Srgba,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    /// Global alpha applied to the whole shape.
    pub alpha: f32,
    pub shape: Shape,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    items: Vec<Drawable>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alpha: f32, shape: Shape) {
        self.items.push(Drawable { alpha, shape });
    }

    pub fn push_opaque(&mut self, shape: Shape) {
        self.push(1.0, shape);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawable> {
        self.items.iter()
    }
}

pub trait DrawSurface {
    /// Logical size in px.
    fn size(&self) -> Vec2;
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn set_alpha(&mut self, alpha: f32);
    fn alpha(&self) -> f32;

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Srgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Srgba);
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Srgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Srgba);
    fn radial_glow(&mut self, center: Vec2, radius: f32, inner: Srgba, outer: Srgba);
    fn fill_polygon(&mut self, points: &[Vec2], color: Srgba);

    fn stroke_path(&mut self, points: &[Vec2], closed: bool, width: f32, color: Srgba) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], width, color);
        }
        if closed && points.len() > 2 {
            self.stroke_line(points[points.len() - 1], points[0], width, color);
        }
    }
}

pub fn draw_shape<S: DrawSurface + ?Sized>(surface: &mut S, shape: &Shape) {
    match shape {
        Shape::FillCircle { center, radius, color } => surface.fill_circle(*center, *radius, *color),
        Shape::StrokeCircle { center, radius, width, color } => {
            surface.stroke_circle(*center, *radius, *width, *color)
        }
        Shape::FillRect { min, size, color } => surface.fill_rect(*min, *size, *color),
        Shape::Line { from, to, width, color } => surface.stroke_line(*from, *to, *width, *color),
        Shape::Glow { center, radius, inner, outer } => {
            surface.radial_glow(*center, *radius, *inner, *outer)
        }
        Shape::Path { points, closed, width, color } => {
            surface.stroke_path(points, *closed, *width, *color)
        }
        Shape::Segments { points, edges, width, color } => {
            for &(a, b) in edges {
                // Out-of-range indices are skipped, not fatal.
                if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
                    surface.stroke_line(*pa, *pb, *width, *color);
                }
            }
        }
        Shape::FillPolygon { points, color } => surface.fill_polygon(points, *color),
    }
}

/// Clear the surface and draw every item with isolated drawing state.
pub fn render<S: DrawSurface + ?Sized>(list: &DrawList, surface: &mut S) {
    surface.clear();
    for item in list.iter() {
        surface.save();
        surface.set_alpha(item.alpha.clamp(0.0, 1.0));
        draw_shape(surface, &item.shape);
        surface.restore();
    }
}

/// Kinds of recorded operation (geometry kept only where tests need it).
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    Clear,
    Save,
    Restore,
    FillCircle { center: Vec2, radius: f32 },
    StrokeCircle { center: Vec2, radius: f32 },
    FillRect { min: Vec2, size: Vec2 },
    Line { from: Vec2, to: Vec2 },
    Glow { center: Vec2, radius: f32 },
    Polygon { vertices: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOp {
    pub kind: OpKind,
    /// Global alpha in effect when the op ran.
    pub alpha: f32,
}

/// Surface that records calls instead of drawing; used to inspect renders without pixels.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    alpha: f32,
    stack: Vec<f32>,
    pub ops: Vec<RecordedOp>,
    pub max_depth: usize,
}

impl RecordingSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            alpha: 1.0,
            stack: Vec::new(),
            ops: Vec::new(),
            max_depth: 0,
        }
    }

    fn record(&mut self, kind: OpKind) {
        self.ops.push(RecordedOp {
            kind,
            alpha: self.alpha,
        });
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Draw ops only (no clear / save / restore).
    pub fn draws(&self) -> impl Iterator<Item = &RecordedOp> {
        self.ops
            .iter()
            .filter(|op| !matches!(op.kind, OpKind::Clear | OpKind::Save | OpKind::Restore))
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }
    fn clear(&mut self) {
        self.record(OpKind::Clear);
    }
    fn save(&mut self) {
        self.stack.push(self.alpha);
        self.max_depth = self.max_depth.max(self.stack.len());
        self.record(OpKind::Save);
    }
    fn restore(&mut self) {
        if let Some(a) = self.stack.pop() {
            self.alpha = a;
        }
        self.record(OpKind::Restore);
    }
    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
    fn alpha(&self) -> f32 {
        self.alpha
    }
    fn fill_circle(&mut self, center: Vec2, radius: f32, _color: Srgba) {
        self.record(OpKind::FillCircle { center, radius });
    }
    fn stroke_circle(&mut self, center: Vec2, radius: f32, _width: f32, _color: Srgba) {
        self.record(OpKind::StrokeCircle { center, radius });
    }
    fn fill_rect(&mut self, min: Vec2, size: Vec2, _color: Srgba) {
        self.record(OpKind::FillRect { min, size });
    }
    fn stroke_line(&mut self, from: Vec2, to: Vec2, _width: f32, _color: Srgba) {
        self.record(OpKind::Line { from, to });
    }
    fn radial_glow(&mut self, center: Vec2, radius: f32, _inner: Srgba, _outer: Srgba) {
        self.record(OpKind::Glow { center, radius });
    }
    fn fill_polygon(&mut self, points: &[Vec2], _color: Srgba) {
        self.record(OpKind::Polygon {
            vertices: points.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    fn sample_list() -> DrawList {
        let mut list = DrawList::new();
        list.push(
            0.25,
            Shape::FillCircle {
                center: Vec2::new(10.0, 10.0),
                radius: 3.0,
                color: Palette::EMERALD,
            },
        );
        list.push_opaque(Shape::Line {
            from: Vec2::ZERO,
            to: Vec2::ONE,
            width: 1.0,
            color: Palette::WHITE,
        });
        list.push(
            0.5,
            Shape::Segments {
                points: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
                edges: vec![(0, 1), (1, 2), (2, 9)],
                width: 0.5,
                color: Palette::WHITE,
            },
        );
        list
    }

    #[test]
    fn render_clears_first_and_balances_state() {
        let mut s = RecordingSurface::new(Vec2::new(100.0, 100.0));
        render(&sample_list(), &mut s);
        assert_eq!(s.ops[0].kind, OpKind::Clear);
        assert_eq!(s.depth(), 0, "every save must be restored");
        assert_eq!(s.max_depth, 1);
        assert_eq!(s.alpha(), 1.0);
    }

    #[test]
    fn alpha_does_not_bleed_between_items() {
        let mut s = RecordingSurface::new(Vec2::new(100.0, 100.0));
        render(&sample_list(), &mut s);
        let alphas: Vec<f32> = s.draws().map(|op| op.alpha).collect();
        // circle at 0.25, opaque line, then two wireframe edges at 0.5 (bad index skipped)
        assert_eq!(alphas, vec![0.25, 1.0, 0.5, 0.5]);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut list = DrawList::new();
        list.push(
            7.0,
            Shape::FillRect {
                min: Vec2::ZERO,
                size: Vec2::ONE,
                color: Palette::WHITE,
            },
        );
        let mut s = RecordingSurface::new(Vec2::ONE);
        render(&list, &mut s);
        assert_eq!(s.draws().next().map(|op| op.alpha), Some(1.0));
    }

    #[test]
    fn closed_path_adds_closing_segment() {
        let mut s = RecordingSurface::new(Vec2::ONE);
        s.stroke_path(&[Vec2::ZERO, Vec2::X, Vec2::Y], true, 1.0, Palette::WHITE);
        assert_eq!(s.draws().count(), 3);
        let mut open = RecordingSurface::new(Vec2::ONE);
        open.stroke_path(&[Vec2::ZERO, Vec2::X, Vec2::Y], false, 1.0, Palette::WHITE);
        assert_eq!(open.draws().count(), 2);
    }
}
