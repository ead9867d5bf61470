//! Software RGBA8 rasterizer behind [`DrawSurface`].
//!
//! Shapes are evaluated per device pixel with a signed distance and a half-pixel coverage ramp,
//! then composited source-over. Colors are straight (non-premultiplied) sRGB bytes, matching what
//! `Image` expects for `Rgba8UnormSrgb`.

use bevy::color::Srgba;
use bevy::math::{UVec2, Vec2};

use crate::surface::DrawSurface;
use crate::transform::SurfaceTransform;

const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone)]
pub struct PixelSurface {
    transform: SurfaceTransform,
    pixels: Vec<u8>,
    alpha: f32,
    stack: Vec<f32>,
}

impl PixelSurface {
    pub fn new(logical_size: Vec2, pixel_ratio: f32) -> Self {
        let mut s = Self {
            transform: SurfaceTransform::compute(Vec2::ZERO, 1.0),
            pixels: Vec::new(),
            alpha: 1.0,
            stack: Vec::new(),
        };
        s.apply_transform(&SurfaceTransform::compute(logical_size, pixel_ratio));
        s
    }

    /// Resize the backing buffer and adopt the new logical scale. Contents are cleared.
    pub fn apply_transform(&mut self, transform: &SurfaceTransform) {
        self.transform = *transform;
        let len = transform.physical.x as usize * transform.physical.y as usize * BYTES_PER_PIXEL;
        self.pixels.clear();
        self.pixels.resize(len, 0);
        self.alpha = 1.0;
        self.stack.clear();
    }

    pub fn transform(&self) -> &SurfaceTransform {
        &self.transform
    }

    pub fn physical_size(&self) -> UVec2 {
        self.transform.physical
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at a device pixel, `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let size = self.transform.physical;
        if x >= size.x || y >= size.y {
            return None;
        }
        let i = (y as usize * size.x as usize + x as usize) * BYTES_PER_PIXEL;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    #[cfg(feature = "golden")]
    pub fn frame_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.transform.physical.x.to_le_bytes());
        hasher.update(&self.transform.physical.y.to_le_bytes());
        hasher.update(&self.pixels);
        hasher.finalize().to_hex().to_string()
    }

    /// Composite `color` at device pixel (x, y) with the given coverage.
    fn blend(&mut self, x: u32, y: u32, color: Srgba, coverage: f32) {
        let sa = (color.alpha * self.alpha * coverage).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let i = (y as usize * self.transform.physical.x as usize + x as usize) * BYTES_PER_PIXEL;
        let Some(dst) = self.pixels.get_mut(i..i + BYTES_PER_PIXEL) else {
            return;
        };
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let src = [color.red, color.green, color.blue];
        for c in 0..3 {
            let d = dst[c] as f32 / 255.0;
            let v = (src[c].clamp(0.0, 1.0) * sa + d * da * (1.0 - sa)) / out_a;
            dst[c] = (v * 255.0).round() as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }

    /// Device-pixel bounds covering a logical box grown by `pad` logical px.
    fn device_bounds(&self, min: Vec2, max: Vec2, pad: f32) -> Option<(u32, u32, u32, u32)> {
        let size = self.transform.physical;
        if size.x == 0 || size.y == 0 {
            return None;
        }
        let lo = self.transform.to_device(min - Vec2::splat(pad)).floor();
        let hi = self.transform.to_device(max + Vec2::splat(pad)).ceil();
        if !(lo.is_finite() && hi.is_finite()) || hi.x < 0.0 || hi.y < 0.0 {
            return None;
        }
        let x0 = lo.x.max(0.0) as u32;
        let y0 = lo.y.max(0.0) as u32;
        let x1 = (hi.x as u32).min(size.x);
        let y1 = (hi.y as u32).min(size.y);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    /// Rasterize a coverage function given in device px over a logical bounding box.
    fn shade<F>(&mut self, min: Vec2, max: Vec2, color: Srgba, coverage: F)
    where
        F: Fn(Vec2) -> f32,
    {
        let Some((x0, y0, x1, y1)) = self.device_bounds(min, max, 1.0) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let c = coverage(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if c > 0.0 {
                    self.blend(x, y, color, c.min(1.0));
                }
            }
        }
    }
}

/// Coverage from a signed distance (negative inside), one device pixel of antialiasing.
fn ramp(distance: f32) -> f32 {
    (0.5 - distance).clamp(0.0, 1.0)
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).length()
}

fn lerp_color(a: Srgba, b: Srgba, t: f32) -> Srgba {
    let t = t.clamp(0.0, 1.0);
    Srgba::new(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
        a.alpha + (b.alpha - a.alpha) * t,
    )
}

/// Even-odd point-in-polygon.
fn contains(points: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

impl DrawSurface for PixelSurface {
    fn size(&self) -> Vec2 {
        self.transform.logical_size
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn save(&mut self) {
        self.stack.push(self.alpha);
    }

    fn restore(&mut self) {
        if let Some(a) = self.stack.pop() {
            self.alpha = a;
        }
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Srgba) {
        if radius <= 0.0 {
            return;
        }
        let c = self.transform.to_device(center);
        let r = radius * self.transform.pixel_ratio;
        self.shade(center - radius, center + radius, color, |p| {
            ramp(p.distance(c) - r)
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Srgba) {
        if radius <= 0.0 {
            return;
        }
        let ratio = self.transform.pixel_ratio;
        let c = self.transform.to_device(center);
        let r = radius * ratio;
        let half = (width * ratio * 0.5).max(0.5);
        let pad = radius + width;
        self.shade(center - pad, center + pad, color, |p| {
            ramp((p.distance(c) - r).abs() - half)
        });
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Srgba) {
        let max = min + size;
        let lo = self.transform.to_device(min.min(max));
        let hi = self.transform.to_device(min.max(max));
        let centre = (lo + hi) * 0.5;
        let half = (hi - lo) * 0.5;
        self.shade(min.min(max), min.max(max), color, |p| {
            let q = (p - centre).abs() - half;
            ramp(q.x.max(q.y))
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Srgba) {
        let ratio = self.transform.pixel_ratio;
        let a = self.transform.to_device(from);
        let b = self.transform.to_device(to);
        let half = (width * ratio * 0.5).max(0.5);
        let pad = width.max(1.0);
        self.shade(from.min(to) - pad, from.max(to) + pad, color, |p| {
            ramp(segment_distance(p, a, b) - half)
        });
    }

    fn radial_glow(&mut self, center: Vec2, radius: f32, inner: Srgba, outer: Srgba) {
        if radius <= 0.0 {
            return;
        }
        let c = self.transform.to_device(center);
        let r = radius * self.transform.pixel_ratio;
        let Some((x0, y0, x1, y1)) = self.device_bounds(center - radius, center + radius, 1.0) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                let cov = ramp(d - r);
                if cov > 0.0 {
                    self.blend(x, y, lerp_color(inner, outer, d / r), cov);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Srgba) {
        if points.len() < 3 {
            return;
        }
        let device: Vec<Vec2> = points.iter().map(|p| self.transform.to_device(*p)).collect();
        let (min, max) = points
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        self.shade(min, max, color, |p| if contains(&device, p) { 1.0 } else { 0.0 });
    }
}
