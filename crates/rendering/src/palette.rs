//! Centralized color palette & helpers.
//! Keeps a single source of truth for accent / teal / coral tones used by every canvas.

use bevy::color::Srgba;

const fn rgb8(r: u8, g: u8, b: u8) -> Srgba {
    Srgba::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
}

/// Accent rotation used by the assembly nodes and orbit avatars.
pub const ACCENT_COLORS: [Srgba; 5] = [
    rgb8(45, 168, 143),  // emerald
    rgb8(77, 154, 155),  // teal
    rgb8(255, 154, 143), // coral
    rgb8(255, 255, 255), // white
    rgb8(0, 109, 111),   // deep teal
];

/// Returns a color for arbitrary index, wrapping around the accent palette.
#[inline]
pub fn color_for_index(i: usize) -> Srgba {
    ACCENT_COLORS[i % ACCENT_COLORS.len()]
}

pub struct Palette;
impl Palette {
    pub const EMERALD: Srgba = rgb8(45, 168, 143);
    pub const TEAL: Srgba = rgb8(77, 154, 155);
    pub const DEEP_TEAL: Srgba = rgb8(0, 109, 111);
    pub const MINT: Srgba = rgb8(92, 195, 173);
    pub const PINE: Srgba = rgb8(31, 139, 117);
    pub const GREEN: Srgba = rgb8(16, 185, 129);
    pub const WHITE: Srgba = rgb8(255, 255, 255);
    pub const TRANSPARENT: Srgba = Srgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BG: Srgba = rgb8(5, 8, 10);
}

/// Same hue with a replaced alpha.
#[inline]
pub fn with_alpha(c: Srgba, alpha: f32) -> Srgba {
    Srgba::new(c.red, c.green, c.blue, alpha.clamp(0.0, 1.0))
}
