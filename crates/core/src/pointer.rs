//! Pointer tracking in viewport px, plus a normalized copy centred on the viewport by default.

use bevy::prelude::*;
use bevy::window::CursorMoved;

use crate::HostViewport;

/// Last known pointer position; normalized coordinates default to the viewport centre.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    normalized: Vec2,
    position: Option<Vec2>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            normalized: Vec2::splat(0.5),
            position: None,
        }
    }
}

impl PointerState {
    pub fn record(&mut self, position: Vec2, viewport: Vec2) {
        self.position = Some(position);
        self.normalized = normalize_pointer(position, viewport);
    }

    /// `(x, y)` in `[0,1]²` relative to the viewport.
    pub fn normalized(&self) -> Vec2 {
        self.normalized
    }

    /// Raw viewport-space position (px, y down) if the pointer has moved at all.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }
}

pub fn normalize_pointer(position: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::splat(0.5);
    }
    (position / viewport).clamp(Vec2::ZERO, Vec2::ONE)
}

pub fn track_pointer(
    mut moves: EventReader<CursorMoved>,
    viewport: Res<HostViewport>,
    mut pointer: ResMut<PointerState>,
) {
    // Only the latest position matters for this frame.
    if let Some(last) = moves.read().last() {
        pointer.record(last.position, viewport.size);
    }
}
