// Rendering crate: projection math, the DrawSurface abstraction, a software rasterizer and the Bevy
// glue that pushes each canvas's pixels into an Image once per frame.
//
// Effects write their DrawList during FrameSet::Simulate; FrameSet::Render replays the list into the
// canvas's PixelSurface; FrameSet::Present uploads it (windowed builds only).

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use noora_core::{Canvas, FrameSet};

pub mod palette;
pub mod projection;
pub mod raster;
pub mod surface;
pub mod transform;

pub use palette::{color_for_index, with_alpha, Palette, ACCENT_COLORS};
pub use projection::{perspective, rotate, Orientation, Wireframe};
pub use raster::PixelSurface;
pub use surface::{
    draw_shape, render, DrawList, DrawSurface, Drawable, OpKind, RecordedOp, RecordingSurface,
    Shape,
};
pub use transform::{SurfaceTransform, MAX_SURFACE_DIM};

/// Per-canvas pixel buffer plus the draw list for the current frame.
#[derive(Component, Debug, Clone)]
pub struct FrameBuffer {
    pub surface: PixelSurface,
    pub list: DrawList,
    /// Set by the effect after rebuilding `list`; cleared once rasterized.
    pub pending: bool,
    /// Set after rasterizing; cleared once uploaded.
    pub needs_upload: bool,
}

impl FrameBuffer {
    pub fn new(canvas: &Canvas) -> Self {
        Self {
            surface: PixelSurface::new(canvas.logical_size, canvas.pixel_ratio),
            list: DrawList::new(),
            pending: false,
            needs_upload: false,
        }
    }

    /// Start a new frame's draw list.
    pub fn begin(&mut self) -> &mut DrawList {
        self.list.clear();
        self.pending = true;
        &mut self.list
    }
}

/// Image asset the canvas is presented through.
#[derive(Component, Debug, Clone)]
pub struct CanvasImage(pub Handle<Image>);

fn extent(size: UVec2) -> Extent3d {
    Extent3d {
        width: size.x.max(1),
        height: size.y.max(1),
        depth_or_array_layers: 1,
    }
}

/// Transparent RGBA8 image sized for a backing buffer (at least 1x1).
pub fn new_canvas_image(physical: UVec2) -> Image {
    Image::new_fill(
        extent(physical),
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (attach_frame_buffers, resize_frame_buffers, rasterize_frame_buffers)
                .chain()
                .in_set(FrameSet::Render),
        );
        #[cfg(not(any(test, feature = "headless")))]
        app.add_systems(Update, upload_frame_buffers.in_set(FrameSet::Present));
    }
}

fn attach_frame_buffers(mut commands: Commands, q: Query<(Entity, &Canvas), Without<FrameBuffer>>) {
    for (e, canvas) in &q {
        commands.entity(e).insert(FrameBuffer::new(canvas));
    }
}

/// Re-apply the surface transform when a canvas's size or density changed.
pub fn resize_frame_buffers(mut q: Query<(&Canvas, &mut FrameBuffer), Changed<Canvas>>) {
    for (canvas, mut fb) in &mut q {
        let t = SurfaceTransform::compute(canvas.logical_size, canvas.pixel_ratio);
        if *fb.surface.transform() != t {
            fb.surface.apply_transform(&t);
            // Buffer was cleared; replay the current list on the new geometry.
            fb.pending = true;
            debug!(physical = ?t.physical, "Canvas surface resized");
        }
    }
}

pub fn rasterize_frame_buffers(mut q: Query<(&Canvas, &mut FrameBuffer)>) {
    for (canvas, mut fb) in &mut q {
        if !fb.pending || !canvas.is_drawable() {
            continue;
        }
        let FrameBuffer { surface, list, .. } = &mut *fb;
        render(list, surface);
        fb.pending = false;
        fb.needs_upload = true;
    }
}

#[cfg(not(any(test, feature = "headless")))]
fn upload_frame_buffers(
    images: Option<ResMut<Assets<Image>>>,
    mut q: Query<(&mut FrameBuffer, &CanvasImage)>,
) {
    // Headless runs have no image assets; buffers stay CPU-side.
    let Some(mut images) = images else {
        return;
    };
    for (mut fb, handle) in &mut q {
        if !fb.needs_upload {
            continue;
        }
        let Some(img) = images.get_mut(&handle.0) else {
            continue;
        };
        let size = fb.surface.physical_size();
        if size.x == 0 || size.y == 0 {
            continue;
        }
        if img.texture_descriptor.size != extent(size) {
            img.resize(extent(size));
        }
        img.data = Some(fb.surface.pixels().to_vec());
        fb.needs_upload = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noora_core::{CanvasFit, CorePlugin};

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins((CorePlugin, RenderingPlugin));
        app
    }

    fn disc() -> Shape {
        Shape::FillCircle {
            center: Vec2::new(8.0, 8.0),
            radius: 4.0,
            color: Palette::WHITE,
        }
    }

    #[test]
    fn canvas_gets_a_frame_buffer() {
        let mut app = app();
        let e = app
            .world_mut()
            .spawn(Canvas::new(Vec2::new(16.0, 16.0), CanvasFit::Fixed))
            .id();
        app.update();
        let fb = app.world().get::<FrameBuffer>(e).expect("frame buffer attached");
        assert_eq!(fb.surface.physical_size(), UVec2::new(16, 16));
    }

    #[test]
    fn pending_list_is_rasterized_once() {
        let mut app = app();
        let canvas = Canvas::new(Vec2::new(16.0, 16.0), CanvasFit::Fixed);
        let mut fb = FrameBuffer::new(&canvas);
        fb.begin().push_opaque(disc());
        let e = app.world_mut().spawn((canvas, fb)).id();
        app.update();
        let fb = app.world().get::<FrameBuffer>(e).unwrap();
        assert!(!fb.pending);
        assert!(fb.needs_upload);
        assert_eq!(fb.surface.pixel(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn unavailable_canvas_is_not_drawn() {
        let mut app = app();
        let mut canvas = Canvas::new(Vec2::new(16.0, 16.0), CanvasFit::Fixed);
        canvas.available = false;
        let mut fb = FrameBuffer::new(&canvas);
        fb.begin().push_opaque(disc());
        let e = app.world_mut().spawn((canvas, fb)).id();
        app.update();
        let fb = app.world().get::<FrameBuffer>(e).unwrap();
        assert!(fb.pending, "stays pending until the surface is back");
        assert!(fb.surface.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn viewport_resize_reallocates_surface() {
        let mut app = app();
        app.insert_resource(noora_core::HostViewport {
            size: Vec2::new(32.0, 24.0),
            pixel_ratio: 2.0,
            ..Default::default()
        });
        let e = app
            .world_mut()
            .spawn(Canvas::new(Vec2::ONE, CanvasFit::Viewport))
            .id();
        app.update();
        app.update();
        let fb = app.world().get::<FrameBuffer>(e).unwrap();
        assert_eq!(fb.surface.physical_size(), UVec2::new(64, 48));
        assert_eq!(fb.surface.size(), Vec2::new(32.0, 24.0));
    }

    #[test]
    fn canvas_image_has_rgba_bytes() {
        let img = new_canvas_image(UVec2::new(3, 2));
        assert_eq!(img.data.as_ref().map(|d| d.len()), Some(3 * 2 * 4));
        let empty = new_canvas_image(UVec2::ZERO);
        assert_eq!(empty.texture_descriptor.size.width, 1);
    }
}
