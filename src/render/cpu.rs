use std::{collections::HashMap, sync::Arc};

use vello_cpu::kurbo::Shape as _;

use crate::{
    assets::Raster,
    composite::{draw::ImageDraw, plan::FramePlan},
    foundation::{
        core::{Affine, Point, Rect},
        error::{FocalError, FocalResult},
    },
    model::image::ImageId,
    render::backend::{FrameRGBA, RenderBackend},
};

const MARKER_RADIUS_PX: f64 = 6.0;
const MARKER_RING_PX: f64 = 2.0;
const MARKER_RGBA: [u8; 4] = [255, 64, 64, 255];

struct CachedPaint {
    pixels: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

/// CPU backend powered by `vello_cpu`.
///
/// Image paints are cached per image id and dropped once no snapshot references the raster any
/// more.
#[derive(Default)]
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    image_cache: HashMap<ImageId, CachedPaint>,
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend")
            .field("cached_images", &self.image_cache.len())
            .finish()
    }
}

impl CpuBackend {
    /// Backend with an empty image cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of image paints currently cached.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> FocalResult<R>,
    ) -> FocalResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn image_paint_for(&mut self, id: ImageId, raster: &Raster) -> FocalResult<vello_cpu::Image> {
        if let Some(cached) = self.image_cache.get(&id)
            && Arc::ptr_eq(&cached.pixels, &raster.rgba8_premul)
        {
            return Ok(cached.paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&raster.rgba8_premul, raster.width, raster.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(
            id,
            CachedPaint {
                pixels: Arc::clone(&raster.rgba8_premul),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    fn evict_released(&mut self) {
        // Only the cache still holds the pixels: the image was removed from every snapshot.
        self.image_cache
            .retain(|_, c| Arc::strong_count(&c.pixels) > 1);
    }

    fn draw_image(
        &mut self,
        view: Affine,
        draw: &ImageDraw,
        ctx: &mut vello_cpu::RenderContext,
    ) -> FocalResult<()> {
        let to_screen = view * draw.frame_to_world;
        if draw.raster_rect.is_zero_area() {
            return Ok(());
        }
        let paint = self.image_paint_for(draw.id, &draw.raster)?;
        let opacity = draw.opacity.clamp(0.0, 1.0) as f32;

        ctx.set_transform(affine_to_cpu(to_screen));
        ctx.set_paint_transform(affine_to_cpu(draw.raster_to_frame));
        ctx.set_paint(paint);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&rect_to_cpu(draw.raster_rect));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some(marker) = draw.focal_marker {
            draw_marker(ctx, to_screen * marker);
        }
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    fn render(&mut self, plan: &FramePlan) -> FocalResult<FrameRGBA> {
        let width: u16 = plan
            .surface
            .width
            .try_into()
            .map_err(|_| FocalError::validation("surface width exceeds u16"))?;
        let height: u16 = plan
            .surface
            .height
            .try_into()
            .map_err(|_| FocalError::validation("surface height exceeds u16"))?;

        self.evict_released();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        self.with_ctx_mut(width, height, |this, ctx| {
            let bg = plan.background;
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg[0], bg[1], bg[2], bg[3]));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            ));

            for draw in &plan.draws {
                this.draw_image(plan.view, draw, ctx)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width: plan.surface.width,
            height: plan.surface.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn draw_marker(ctx: &mut vello_cpu::RenderContext, at: Point) {
    let c = vello_cpu::kurbo::Point::new(at.x, at.y);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&vello_cpu::kurbo::Circle::new(c, MARKER_RADIUS_PX + MARKER_RING_PX).to_path(0.1));
    let [r, g, b, a] = MARKER_RGBA;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_path(&vello_cpu::kurbo::Circle::new(c, MARKER_RADIUS_PX).to_path(0.1));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> FocalResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| FocalError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FocalError::validation("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(FocalError::validation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; raster bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
