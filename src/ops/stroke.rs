// ============================================================================
// FREEHAND STROKES — brush state, cursor trail, segment compositing
// ============================================================================

use image::RgbaImage;

/// Fixed brush configuration used for every stroke in a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushState {
    /// RGBA color (un-premultiplied)
    pub color: [u8; 4],
    /// Stroke width in pixels
    pub width: f32,
    pub antialias: bool,
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            width: 4.0,
            antialias: true,
        }
    }
}

/// Last pointer position of the active draw gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorTrail {
    last_pos: Option<(f32, f32)>,
}

impl CursorTrail {
    pub fn start(&mut self, pos: (f32, f32)) {
        self.last_pos = Some(pos);
    }

    pub fn clear(&mut self) {
        self.last_pos = None;
    }

    pub fn last(&self) -> Option<(f32, f32)> {
        self.last_pos
    }

    /// Advance the trail to `pos`, returning the segment to draw.
    /// Returns `None` when no gesture is active.
    pub fn advance(&mut self, pos: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
        let prev = self.last_pos?;
        self.last_pos = Some(pos);
        Some((prev, pos))
    }
}

/// Drawing context bound to a raster image. Every draw mutates the image.
pub struct DrawingOverlay<'a> {
    target: &'a mut RgbaImage,
    brush: BrushState,
}

impl<'a> DrawingOverlay<'a> {
    pub fn new(target: &'a mut RgbaImage, brush: BrushState) -> Self {
        Self { target, brush }
    }

    /// Draw a straight segment from `start` to `end` with round caps.
    /// Returns the touched pixel bounds `[min_x, min_y, max_x, max_y]`
    /// (inclusive), or `None` if the segment missed the image entirely.
    pub fn draw_line(&mut self, start: (f32, f32), end: (f32, f32)) -> Option<[u32; 4]> {
        let width = self.target.width();
        let height = self.target.height();
        let radius = self.brush.width / 2.0;
        if width == 0 || height == 0 || radius <= 0.0 {
            return None;
        }

        // Antialiased edges bleed half a pixel past the radius.
        let pad = radius + 1.0;
        let min_x = (start.0.min(end.0) - pad).floor().max(0.0);
        let min_y = (start.1.min(end.1) - pad).floor().max(0.0);
        let max_x = (start.0.max(end.0) + pad).ceil().min((width - 1) as f32);
        let max_y = (start.1.max(end.1) + pad).ceil().min((height - 1) as f32);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        let (min_x, min_y, max_x, max_y) = (min_x as u32, min_y as u32, max_x as u32, max_y as u32);

        let [src_r, src_g, src_b, src_a] = self.brush.color;
        let src_a = src_a as f32 / 255.0;
        let src = [src_r as f32, src_g as f32, src_b as f32];

        let mut touched = false;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = (x as f32 + 0.5, y as f32 + 0.5);
                let dist = distance_to_segment(center, start, end);
                let coverage = if self.brush.antialias {
                    (radius + 0.5 - dist).clamp(0.0, 1.0)
                } else if dist <= radius {
                    1.0
                } else {
                    0.0
                };
                if coverage <= 0.0 {
                    continue;
                }
                touched = true;
                let px = self.target.get_pixel_mut(x, y);
                blend_over(&mut px.0, src, src_a * coverage);
            }
        }

        touched.then_some([min_x, min_y, max_x, max_y])
    }
}

/// Euclidean distance from `p` to the segment `a`–`b`.
fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq < 1e-6 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + dx * t, a.1 + dy * t);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Source-over composite of an un-premultiplied color onto an
/// un-premultiplied destination pixel.
fn blend_over(dst: &mut [u8; 4], src: [f32; 3], src_a: f32) {
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let v = (src[c] * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
